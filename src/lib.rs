//! Messenger 客户端会话状态管理
//!
//! 调用服务器格式使用下划线 "_"（如 chat_id）
//!
//! ## 功能模块
//! - 配置：API 地址、当前用户、请求超时（替代全局常量）
//! - API 客户端：`?path=` 形式的 Messenger HTTP 接口
//! - 会话状态：会话列表、当前会话、消息、语音房间、用户目录、草稿、本地通话
//! - 事件：用户可见提示和状态变更通知（broadcast）
//! - 筛选：会话列表标签页和搜索、通话计时
//!
//! ## 使用方式
//!
//! ```no_run
//! use messenger_session::{SessionConfig, SessionManager};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! messenger_session::init_logging();
//! let session = SessionManager::new(SessionConfig::from_env()?)?;
//! session.load_all().await;
//! session.set_draft("Готовы к рейду?");
//! session.send_draft().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod logging;
pub mod session;
pub mod types;

pub use api::{ChatApi, HttpChatApi};
pub use config::{ConfigError, SessionConfig};
pub use error::ApiError;
pub use events::{EventBus, NoticeLevel, SessionEvent};
pub use filter::ChatTab;
pub use logging::init_logging;
pub use session::{
    CreateChatOutcome, LoadOutcome, SendOutcome, SessionManager, SessionSnapshot, SkipReason,
};
pub use types::{
    Call, CallType, Chat, ChatType, CreatedChat, Message, NewChat, User, UserStatus, VoiceRoom,
};
