//! 会话状态管理
//!
//! `SessionManager` 持有客户端可见的全部聊天状态，并负责与远程 API 同步：
//! - 会话列表（每次加载整体替换）
//! - 当前会话指针及其消息列表
//! - 语音房间、用户目录快照
//! - 输入框草稿
//! - 本地通话描述
//!
//! ## 错误处理
//!
//! 远程调用失败不会向调用方抛出，而是按两档处理：
//! - 会话列表、消息、发送、创建会话：发送 `SessionEvent::Notice` 并记录 warn 日志
//! - 语音房间、用户目录、表情回应：只记录 warn 日志
//!
//! ## 并发
//!
//! 所有操作都接收 `&self`，状态放在 `RwLock` 中，锁不会跨 `.await` 持有。
//! - 发送消息单飞：同一时刻最多一个发送请求
//! - 消息加载带代次号：切换会话后，旧会话迟到的响应会被丢弃
//! - 会话列表重新加载后校验当前会话仍然存在，否则回落到第一个会话

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

use crate::api::{ChatApi, HttpChatApi};
use crate::config::SessionConfig;
use crate::error::ApiError;
use crate::events::{EventBus, SessionEvent};
use crate::filter::{self, ChatTab};
use crate::types::{Call, CallType, Chat, ChatType, Message, NewChat, User, VoiceRoom};

// ============================================================================
// 操作结果
// ============================================================================

/// 加载类操作的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 响应已写入状态
    Applied,
    /// 响应到达时已过期（会话已切换或有更新的请求），被丢弃
    Stale,
    /// 前置条件不满足，未发出请求
    Skipped,
    /// 请求失败，原状态保留
    Failed,
}

/// 发送被跳过的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyContent,
    NoActiveChat,
    SendInFlight,
}

/// 发送消息的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// 服务器返回的消息
    Sent(Message),
    Skipped(SkipReason),
    Failed,
}

/// 创建会话的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateChatOutcome {
    Created(i64),
    /// 名称为空，未发出请求
    Skipped,
    Failed,
}

// ============================================================================
// 状态
// ============================================================================

#[derive(Debug, Default)]
struct SessionState {
    chats: Vec<Chat>,
    active_chat: Option<i64>,
    messages: Vec<Message>,
    /// 当前消息列表属于哪个会话
    messages_chat: Option<i64>,
    /// 每次发起消息加载时递增
    message_generation: u64,
    voice_rooms: Vec<VoiceRoom>,
    users: Vec<User>,
    draft: String,
    call: Option<Call>,
}

/// 界面渲染用的只读快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub chats: Vec<Chat>,
    pub active_chat: Option<i64>,
    pub messages: Vec<Message>,
    pub messages_chat_id: Option<i64>,
    pub voice_rooms: Vec<VoiceRoom>,
    pub users: Vec<User>,
    pub draft: String,
    pub sending: bool,
    pub active_call: Option<Call>,
}

/// 发送单飞标志，离开作用域时释放
struct SendGuard<'a>(&'a AtomicBool);

impl<'a> SendGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SendGuard(flag))
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// 会话管理器
// ============================================================================

/// 会话状态管理器
pub struct SessionManager<A = HttpChatApi> {
    api: A,
    state: RwLock<SessionState>,
    sending: AtomicBool,
    events: EventBus,
}

impl SessionManager<HttpChatApi> {
    /// 使用 HTTP API 创建
    pub fn new(config: SessionConfig) -> Result<Self, ApiError> {
        Ok(Self::with_api(HttpChatApi::new(config)?))
    }
}

impl<A: ChatApi> SessionManager<A> {
    pub fn with_api(api: A) -> Self {
        Self {
            api,
            state: RwLock::new(SessionState::default()),
            sending: AtomicBool::new(false),
            events: EventBus::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// 订阅会话事件
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------------
    // 读取
    // ------------------------------------------------------------------------

    pub fn chats(&self) -> Vec<Chat> {
        self.state.read().chats.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.read().messages.clone()
    }

    pub fn voice_rooms(&self) -> Vec<VoiceRoom> {
        self.state.read().voice_rooms.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.state.read().users.clone()
    }

    pub fn active_chat(&self) -> Option<i64> {
        self.state.read().active_chat
    }

    /// 当前会话在会话列表中的记录
    pub fn active_chat_data(&self) -> Option<Chat> {
        let state = self.state.read();
        let id = state.active_chat?;
        state.chats.iter().find(|c| c.id == id).cloned()
    }

    pub fn active_call(&self) -> Option<Call> {
        self.state.read().call.clone()
    }

    pub fn draft(&self) -> String {
        self.state.read().draft.clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.state.write().draft = text.into();
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// 按标签页和搜索词筛选会话列表
    pub fn filtered_chats(&self, tab: ChatTab, query: &str) -> Vec<Chat> {
        let state = self.state.read();
        filter::filter_chats(&state.chats, tab, query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            chats: state.chats.clone(),
            active_chat: state.active_chat,
            messages: state.messages.clone(),
            messages_chat_id: state.messages_chat,
            voice_rooms: state.voice_rooms.clone(),
            users: state.users.clone(),
            draft: state.draft.clone(),
            sending: self.is_sending(),
            active_call: state.call.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // 同步
    // ------------------------------------------------------------------------

    /// 启动时加载：会话列表、语音房间、用户目录
    pub async fn load_all(&self) {
        self.load_chat_roster().await;
        self.load_voice_rooms().await;
        self.load_users().await;
    }

    /// 加载会话列表
    ///
    /// 成功后整体替换列表。没有当前会话，或当前会话已不在新列表中时，
    /// 选中第一个会话（列表为空则置空）并加载其消息。
    pub async fn load_chat_roster(&self) -> LoadOutcome {
        let chats = match self.api.fetch_chats().await {
            Ok(chats) => chats,
            Err(e) => {
                tracing::warn!("[Session] 加载会话列表失败: {}", e);
                self.events.error("加载会话列表失败", e.to_string());
                return LoadOutcome::Failed;
            }
        };

        let fallback = {
            let mut state = self.state.write();
            state.chats = chats;

            let current = state.active_chat;
            let present = current.is_some_and(|id| state.chats.iter().any(|c| c.id == id));
            if present {
                None
            } else {
                let next = state.chats.first().map(|c| c.id);
                if next == current {
                    None
                } else {
                    if current.is_some() {
                        tracing::info!(
                            "[Session] 当前会话 {:?} 不在新列表中，切换到 {:?}",
                            current,
                            next
                        );
                    }
                    state.active_chat = next;
                    if next.is_none() {
                        state.messages.clear();
                        state.messages_chat = None;
                        state.message_generation += 1;
                    }
                    Some(next)
                }
            }
        };

        tracing::info!("[Session] 会话列表已更新: {} 个", self.state.read().chats.len());
        self.events.emit(SessionEvent::RosterUpdated);

        if let Some(next) = fallback {
            self.events.emit(SessionEvent::ActiveChatChanged { chat_id: next });
            if let Some(chat_id) = next {
                self.load_messages(chat_id).await;
            }
        }

        LoadOutcome::Applied
    }

    /// 切换当前会话并加载其消息
    ///
    /// 只能切换到最近一次加载的会话列表中存在的会话，否则返回 `Skipped`
    pub async fn select_chat(&self, chat_id: i64) -> LoadOutcome {
        let changed = {
            let mut state = self.state.write();
            if !state.chats.iter().any(|c| c.id == chat_id) {
                tracing::warn!("[Session] 会话 {} 不在会话列表中，忽略切换", chat_id);
                return LoadOutcome::Skipped;
            }
            let changed = state.active_chat != Some(chat_id);
            state.active_chat = Some(chat_id);
            changed
        };

        if changed {
            tracing::info!("[Session] 切换会话: {}", chat_id);
            self.events.emit(SessionEvent::ActiveChatChanged {
                chat_id: Some(chat_id),
            });
        }

        self.load_messages(chat_id).await
    }

    /// 加载会话消息，整体替换消息列表
    ///
    /// 响应到达时如果已经发起了更新的加载，或 `chat_id` 不再是当前会话，
    /// 结果会被丢弃并返回 `Stale`。
    pub async fn load_messages(&self, chat_id: i64) -> LoadOutcome {
        let generation = {
            let mut state = self.state.write();
            state.message_generation += 1;
            state.message_generation
        };

        let result = self.api.fetch_messages(chat_id).await;

        {
            let mut state = self.state.write();
            if state.message_generation != generation || state.active_chat != Some(chat_id) {
                tracing::debug!("[Session] 丢弃过期的消息响应: chat={}", chat_id);
                return LoadOutcome::Stale;
            }

            if let Ok(messages) = &result {
                state.messages = messages.clone();
                state.messages_chat = Some(chat_id);
            }
        }

        match result {
            Ok(messages) => {
                tracing::debug!("[Session] 会话 {} 消息已加载: {} 条", chat_id, messages.len());
                self.events.emit(SessionEvent::MessagesUpdated { chat_id });
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("[Session] 加载会话 {} 消息失败: {}", chat_id, e);
                self.events.error("加载消息失败", e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// 加载语音房间，失败只记录日志
    pub async fn load_voice_rooms(&self) -> LoadOutcome {
        match self.api.fetch_voice_rooms().await {
            Ok(rooms) => {
                self.state.write().voice_rooms = rooms;
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("[Session] 加载语音房间失败: {}", e);
                LoadOutcome::Failed
            }
        }
    }

    /// 加载用户目录，失败只记录日志
    pub async fn load_users(&self) -> LoadOutcome {
        match self.api.fetch_users().await {
            Ok(users) => {
                self.state.write().users = users;
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("[Session] 加载用户目录失败: {}", e);
                LoadOutcome::Failed
            }
        }
    }

    // ------------------------------------------------------------------------
    // 操作
    // ------------------------------------------------------------------------

    /// 发送消息
    ///
    /// 内容为空白、没有当前会话、已有发送在进行中时直接跳过。
    /// 成功后追加服务器返回的消息、清空草稿并刷新会话列表；
    /// 失败时草稿保持不变，由用户手动重试。
    pub async fn send_message(&self, chat_id: i64, content: &str) -> SendOutcome {
        let content = content.trim();
        if content.is_empty() {
            return SendOutcome::Skipped(SkipReason::EmptyContent);
        }
        if self.active_chat().is_none() {
            return SendOutcome::Skipped(SkipReason::NoActiveChat);
        }
        let Some(guard) = SendGuard::acquire(&self.sending) else {
            tracing::debug!("[Session] 已有消息正在发送，跳过");
            return SendOutcome::Skipped(SkipReason::SendInFlight);
        };

        let result = self.api.send_message(chat_id, content).await;
        drop(guard);

        let message = match result {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("[Session] 发送消息失败: {}", e);
                self.events.error("发送消息失败", e.to_string());
                return SendOutcome::Failed;
            }
        };

        let appended = {
            let mut state = self.state.write();
            state.draft.clear();
            let owns_list = state.messages_chat.is_none_or(|id| id == chat_id);
            if state.active_chat == Some(chat_id) && owns_list {
                state.messages.push(message.clone());
                state.messages_chat = Some(chat_id);
                true
            } else {
                false
            }
        };

        if appended {
            self.events.emit(SessionEvent::MessagesUpdated { chat_id });
        }

        self.load_chat_roster().await;
        SendOutcome::Sent(message)
    }

    /// 发送草稿到当前会话
    pub async fn send_draft(&self) -> SendOutcome {
        let (active, draft) = {
            let state = self.state.read();
            (state.active_chat, state.draft.clone())
        };

        match active {
            Some(chat_id) => self.send_message(chat_id, &draft).await,
            None => SendOutcome::Skipped(SkipReason::NoActiveChat),
        }
    }

    /// 添加表情回应
    ///
    /// 不做本地乐观更新：无论成功与否都重新加载当前会话的完整消息列表
    pub async fn add_reaction(&self, message_id: i64, emoji: &str) -> LoadOutcome {
        if let Err(e) = self.api.add_reaction(message_id, emoji).await {
            tracing::warn!("[Session] 添加表情回应失败: message={} {}", message_id, e);
        }

        match self.active_chat() {
            Some(chat_id) => self.load_messages(chat_id).await,
            None => LoadOutcome::Skipped,
        }
    }

    /// 创建会话
    ///
    /// 成功后刷新会话列表；私聊（`ChatType::Chat`）会切换到新会话
    pub async fn create_chat(
        &self,
        name: &str,
        chat_type: ChatType,
        member_ids: Option<Vec<i64>>,
    ) -> CreateChatOutcome {
        let name = name.trim();
        if name.is_empty() {
            return CreateChatOutcome::Skipped;
        }

        let request = NewChat {
            name: name.to_string(),
            chat_type,
            member_ids,
        };

        let created = match self.api.create_chat(&request).await {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!("[Session] 创建会话失败: {}", e);
                self.events.error("创建会话失败", e.to_string());
                return CreateChatOutcome::Failed;
            }
        };

        tracing::info!(
            "[Session] 已创建会话: id={} type={}",
            created.id,
            chat_type.as_str()
        );

        self.load_chat_roster().await;
        if chat_type == ChatType::Chat {
            // 列表刷新失败时用创建响应里的会话补上，仍然没有则不切换
            let inserted = {
                let mut state = self.state.write();
                if state.chats.iter().any(|c| c.id == created.id) {
                    false
                } else if let Some(chat) = created.chat.clone() {
                    state.chats.push(chat);
                    true
                } else {
                    false
                }
            };
            if inserted {
                self.events.emit(SessionEvent::RosterUpdated);
            }
            self.select_chat(created.id).await;
        }

        CreateChatOutcome::Created(created.id)
    }

    // ------------------------------------------------------------------------
    // 通话（仅本地状态）
    // ------------------------------------------------------------------------

    /// 开始通话
    ///
    /// 需要有当前会话且没有进行中的通话，不访问远程 API
    pub fn start_call(&self, call_type: CallType) -> Option<Call> {
        let call = {
            let mut state = self.state.write();
            let chat_id = state.active_chat?;
            if state.call.is_some() {
                return None;
            }

            let chat_name = state
                .chats
                .iter()
                .find(|c| c.id == chat_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();

            let call = Call {
                chat_id,
                chat_name,
                call_type,
                start_time: Utc::now(),
            };
            state.call = Some(call.clone());
            call
        };

        tracing::info!("[Session] 开始通话: chat={} {:?}", call.chat_id, call.call_type);
        self.events.emit(SessionEvent::CallStarted { call: call.clone() });
        Some(call)
    }

    /// 结束通话，返回被结束的通话
    pub fn end_call(&self) -> Option<Call> {
        let ended = self.state.write().call.take();
        if ended.is_some() {
            tracing::info!("[Session] 通话结束");
            self.events.emit(SessionEvent::CallEnded);
        }
        ended
    }

    /// 当前通话时长 `MM:SS`，没有通话时为 `00:00`
    pub fn call_duration(&self) -> String {
        self.call_duration_at(Utc::now())
    }

    pub fn call_duration_at(&self, now: DateTime<Utc>) -> String {
        match &self.state.read().call {
            Some(call) => filter::format_call_duration((now - call.start_time).num_seconds()),
            None => filter::format_call_duration(0),
        }
    }
}
