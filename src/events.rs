//! 会话事件
//!
//! 通过 broadcast 通道通知界面层：
//! - `Notice`: 需要展示给用户的提示（toast）
//! - 其余为状态变更信号，订阅方收到后自行读取最新快照
//!
//! 没有订阅者时发送失败是正常情况，直接忽略

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::Call;

/// 事件通道容量
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Error,
}

/// 会话事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// 用户可见提示
    Notice {
        level: NoticeLevel,
        title: String,
        description: String,
    },
    /// 会话列表已替换
    RosterUpdated,
    /// 消息列表已更新
    MessagesUpdated { chat_id: i64 },
    /// 当前会话切换
    ActiveChatChanged { chat_id: Option<i64> },
    /// 通话开始
    CallStarted { call: Call },
    /// 通话结束
    CallEnded,
}

/// 事件发送器
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }

    /// 发送错误提示
    pub fn error(&self, title: &str, description: impl Into<String>) {
        self.emit(SessionEvent::Notice {
            level: NoticeLevel::Error,
            title: title.to_string(),
            description: description.into(),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(SessionEvent::RosterUpdated);
    }

    #[test]
    fn test_subscriber_receives_notice() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.error("Ошибка", "Не удалось загрузить чаты");

        match rx.try_recv().unwrap() {
            SessionEvent::Notice { level, title, .. } => {
                assert_eq!(level, NoticeLevel::Error);
                assert_eq!(title, "Ошибка");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_tagging() {
        let value = serde_json::to_value(SessionEvent::MessagesUpdated { chat_id: 3 }).unwrap();
        assert_eq!(value["type"], "messages_updated");
        assert_eq!(value["chat_id"], 3);
    }
}
