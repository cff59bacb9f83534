//! 数据类型定义
//!
//! 定义会话状态使用的数据结构，包括：
//! - `Chat`: 会话（私聊 / 群组 / 频道 / 语音）
//! - `Message`: 会话内的一条消息
//! - `VoiceRoom`: 语音房间快照
//! - `User`: 用户目录条目（发起私聊用）
//! - `Call`: 本地通话描述（仅客户端，不与服务器同步）
//!
//! 服务器字段使用下划线命名（`last_message_time`），直接按原名序列化

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 会话类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    /// 私聊
    Chat,
    /// 群组
    Group,
    /// 频道
    Channel,
    /// 语音
    Voice,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Chat => "chat",
            ChatType::Group => "group",
            ChatType::Channel => "channel",
            ChatType::Voice => "voice",
        }
    }
}

/// 会话记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_time: Option<String>,
    #[serde(default)]
    pub unread_count: i64,
    #[serde(default)]
    pub member_count: i64,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
}

/// 消息记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub sender_name: String,
    pub avatar_color: String,
    pub content: String,
    pub created_at: String,
    /// 表情回应，服务器可能返回 null 或省略
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reactions: Vec<String>,
}

/// 语音房间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceRoom {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub participants: i64,
}

/// 在线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    #[default]
    Offline,
}

/// 用户目录条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_color: String,
    #[serde(default)]
    pub status: UserStatus,
}

/// 通话类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Voice,
    Video,
}

/// 本地通话描述
///
/// 仅用于界面展示通话状态和计时，不发起任何信令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub chat_id: i64,
    pub chat_name: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub start_time: DateTime<Utc>,
}

/// 创建会话请求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewChat {
    pub name: String,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_ids: Option<Vec<i64>>,
}

/// 创建会话结果
///
/// 服务器可能返回完整的 `{chat}`，也可能只返回 `{chat_id}`
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedChat {
    pub id: i64,
    pub chat: Option<Chat>,
}

// ============================================================================
// 请求 / 响应包装
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ChatsResponse {
    #[serde(default)]
    pub chats: Vec<Chat>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoomsResponse {
    #[serde(default)]
    pub rooms: Vec<VoiceRoom>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendResponse {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateChatResponse {
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub chat_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendRequest<'a> {
    pub chat_id: i64,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReactRequest<'a> {
    pub message_id: i64,
    pub emoji: &'a str,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
