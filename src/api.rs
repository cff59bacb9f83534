//! Messenger API 客户端
//!
//! 所有接口共用一个入口地址，通过 `?path=` 区分：
//!
//! | 方法 | path | 响应 |
//! |------|------|------|
//! | GET  | `chats` | `{ chats: [...] }` |
//! | GET  | `messages/{chat_id}` | `{ messages: [...] }` |
//! | GET  | `voice-rooms` | `{ rooms: [...] }` |
//! | GET  | `users` | `{ users: [...] }` |
//! | POST | `send` | `{ message: {...} }` |
//! | POST | `react` | 不读取 |
//! | POST | `create-chat` | `{ chat: {...} }` 或 `{ chat_id }` |
//!
//! 每个请求都带上当前用户请求头（默认 `X-User-Id`）。
//! 非 2xx 响应的 `{ error }` 字段会被提取到 `ApiError::Status`。

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

use crate::config::SessionConfig;
use crate::error::ApiError;
use crate::types::{
    Chat, ChatsResponse, CreateChatResponse, CreatedChat, ErrorResponse, Message,
    MessagesResponse, NewChat, ReactRequest, RoomsResponse, SendRequest, SendResponse, User,
    UsersResponse, VoiceRoom,
};

/// 远程聊天数据源
///
/// 会话管理器只依赖这个 trait，测试时可替换为内存实现
pub trait ChatApi: Send + Sync {
    fn fetch_chats(&self) -> impl Future<Output = Result<Vec<Chat>, ApiError>> + Send;

    fn fetch_messages(
        &self,
        chat_id: i64,
    ) -> impl Future<Output = Result<Vec<Message>, ApiError>> + Send;

    fn fetch_voice_rooms(&self) -> impl Future<Output = Result<Vec<VoiceRoom>, ApiError>> + Send;

    fn fetch_users(&self) -> impl Future<Output = Result<Vec<User>, ApiError>> + Send;

    fn send_message(
        &self,
        chat_id: i64,
        content: &str,
    ) -> impl Future<Output = Result<Message, ApiError>> + Send;

    fn add_reaction(
        &self,
        message_id: i64,
        emoji: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn create_chat(
        &self,
        request: &NewChat,
    ) -> impl Future<Output = Result<CreatedChat, ApiError>> + Send;
}

/// 基于 reqwest 的 HTTP 实现
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    config: SessionConfig,
}

impl HttpChatApi {
    pub fn new(config: SessionConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, &self.config.api_base_url)
            .query(&[("path", path)])
            .header(
                self.config.user_header.as_str(),
                self.config.user_id.to_string(),
            )
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!("[Api] GET {}", path);
        let response = self.request(reqwest::Method::GET, path).send().await?;
        read_json(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("[Api] POST {}", path);
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }
}

/// 读取响应体：非 2xx 时优先使用 `{ error }` 字段
async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    Ok(body)
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let body = read_body(response).await?;
    Ok(serde_json::from_str(&body)?)
}

impl ChatApi for HttpChatApi {
    async fn fetch_chats(&self) -> Result<Vec<Chat>, ApiError> {
        let response: ChatsResponse = self.get("chats").await?;
        Ok(response.chats)
    }

    async fn fetch_messages(&self, chat_id: i64) -> Result<Vec<Message>, ApiError> {
        let response: MessagesResponse = self.get(&format!("messages/{}", chat_id)).await?;
        Ok(response.messages)
    }

    async fn fetch_voice_rooms(&self) -> Result<Vec<VoiceRoom>, ApiError> {
        let response: RoomsResponse = self.get("voice-rooms").await?;
        Ok(response.rooms)
    }

    async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        let response: UsersResponse = self.get("users").await?;
        Ok(response.users)
    }

    async fn send_message(&self, chat_id: i64, content: &str) -> Result<Message, ApiError> {
        let response: SendResponse = self.post("send", &SendRequest { chat_id, content }).await?;
        Ok(response.message)
    }

    async fn add_reaction(&self, message_id: i64, emoji: &str) -> Result<(), ApiError> {
        tracing::debug!("[Api] POST react");
        let response = self
            .request(reqwest::Method::POST, "react")
            .json(&ReactRequest { message_id, emoji })
            .send()
            .await?;
        read_body(response).await?;
        Ok(())
    }

    async fn create_chat(&self, request: &NewChat) -> Result<CreatedChat, ApiError> {
        let response: CreateChatResponse = self.post("create-chat", request).await?;
        let id = response
            .chat
            .as_ref()
            .map(|c| c.id)
            .or(response.chat_id)
            .ok_or_else(|| ApiError::Decode("响应中缺少 chat 或 chat_id".to_string()))?;
        Ok(CreatedChat {
            id,
            chat: response.chat,
        })
    }
}
