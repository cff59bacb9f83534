//! 错误类型
//!
//! `ApiError` 只在 `api` 层和会话管理器之间传递，
//! 会话操作本身不会把它抛给调用方（见 `session` 模块）

use thiserror::Error;

use crate::config::ConfigError;

/// 远程 API 调用错误
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("请求失败: {0}")]
    Request(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("响应解析失败: {0}")]
    Decode(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
