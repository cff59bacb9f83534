/*!
 * 会话配置模块
 *
 * 替代原先散落在模块顶层的 API 地址和当前用户 ID：
 * - API 基础地址
 * - 当前用户 ID（通过请求头传给服务器）
 * - 用户请求头名称
 * - 请求超时
 *
 * 配置来源：默认值 → JSON 文件 → 环境变量
 */

use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 默认 API 地址
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/messenger";

/// 服务器未收到用户头时使用的默认用户
pub const DEFAULT_USER_ID: i64 = 2;

/// 默认用户请求头
pub const DEFAULT_USER_HEADER: &str = "X-User-Id";

/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// 错误类型
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("配置文件解析失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("无效的配置: {0}")]
    Invalid(String),
}

// ============================================================================
// 配置结构
// ============================================================================

/// 会话配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// API 基础地址（请求形如 `{api_base_url}?path=chats`）
    pub api_base_url: String,
    /// 当前用户 ID
    pub user_id: i64,
    /// 携带用户 ID 的请求头
    pub user_header: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID,
            user_header: DEFAULT_USER_HEADER.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    pub fn new(api_base_url: impl Into<String>, user_id: i64) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            user_id,
            ..Self::default()
        }
    }

    /// 从 JSON 文件加载，缺失字段使用默认值
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SessionConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 默认值叠加环境变量
    ///
    /// - `MESSENGER_API_URL`
    /// - `MESSENGER_USER_ID`
    /// - `MESSENGER_USER_HEADER`
    /// - `MESSENGER_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MESSENGER_API_URL") {
            self.api_base_url = url;
        }
        if let Some(id) = lookup("MESSENGER_USER_ID") {
            self.user_id = id
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("MESSENGER_USER_ID: {}", id)))?;
        }
        if let Some(header) = lookup("MESSENGER_USER_HEADER") {
            self.user_header = header;
        }
        if let Some(secs) = lookup("MESSENGER_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("MESSENGER_TIMEOUT_SECS: {}", secs)))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("API 地址为空".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!("API 地址必须是 http(s): {}", url)));
        }
        if self.user_header.trim().is_empty() {
            return Err(ConfigError::Invalid("用户请求头为空".to_string()));
        }
        if HeaderName::from_bytes(self.user_header.as_bytes()).is_err() {
            return Err(ConfigError::Invalid(format!(
                "用户请求头名称无效: {}",
                self.user_header
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("请求超时必须大于 0".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
