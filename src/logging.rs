//! 日志初始化
//!
//! 默认级别 `messenger_session=info`，可用 `RUST_LOG` 覆盖

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "messenger_session=info";

static LOGGING: OnceCell<()> = OnceCell::new();

/// 安装全局 tracing 订阅器，重复调用无副作用
///
/// 宿主程序已经安装了订阅器时不会覆盖
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .is_err()
        {
            eprintln!("[Logging] 已存在全局日志订阅器，跳过初始化");
        }
    });
}
