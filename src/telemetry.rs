//! 日志初始化
//!
//! 库本身只通过 tracing 宏输出事件，嵌入方可以用这里的函数安装订阅者。

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// 日志输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// 安装全局 tracing 订阅者
///
/// 优先使用 `RUST_LOG`，未设置时使用 `default_directive`（如 `"info"`）。
/// 重复安装返回错误。
pub fn init_tracing(
    default_directive: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}
