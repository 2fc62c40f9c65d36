//! 观测性初始化。

pub mod events;

use tracing::subscriber::SetGlobalDefaultError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::config::{LogFormat, LogLevel};

/// 安装全局订阅者。`RUST_LOG` 存在时覆盖配置的日志级别。
///
/// 日志写往 stderr，stdout 保留给命令输出。返回的 guard 需存活到进程结束。
pub fn init_tracing(
    level: LogLevel,
    format: LogFormat,
) -> Result<WorkerGuard, SetGlobalDefaultError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let registry = Registry::default().with(env_filter);

    match format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_current_span(false)
                .with_writer(writer);
            tracing::subscriber::set_global_default(registry.with(layer))?;
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_target(true).with_writer(writer);
            tracing::subscriber::set_global_default(registry.with(layer))?;
        }
    }

    Ok(guard)
}
