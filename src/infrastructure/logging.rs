//! 日志初始化
//! 控制台 + 可选按天轮转的文件日志，格式 json / text

use std::path::Path;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::LoggingConfig;

const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_LOG_FILE: &str = "ironsign.log";

/// 文件写入线程的守卫，需持有到进程退出，否则缓冲日志会丢失
#[must_use]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// 拆分日志路径为 (目录, 文件名前缀)
fn log_target(config: &LoggingConfig) -> (&Path, &str) {
    let path = config.log_file_path.as_deref().map(Path::new);
    let dir = path
        .and_then(|p| p.parent())
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new(DEFAULT_LOG_DIR));
    let file = path
        .and_then(|p| p.file_name())
        .and_then(|f| f.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    (dir, file)
}

/// `RUST_LOG` 优先于配置中的级别
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// 初始化全局日志；重复调用返回错误
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, Box<dyn std::error::Error>> {
    let filter = env_filter(config);
    let json = config.format == "json";

    if !config.enable_file_logging {
        if json {
            Registry::default()
                .with(filter)
                .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()))
                .try_init()?;
        } else {
            Registry::default()
                .with(filter)
                .with(fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_ansi(true))
                .try_init()?;
        }
        return Ok(LoggingGuard { _file: None });
    }

    let (dir, file) = log_target(config);
    std::fs::create_dir_all(dir)?;
    let (writer, guard) = non_blocking(rolling::daily(dir, file));

    if json {
        Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_timer(ChronoUtc::rfc_3339()),
            )
            .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()))
            .try_init()?;
    } else {
        Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false),
            )
            .with(fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_ansi(true))
            .try_init()?;
    }

    Ok(LoggingGuard { _file: Some(guard) })
}
