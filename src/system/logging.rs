//! Logging system initialization
//!
//! This module provides functions to initialize the tracing/logging system
//! based on application configuration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::LoggingConfig;

const DEFAULT_LOG_FILE: &str = "visitrack.log";

/// 日志输出目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// 按天滚动的日志文件
    Rolling { dir: String, prefix: String },
    /// 追加写入单个文件
    File(String),
}

impl LogTarget {
    pub fn from_config(config: &LoggingConfig) -> Self {
        match config.file.as_deref().filter(|f| !f.is_empty()) {
            None => LogTarget::Stdout,
            Some(log_file) if config.enable_rotation => {
                let path = Path::new(log_file);
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or(Path::new("."));
                let filename = path
                    .file_name()
                    .and_then(|f| f.to_str())
                    .unwrap_or(DEFAULT_LOG_FILE);
                LogTarget::Rolling {
                    dir: dir.to_string_lossy().into_owned(),
                    prefix: filename.trim_end_matches(".log").to_string(),
                }
            }
            Some(log_file) => LogTarget::File(log_file.to_string()),
        }
    }
}

/// Initialize logging system based on configuration
///
/// Sets up file output, log rotation and formatting. Must be called once,
/// after the configuration has been loaded.
///
/// The returned `WorkerGuard` must be kept alive for the duration of the
/// program so non-blocking writes are flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let target = LogTarget::from_config(config);
    let writer: Box<dyn std::io::Write + Send + Sync> = match &target {
        LogTarget::Stdout => Box::new(std::io::stdout()),
        LogTarget::Rolling { dir, prefix } => {
            let appender = rolling::Builder::new()
                .rotation(rolling::Rotation::DAILY)
                .filename_prefix(prefix)
                .filename_suffix("log")
                .max_log_files(config.max_backups.max(1) as usize)
                .build(dir)
                .context("Failed to create rolling log appender")?;
            Box::new(appender)
        }
        LogTarget::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Box::new(file)
        }
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level filter: {}", config.level))?;

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(target == LogTarget::Stdout);

    let installed = if config.format == "json" {
        subscriber_builder.json().try_init()
    } else {
        subscriber_builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(guard)
}
