use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::visitor::VisitorStore;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C（Unix 下还包括 SIGTERM）
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut term = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
                return;
            }
        };
        tokio::select! {
            res = signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!("Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.", e);
                }
            }
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    if let Err(e) = signal::ctrl_c().await {
        warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        );
    }
}

/// 关闭存储连接，超时只记录错误
pub async fn close_storage(store: Arc<dyn VisitorStore>) {
    info!("Closing storage...");
    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), store.close()).await {
        Ok(Ok(())) => info!("Storage closed"),
        Ok(Err(e)) => error!("Failed to close storage: {}", e),
        Err(_) => error!(
            "Closing storage timed out after {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
