//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It configures and starts the HTTP server with all necessary routes.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::services::{AppStartTime, AppState, health_routes, visitor_routes};
use crate::config::{ProxyConfig, get_config};
use crate::runtime::lifetime;

/// 注册全部路由，服务器与集成测试共用
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").service(health_routes()))
        .service(visitor_routes());
}

fn log_proxy_mode(proxy: &ProxyConfig) {
    if proxy.trusted_proxies.is_empty() {
        warn!(
            "Client IP: Auto-detect mode enabled. \
             Connections from private IPs will use X-Forwarded-For. \
             To disable, configure proxy.trusted_proxies explicitly."
        );
    } else {
        warn!(
            "Client IP: Explicit trusted proxies configured: {:?}",
            proxy.trusted_proxies
        );
    }
}

/// Run the HTTP server
///
/// This function:
/// 1. Records startup time
/// 2. Opens storage and builds the visitor resolver
/// 3. Configures and starts the HTTP server
/// 4. Listens for graceful shutdown signals
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime::now();
    let config = get_config();

    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {:#}", e);
            e
        })?;

    let state = startup.state.clone();
    let store_for_shutdown = startup.store.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    log_proxy_mode(&config.proxy);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add(("Keep-Alive", "timeout=30, max=1000"))
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .configure(configure_app)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count)
    .disable_signals();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();
    let handle = server.handle();

    // Wait for server or shutdown signal
    let result = tokio::select! {
        res = server => res.context("HTTP server terminated with an error"),
        _ = lifetime::shutdown::wait_for_signal() => {
            warn!("Shutdown signal received, stopping HTTP server...");
            handle.stop(true).await;
            Ok(())
        }
    };

    lifetime::shutdown::close_storage(store_for_shutdown).await;
    warn!("Graceful shutdown: all tasks completed");
    result
}
