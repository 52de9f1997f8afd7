//! HTTP server - Host を axum の固定パスに載せる
//!
//! `POST /warpunit-insider` が唯一の操作です。
//! 本文は TaskDescriptor の JSON、応答は encode 済み Outcome の text。

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::app::host::Host;
use crate::config::{HostConfig, INSIDER_PATH};
use crate::domain::descriptor::TaskDescriptor;

pub fn router(host: Arc<Host>) -> Router {
    Router::new()
        .route(INSIDER_PATH, post(warp_handler))
        .with_state(host)
}

async fn warp_handler(
    State(host): State<Arc<Host>>,
    Json(descriptor): Json<TaskDescriptor>,
) -> Result<String, (StatusCode, String)> {
    host.serve(descriptor).await.map_err(|e| {
        error!(error = %e, "could not encode outcome");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

pub async fn bind(config: &HostConfig) -> std::io::Result<TcpListener> {
    TcpListener::bind(config.bind_addr.as_str()).await
}

/// `shutdown` が完了するまでリクエストを受け続ける
pub async fn serve<F>(host: Arc<Host>, listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, path = INSIDER_PATH, "warpgate host listening");
    axum::serve(listener, router(host).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("warpgate host stopped");
    Ok(())
}

pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "could not listen for ctrl-c");
    }
}
