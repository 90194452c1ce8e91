use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use log::{error, info};
use serde_derive::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::attendance::{get_attendance, post_attendance};
use crate::api::scan::{get_scan_status, post_scan_cancel, post_scan_qr, post_scan_start};
use crate::api::system::get_info;
use crate::api::users::{get_add_user, get_generate_qr, post_add_user};
use crate::common::db::DatabasePool;
use crate::config::ServerConf;
use crate::enums::notice::{Notice, NoticeKind};
use crate::hardware::scanner::Scanner;

mod attendance;
mod scan;
mod system;
mod users;


pub struct AppState {
    pub db_pool: DatabasePool,
    pub scanner: Arc<Scanner>,
    pub qr_dir: PathBuf,
    pub qr_url_prefix: String,
}

#[derive(Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorMessage>);

/// `?notice=<code>` left by the redirect after a form submission. Unknown
/// codes are ignored so a stale link still renders the page.
#[derive(Deserialize, Default)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    pub fn kind(&self) -> Option<NoticeKind> {
        self.notice.as_deref().and_then(NoticeKind::from_code)
    }
}

#[derive(Serialize)]
pub struct Page<T> {
    pub notice: Option<Notice>,
    pub data: T,
}

impl<T> Page<T> {
    pub fn new(query: NoticeQuery, data: T) -> Self {
        Page {
            notice: query.kind().map(NoticeKind::notice),
            data,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let qr_files = ServeDir::new(&state.qr_dir);

    Router::new()
        .route("/", get(get_info))
        .route("/add_user", get(get_add_user).post(post_add_user))
        .route("/attendance", get(get_attendance).post(post_attendance))
        .route("/generate_qr", get(get_generate_qr))
        .route("/scan_qr", post(post_scan_qr))
        .route("/scan_qr/start", post(post_scan_start))
        .route("/scan_qr/status", get(get_scan_status))
        .route("/scan_qr/cancel", post(post_scan_cancel))
        .nest_service(&state.qr_url_prefix, qr_files)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn init(server_conf: &ServerConf, state: Arc<AppState>) -> std::io::Result<()> {
    let address = format!("{}:{}", server_conf.address, server_conf.port);
    let scanner = state.scanner.clone();

    let listener = TcpListener::bind(&address).await?;
    info!("Listening on: {}", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if scanner.cancel() {
        info!("Cancelled running scan on shutdown");
    }
    Ok(())
}

async fn shutdown_signal() {
    // Wait for CTRL+C
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

pub fn internal_error<E>(err: E) -> ApiError where E: std::error::Error, {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorMessage { message: err.to_string() }))
}
