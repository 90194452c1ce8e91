use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use http::StatusCode;
use serde_derive::Serialize;

use crate::api::{ApiError, AppState, ErrorMessage};
use crate::enums::notice::NoticeKind;
use crate::hardware::camera::CameraError;
use crate::hardware::scanner::{ScanState, Scanner};

#[derive(Serialize)]
pub struct QrData {
    pub qr_data: String,
}

fn attendance_redirect(notice: NoticeKind) -> Response {
    Redirect::to(&notice.location("/attendance")).into_response()
}

/// Scans until a code is decoded, the scan is cancelled or the camera fails.
/// The decoded payload is returned, not recorded.
pub async fn post_scan_qr(State(state): State<Arc<AppState>>) -> Response {
    let state_rx = match state.scanner.start() {
        Ok(state_rx) => state_rx,
        Err(CameraError::Busy) => return attendance_redirect(NoticeKind::CameraBusy),
        Err(_) => return attendance_redirect(NoticeKind::CameraFailure),
    };

    let guard = state.scanner.cancel_on_drop();
    let outcome = Scanner::wait(state_rx).await;
    guard.disarm();

    match outcome {
        ScanState::Detected { qr_data } => Json(QrData { qr_data }).into_response(),
        ScanState::Failed { .. } => attendance_redirect(NoticeKind::CameraFailure),
        _ => attendance_redirect(NoticeKind::NoQrDetected),
    }
}

pub async fn post_scan_start(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ScanState>), ApiError> {
    match state.scanner.start() {
        Ok(state_rx) => {
            let current = state_rx.borrow().clone();
            Ok((StatusCode::ACCEPTED, Json(current)))
        }
        Err(e) => Err((StatusCode::CONFLICT, Json(ErrorMessage { message: e.to_string() }))),
    }
}

pub async fn get_scan_status(State(state): State<Arc<AppState>>) -> Json<ScanState> {
    Json(state.scanner.status())
}

pub async fn post_scan_cancel(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    if state.scanner.cancel() {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::CONFLICT, Json(ErrorMessage { message: "No scan is running".to_string() })))
    }
}
