use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Form, Json};
use serde_derive::Deserialize;

use crate::api::{internal_error, ApiError, AppState, NoticeQuery, Page};
use crate::handlers::attendance_handler::{record_attendance, success_notice};
use crate::models::attendance::AttendanceEntry;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct AttendanceForm {
    pub qr_data: Option<String>,
}

pub async fn get_attendance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<Json<Page<Vec<AttendanceEntry>>>, ApiError> {
    let mut conn = state.db_pool.get().map_err(internal_error)?;

    let records = AttendanceEntry::all(&mut conn).map_err(internal_error)?;

    Ok(Json(Page::new(query, records)))
}

pub async fn post_attendance(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AttendanceForm>,
) -> Result<Redirect, ApiError> {
    let mut conn = state.db_pool.get().map_err(internal_error)?;

    let notice = match record_attendance(form.qr_data.as_deref(), &mut conn) {
        Ok(record) => success_notice(record.status),
        Err(e) => e.notice(),
    };

    Ok(Redirect::to(&notice.location("/attendance")))
}
