use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Form, Json};
use log::error;
use serde_derive::Serialize;

use crate::api::{internal_error, ApiError, AppState, NoticeQuery, Page};
use crate::common::qr;
use crate::enums::notice::NoticeKind;
use crate::handlers::registration_handler::{ensure_artifact, register_user, RegistrationForm};
use crate::models::user::User;

#[derive(Serialize)]
pub struct AddUserForm {
    action: &'static str,
    fields: [&'static str; 3],
}

#[derive(Serialize)]
pub struct UserQrCode {
    #[serde(flatten)]
    user: User,
    qr_code: Option<String>,
}

pub async fn get_add_user(Query(query): Query<NoticeQuery>) -> Json<Page<AddUserForm>> {
    Json(Page::new(query, AddUserForm {
        action: "/add_user",
        fields: ["name", "office", "designation"],
    }))
}

pub async fn post_add_user(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegistrationForm>,
) -> Result<Redirect, ApiError> {
    let mut conn = state.db_pool.get().map_err(internal_error)?;

    let notice = match register_user(form, &state.qr_dir, &mut conn) {
        Ok(_) => NoticeKind::UserAdded,
        Err(e) => e.notice(),
    };

    Ok(Redirect::to(&notice.location("/add_user")))
}

pub async fn get_generate_qr(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserQrCode>>, ApiError> {
    let mut conn = state.db_pool.get().map_err(internal_error)?;

    let users = User::all(&mut conn).map_err(internal_error)?;

    let codes = users
        .into_iter()
        .map(|user| {
            let qr_code = match ensure_artifact(&user, &state.qr_dir) {
                Ok(()) => Some(format!("{}/{}", state.qr_url_prefix, qr::artifact_file_name(user.id))),
                Err(e) => {
                    error!("QR code for user {} unavailable: {}", user.id, e);
                    None
                }
            };
            UserQrCode { user, qr_code }
        })
        .collect();

    Ok(Json(codes))
}
