use std::num::ParseIntError;

use thiserror::Error;

pub const PAYLOAD_PREFIX: &str = "user_id:";

#[derive(Error, Debug, PartialEq)]
pub enum PayloadError {
    #[error("QR payload is missing the `{}` prefix", PAYLOAD_PREFIX)]
    Format,

    #[error("QR payload user id is not an integer: {0}")]
    Parse(#[from] ParseIntError),
}

pub fn encode(user_id: i32) -> String {
    format!("{}{}", PAYLOAD_PREFIX, user_id)
}

/// Extracts the user id from a scanned `user_id:<int>` payload.
pub fn parse(payload: Option<&str>) -> Result<i32, PayloadError> {
    let suffix = payload
        .and_then(|data| data.strip_prefix(PAYLOAD_PREFIX))
        .ok_or(PayloadError::Format)?;

    Ok(suffix.trim().parse::<i32>()?)
}
