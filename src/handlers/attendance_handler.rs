use diesel::SqliteConnection;
use log::{error, info, warn};
use thiserror::Error;

use crate::enums::attendance_status::AttendanceStatus;
use crate::enums::notice::NoticeKind;
use crate::models::attendance::AttendanceRecord;
use crate::models::qr_payload::{self, PayloadError};

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("Invalid QR code format")]
    Format,

    #[error("Invalid user id in QR code: {0}")]
    Parse(std::num::ParseIntError),

    #[error("Attendance could not be stored: {0}")]
    Storage(#[from] diesel::result::Error),
}

impl From<PayloadError> for AttendanceError {
    fn from(error: PayloadError) -> Self {
        match error {
            PayloadError::Format => AttendanceError::Format,
            PayloadError::Parse(e) => AttendanceError::Parse(e),
        }
    }
}

impl AttendanceError {
    pub fn notice(&self) -> NoticeKind {
        match self {
            AttendanceError::Format => NoticeKind::InvalidQrFormat,
            AttendanceError::Parse(_) | AttendanceError::Storage(_) => NoticeKind::InvalidQrData,
        }
    }
}

pub fn success_notice(status: AttendanceStatus) -> NoticeKind {
    match status {
        AttendanceStatus::TimeIn => NoticeKind::MarkedTimeIn,
        AttendanceStatus::TimeOut => NoticeKind::MarkedTimeOut,
    }
}

/// Records the next time-in/time-out for the user named by a scanned payload.
/// The user id is not checked against registered users.
pub fn record_attendance(payload: Option<&str>, conn: &mut SqliteConnection) -> Result<AttendanceRecord, AttendanceError> {
    let user_id = qr_payload::parse(payload).map_err(|e| {
        warn!("Rejected QR payload {:?}: {}", payload, e);
        AttendanceError::from(e)
    })?;

    let record = AttendanceRecord::record_next(user_id, conn).map_err(|e| {
        error!("Failed to record attendance for user {}: {}", user_id, e);
        AttendanceError::from(e)
    })?;

    info!("User {} marked {}", record.user_id, record.status);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::AttendanceEntry;
    use crate::test_utils::test_pool;

    #[test]
    fn test_malformed_payloads_write_nothing() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let garbage = record_attendance(Some("garbage"), &mut conn).unwrap_err();
        let not_a_number = record_attendance(Some("user_id:abc"), &mut conn).unwrap_err();
        let missing = record_attendance(None, &mut conn).unwrap_err();

        assert_eq!(garbage.notice(), NoticeKind::InvalidQrFormat);
        assert_eq!(not_a_number.notice(), NoticeKind::InvalidQrData);
        assert!(matches!(not_a_number, AttendanceError::Parse(_)));
        assert!(matches!(missing, AttendanceError::Format));
        assert_eq!(AttendanceRecord::last_status(1, &mut conn).unwrap(), None);
        assert!(AttendanceEntry::all(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_valid_payload_alternates() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let first = record_attendance(Some("user_id:999"), &mut conn).unwrap();
        let second = record_attendance(Some("user_id:999"), &mut conn).unwrap();

        assert_eq!(success_notice(first.status), NoticeKind::MarkedTimeIn);
        assert_eq!(success_notice(second.status), NoticeKind::MarkedTimeOut);
    }

    #[test]
    fn test_storage_failure_is_reported() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        diesel::connection::SimpleConnection::batch_execute(&mut *conn, "DROP TABLE attendance;").unwrap();

        let error = record_attendance(Some("user_id:1"), &mut conn).unwrap_err();

        assert!(matches!(error, AttendanceError::Storage(_)));
        assert_eq!(error.notice(), NoticeKind::InvalidQrData);
    }
}
