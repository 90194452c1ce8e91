use std::path::Path;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::SqliteConnection;
use log::{error, info, warn};
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::qr::{self, QrError};
use crate::enums::notice::NoticeKind;
use crate::models::user::{NewUser, User};

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Field `{0}` is required")]
    MissingField(&'static str),

    #[error("User violates a database constraint: {0}")]
    Integrity(DieselError),

    #[error("User could not be stored: {0}")]
    Storage(DieselError),

    #[error("QR code for user {user_id} could not be generated: {source}")]
    Artifact { user_id: i32, source: QrError },
}

impl From<DieselError> for RegistrationError {
    fn from(error: DieselError) -> Self {
        match error {
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation,
                _,
            ) => RegistrationError::Integrity(error),
            other => RegistrationError::Storage(other),
        }
    }
}

impl RegistrationError {
    pub fn notice(&self) -> NoticeKind {
        match self {
            RegistrationError::MissingField(_) => NoticeKind::UserMissingField,
            RegistrationError::Integrity(_) | RegistrationError::Storage(_) => NoticeKind::UserAddFailed,
            RegistrationError::Artifact { .. } => NoticeKind::QrGenerationFailed,
        }
    }
}

/// Registration form. Missing fields arrive as empty strings.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct RegistrationForm {
    pub name: String,
    pub office: String,
    pub designation: String,
}

impl RegistrationForm {
    fn validate(self) -> Result<NewUser, RegistrationError> {
        let name = required("name", self.name)?;
        let office = required("office", self.office)?;
        let designation = required("designation", self.designation)?;

        Ok(NewUser { name, office, designation })
    }
}

fn required(field: &'static str, value: String) -> Result<String, RegistrationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistrationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Stores the user, then writes the QR artifact for the new id. The row is
/// kept if the artifact fails; `ensure_artifact` can regenerate it later.
pub fn register_user(form: RegistrationForm, qr_dir: &Path, conn: &mut SqliteConnection) -> Result<User, RegistrationError> {
    let new_user = form.validate()?;

    let user = User::create(&new_user, conn).map_err(|e| {
        error!("Failed to insert user {}: {}", new_user.name, e);
        RegistrationError::from(e)
    })?;

    qr::write_artifact(qr_dir, user.id, &user.qr_payload())
        .map_err(|source| {
            error!("User {} stored without QR code: {}", user.id, source);
            RegistrationError::Artifact { user_id: user.id, source }
        })?;

    info!("Registered user {} ({})", user.id, user.name);
    Ok(user)
}

/// Writes the artifact for `user` if the file is missing.
pub fn ensure_artifact(user: &User, qr_dir: &Path) -> Result<(), QrError> {
    if qr::artifact_path(qr_dir, user.id).exists() {
        return Ok(());
    }

    warn!("QR code for user {} is missing, regenerating", user.id);
    qr::write_artifact(qr_dir, user.id, &user.qr_payload()).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_pool;
    use tempfile::TempDir;

    fn form(name: &str, office: &str, designation: &str) -> RegistrationForm {
        RegistrationForm {
            name: name.to_string(),
            office: office.to_string(),
            designation: designation.to_string(),
        }
    }

    #[test]
    fn test_register_writes_artifact_for_new_id() {
        let (dir, pool) = test_pool();
        let qr_dir = dir.path().join("qr_codes");
        let mut conn = pool.get().unwrap();

        let user = register_user(form("Ada", "HQ", "Eng"), &qr_dir, &mut conn).unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Ada");
        assert!(qr_dir.join("user_1.png").exists());
    }

    #[test]
    fn test_blank_field_is_rejected_before_insert() {
        let (dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let result = register_user(form("Ada", "  ", "Eng"), dir.path(), &mut conn);

        assert!(matches!(result, Err(RegistrationError::MissingField("office"))));
        assert!(User::all(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_artifact_failure_keeps_row() {
        let (dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        // A plain file where the directory should be.
        let blocked = dir.path().join("not_a_dir");
        std::fs::write(&blocked, b"").unwrap();

        let result = register_user(form("Ada", "HQ", "Eng"), &blocked, &mut conn);

        assert!(matches!(result, Err(RegistrationError::Artifact { user_id: 1, .. })));
        assert_eq!(result.unwrap_err().notice(), NoticeKind::QrGenerationFailed);
        assert_eq!(User::all(&mut conn).unwrap().len(), 1);
    }

    #[test]
    fn test_ensure_artifact_regenerates_missing_file() {
        let qr_dir = TempDir::new().unwrap();
        let user = User {
            id: 5,
            name: "Ada".to_string(),
            office: "HQ".to_string(),
            designation: "Eng".to_string(),
        };

        ensure_artifact(&user, qr_dir.path()).unwrap();
        assert!(qr_dir.path().join("user_5.png").exists());
    }

    #[test]
    fn test_constraint_errors_are_integrity() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("UNIQUE constraint failed".to_string()),
        );
        assert!(matches!(RegistrationError::from(error), RegistrationError::Integrity(_)));
        assert!(matches!(RegistrationError::from(DieselError::NotFound), RegistrationError::Storage(_)));
    }
}
