use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Danger,
}

/// Outcome of a form submission, carried to the next page as `?notice=<code>`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    UserAdded,
    UserAddFailed,
    UserMissingField,
    QrGenerationFailed,
    MarkedTimeIn,
    MarkedTimeOut,
    InvalidQrFormat,
    InvalidQrData,
    CameraFailure,
    CameraBusy,
    NoQrDetected,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub code: NoticeKind,
    pub level: NoticeLevel,
    pub message: &'static str,
}

impl NoticeKind {
    pub const ALL: [NoticeKind; 11] = [
        NoticeKind::UserAdded,
        NoticeKind::UserAddFailed,
        NoticeKind::UserMissingField,
        NoticeKind::QrGenerationFailed,
        NoticeKind::MarkedTimeIn,
        NoticeKind::MarkedTimeOut,
        NoticeKind::InvalidQrFormat,
        NoticeKind::InvalidQrData,
        NoticeKind::CameraFailure,
        NoticeKind::CameraBusy,
        NoticeKind::NoQrDetected,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn code(&self) -> &'static str {
        match self {
            NoticeKind::UserAdded => "user_added",
            NoticeKind::UserAddFailed => "user_add_failed",
            NoticeKind::UserMissingField => "user_missing_field",
            NoticeKind::QrGenerationFailed => "qr_generation_failed",
            NoticeKind::MarkedTimeIn => "marked_time_in",
            NoticeKind::MarkedTimeOut => "marked_time_out",
            NoticeKind::InvalidQrFormat => "invalid_qr_format",
            NoticeKind::InvalidQrData => "invalid_qr_data",
            NoticeKind::CameraFailure => "camera_failure",
            NoticeKind::CameraBusy => "camera_busy",
            NoticeKind::NoQrDetected => "no_qr_detected",
        }
    }

    pub fn level(&self) -> NoticeLevel {
        match self {
            NoticeKind::UserAdded | NoticeKind::MarkedTimeIn | NoticeKind::MarkedTimeOut => NoticeLevel::Success,
            _ => NoticeLevel::Danger,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            NoticeKind::UserAdded => "User added and QR code generated successfully!",
            NoticeKind::UserAddFailed => "Error adding user!",
            NoticeKind::UserMissingField => "Name, office and designation are all required!",
            NoticeKind::QrGenerationFailed => "User added but the QR code could not be generated!",
            NoticeKind::MarkedTimeIn => "Attendance marked as time-in successfully!",
            NoticeKind::MarkedTimeOut => "Attendance marked as time-out successfully!",
            NoticeKind::InvalidQrFormat => "Invalid QR code format!",
            NoticeKind::InvalidQrData => "Invalid QR code data or database error!",
            NoticeKind::CameraFailure => "Failed to access the camera",
            NoticeKind::CameraBusy => "The camera is already scanning",
            NoticeKind::NoQrDetected => "No QR code detected",
        }
    }

    pub fn notice(self) -> Notice {
        Notice {
            code: self,
            level: self.level(),
            message: self.message(),
        }
    }

    /// `page` with this notice attached as a query parameter.
    pub fn location(&self, page: &str) -> String {
        format!("{}?notice={}", page, self.code())
    }
}
