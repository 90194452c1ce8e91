pub mod attendance_status;
pub mod notice;
