pub mod attendance_handler;
pub mod registration_handler;
