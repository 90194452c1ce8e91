pub mod attendance;
pub mod qr_payload;
pub mod user;
