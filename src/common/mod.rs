pub mod db;
pub mod qr;
