use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use log::debug;
use qrcode::QrCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrError {
    #[error("QR payload could not be encoded: {0}")]
    Encode(qrcode::types::QrError),

    #[error("QR image could not be written: {0}")]
    Image(#[from] image::ImageError),

    #[error("QR directory could not be created: {0}")]
    Io(#[from] std::io::Error),
}

pub fn artifact_file_name(user_id: i32) -> String {
    format!("user_{}.png", user_id)
}

pub fn artifact_path(directory: &Path, user_id: i32) -> PathBuf {
    directory.join(artifact_file_name(user_id))
}

pub fn encode(payload: &str) -> Result<GrayImage, QrError> {
    let code = QrCode::new(payload.as_bytes()).map_err(QrError::Encode)?;
    Ok(code.render::<Luma<u8>>().build())
}

/// Renders `payload` and saves it as the artifact of `user_id`.
pub fn write_artifact(directory: &Path, user_id: i32, payload: &str) -> Result<PathBuf, QrError> {
    fs::create_dir_all(directory)?;

    let path = artifact_path(directory, user_id);
    encode(payload)?.save(&path)?;

    debug!("Wrote QR code for user {} to {}", user_id, path.display());
    Ok(path)
}

/// First QR payload found in the frame, if any.
pub fn decode(frame: &GrayImage) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        frame.width() as usize,
        frame.height() as usize,
        |x, y| frame.get_pixel(x as u32, y as u32).0[0],
    );

    prepared
        .detect_grids()
        .into_iter()
        .find_map(|grid| grid.decode().ok())
        .map(|(_, content)| content)
        .filter(|content| !content.is_empty())
}
