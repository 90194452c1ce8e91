use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use image::GrayImage;
use log::{debug, warn};
use serde_derive::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::time::timeout;

use crate::config::CameraConf;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum CameraError {
    #[error("Camera could not be opened: {0}")]
    Unavailable(String),

    #[error("Camera frame could not be captured: {0}")]
    Capture(String),

    #[error("Camera is already scanning")]
    Busy,
}

/// An exclusive capture device. The returned source holds the device until
/// it is dropped.
pub trait Camera: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameSource>, CameraError>;
}

pub trait FrameSource: Send {
    fn read_frame(&mut self) -> Result<GrayImage, CameraError>;
}

/// Grabs frames by running an external capture command that prints one PNG
/// to stdout, e.g. `ffmpeg -f v4l2 -i /dev/video0 -frames:v 1 ... -`.
/// A run that exceeds `capture_timeout_ms` is killed and reported as a
/// capture error. Must be opened from inside a tokio runtime.
pub struct CommandCamera {
    conf: CameraConf,
}

impl CommandCamera {
    pub fn new(conf: CameraConf) -> Self {
        CommandCamera { conf }
    }
}

impl Camera for CommandCamera {
    fn open(&self) -> Result<Box<dyn FrameSource>, CameraError> {
        if !Path::new(&self.conf.device).exists() {
            return Err(CameraError::Unavailable(format!("{} does not exist", self.conf.device)));
        }

        let runtime = Handle::try_current()
            .map_err(|e| CameraError::Unavailable(e.to_string()))?;

        let args = self.conf.args
            .iter()
            .map(|arg| arg.replace("{device}", &self.conf.device))
            .collect();

        debug!("Opened camera {}", self.conf.device);
        Ok(Box::new(CommandFrames {
            device: self.conf.device.clone(),
            program: self.conf.program.clone(),
            args,
            capture_timeout: self.conf.capture_timeout(),
            runtime,
        }))
    }
}

struct CommandFrames {
    device: String,
    program: String,
    args: Vec<String>,
    capture_timeout: Duration,
    runtime: Handle,
}

impl FrameSource for CommandFrames {
    fn read_frame(&mut self) -> Result<GrayImage, CameraError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Called from a blocking thread; dropping the timed out future kills the child.
        let capture_timeout = self.capture_timeout;
        let output = self.runtime
            .block_on(async { timeout(capture_timeout, command.output()).await })
            .map_err(|_| {
                warn!("{} produced no frame within {:?}, killed", self.program, capture_timeout);
                CameraError::Capture(format!("{} timed out after {:?}", self.program, capture_timeout))
            })?
            .map_err(|e| CameraError::Unavailable(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CameraError::Capture(format!("{} exited with {}: {}", self.program, output.status, stderr.trim())));
        }

        image::load_from_memory(&output.stdout)
            .map(|frame| frame.to_luma8())
            .map_err(|e| CameraError::Capture(e.to_string()))
    }
}

impl Drop for CommandFrames {
    fn drop(&mut self) {
        debug!("Released camera {}", self.device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conf(device: &str, program: &str, args: &[&str]) -> CameraConf {
        CameraConf {
            device: device.to_string(),
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            poll_interval_ms: 10,
            capture_timeout_ms: 200,
        }
    }

    // Opens the camera and reads one frame on a blocking thread, the way the
    // scanner drives it.
    async fn read_one(camera: CommandCamera) -> Result<GrayImage, CameraError> {
        tokio::task::spawn_blocking(move || camera.open()?.read_frame())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_device_is_unavailable() {
        let camera = CommandCamera::new(conf("/dev/does-not-exist", "ffmpeg", &[]));
        assert!(matches!(read_one(camera).await, Err(CameraError::Unavailable(_))));
    }

    #[test]
    fn test_open_outside_runtime_is_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let device = dir.path().to_string_lossy().into_owned();
        let camera = CommandCamera::new(conf(&device, "true", &[]));

        assert!(matches!(camera.open(), Err(CameraError::Unavailable(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failing_command_is_capture_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let device = dir.path().to_string_lossy().into_owned();
        let camera = CommandCamera::new(conf(&device, "false", &[]));

        assert!(matches!(read_one(camera).await, Err(CameraError::Capture(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_hanging_command_is_killed_after_timeout() {
        let dir = tempfile::TempDir::new().unwrap();
        let device = dir.path().to_string_lossy().into_owned();
        let camera = CommandCamera::new(conf(&device, "sleep", &["30"]));

        let started = std::time::Instant::now();
        let result = read_one(camera).await;

        assert!(matches!(result, Err(CameraError::Capture(ref message)) if message.contains("timed out")));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
