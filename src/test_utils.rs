use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{GrayImage, Luma};
use tempfile::TempDir;

use crate::common::db::{create_pool, init_schema, DatabasePool};
use crate::common::qr;
use crate::config::DatabaseConf;
use crate::hardware::camera::{Camera, CameraError, FrameSource};

/// Pool over a fresh database file inside a temp dir. Keep the dir alive.
pub fn test_pool() -> (TempDir, DatabasePool) {
    let dir = TempDir::new().unwrap();
    let conf = DatabaseConf {
        url: dir.path().join("attendance.db").to_string_lossy().into_owned(),
        pool_size: 8,
    };
    let pool = create_pool(&conf).unwrap();
    init_schema(&mut pool.get().unwrap()).unwrap();
    (dir, pool)
}

pub fn blank_frame() -> GrayImage {
    GrayImage::from_pixel(64, 64, Luma([255]))
}

pub fn qr_frame(payload: &str) -> GrayImage {
    qr::encode(payload).unwrap()
}

#[derive(Clone)]
pub enum Scripted {
    Frame(GrayImage),
    Fail,
    Panic,
}

/// Camera that replays a script of frames, then repeats blank frames.
pub struct FakeCamera {
    script: Mutex<VecDeque<Scripted>>,
    open_fails: bool,
    pub opened: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
}

impl FakeCamera {
    pub fn new(script: Vec<Scripted>) -> Self {
        FakeCamera {
            script: Mutex::new(script.into()),
            open_fails: false,
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        FakeCamera {
            open_fails: true,
            ..FakeCamera::new(Vec::new())
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Camera for FakeCamera {
    fn open(&self) -> Result<Box<dyn FrameSource>, CameraError> {
        if self.open_fails {
            return Err(CameraError::Unavailable("no such device".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);

        let script = std::mem::take(&mut *self.script.lock().unwrap());
        Ok(Box::new(FakeFrames {
            script,
            released: self.released.clone(),
        }))
    }
}

struct FakeFrames {
    script: VecDeque<Scripted>,
    released: Arc<AtomicUsize>,
}

impl FrameSource for FakeFrames {
    fn read_frame(&mut self) -> Result<GrayImage, CameraError> {
        match self.script.pop_front() {
            Some(Scripted::Frame(frame)) => Ok(frame),
            Some(Scripted::Fail) => Err(CameraError::Capture("frame read failed".to_string())),
            Some(Scripted::Panic) => panic!("frame decoder crashed"),
            None => Ok(blank_frame()),
        }
    }
}

impl Drop for FakeFrames {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
