use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde_derive::Serialize;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{oneshot, watch};

use crate::common::qr;
use crate::hardware::camera::{Camera, CameraError};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Scanning,
    Detected { qr_data: String },
    Failed { error: CameraError },
    Cancelled,
}

impl ScanState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, ScanState::Scanning)
    }

    fn abandoned() -> Self {
        ScanState::Failed {
            error: CameraError::Capture("scan task ended without a result".to_string()),
        }
    }
}

struct ActiveScan {
    cancel_tx: Option<oneshot::Sender<()>>,
    state_rx: watch::Receiver<ScanState>,
}

impl ActiveScan {
    // A closed channel still reading `Scanning` means the task died early.
    fn state(&self) -> ScanState {
        let closed = self.state_rx.has_changed().is_err();
        let state = self.state_rx.borrow().clone();
        if closed && !state.is_finished() {
            ScanState::abandoned()
        } else {
            state
        }
    }
}

/// Runs at most one camera scan at a time as a cancellable background task.
pub struct Scanner {
    camera: Arc<dyn Camera>,
    poll_interval: Duration,
    current: Mutex<Option<ActiveScan>>,
}

impl Scanner {
    pub fn new(camera: Arc<dyn Camera>, poll_interval: Duration) -> Self {
        Scanner {
            camera,
            poll_interval,
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveScan>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts polling the camera. Fails with `Busy` while another scan runs.
    pub fn start(&self) -> Result<watch::Receiver<ScanState>, CameraError> {
        let mut current = self.lock();

        if let Some(scan) = current.as_ref() {
            if !scan.state().is_finished() {
                warn!("Rejected scan request, camera is busy");
                return Err(CameraError::Busy);
            }
        }

        let (state_tx, state_rx) = watch::channel(ScanState::Scanning);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let camera = self.camera.clone();
        let poll_interval = self.poll_interval;

        tokio::task::spawn_blocking(move || {
            let capture = AssertUnwindSafe(|| capture_until_detected(camera.as_ref(), cancel_rx, poll_interval));
            let outcome = panic::catch_unwind(capture).unwrap_or_else(|_| {
                error!("Scan task panicked");
                ScanState::abandoned()
            });
            info!("Scan finished: {:?}", outcome);
            let _ = state_tx.send(outcome);
        });

        info!("Scan started");
        *current = Some(ActiveScan {
            cancel_tx: Some(cancel_tx),
            state_rx: state_rx.clone(),
        });

        Ok(state_rx)
    }

    pub fn status(&self) -> ScanState {
        self.lock()
            .as_ref()
            .map(ActiveScan::state)
            .unwrap_or(ScanState::Idle)
    }

    /// Signals the running scan to stop. Returns false if nothing was running.
    pub fn cancel(&self) -> bool {
        let mut current = self.lock();

        let Some(scan) = current.as_mut() else {
            return false;
        };
        if scan.state().is_finished() {
            return false;
        }

        match scan.cancel_tx.take() {
            Some(cancel_tx) => {
                debug!("Cancelling scan");
                let _ = cancel_tx.send(());
                true
            }
            None => false,
        }
    }

    /// Waits until the scan behind `state_rx` reaches a final state.
    pub async fn wait(mut state_rx: watch::Receiver<ScanState>) -> ScanState {
        match state_rx.wait_for(ScanState::is_finished).await {
            Ok(state) => state.clone(),
            Err(_) => ScanState::abandoned(),
        }
    }

    /// Cancels the running scan when dropped, unless disarmed first.
    pub fn cancel_on_drop(self: &Arc<Self>) -> ScanGuard {
        ScanGuard {
            scanner: Some(self.clone()),
        }
    }
}

pub struct ScanGuard {
    scanner: Option<Arc<Scanner>>,
}

impl ScanGuard {
    pub fn disarm(mut self) {
        self.scanner = None;
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        if let Some(scanner) = self.scanner.take() {
            if scanner.cancel() {
                info!("Scan cancelled, request went away");
            }
        }
    }
}

// The frame source is dropped before returning, so the device is free by the
// time the outcome is published.
fn capture_until_detected(
    camera: &dyn Camera,
    mut cancel_rx: oneshot::Receiver<()>,
    poll_interval: Duration,
) -> ScanState {
    let mut frames = match camera.open() {
        Ok(frames) => frames,
        Err(error) => return ScanState::Failed { error },
    };

    loop {
        if !matches!(cancel_rx.try_recv(), Err(TryRecvError::Empty)) {
            return ScanState::Cancelled;
        }

        let frame = match frames.read_frame() {
            Ok(frame) => frame,
            Err(error) => return ScanState::Failed { error },
        };

        if let Some(qr_data) = qr::decode(&frame) {
            return ScanState::Detected { qr_data };
        }

        thread::sleep(poll_interval);
    }
}
