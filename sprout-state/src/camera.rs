//! Capture lock and the last captured photo

use serde::Serialize;
use sprout_api::CapturedPhoto;

/// Whether a capture request is outstanding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum CameraState {
    #[default]
    Idle,
    Busy,
}

/// Exclusive capture lock
///
/// `Busy` rejects further requests; nothing is queued. The lock is released
/// only by [`Camera::finish_success`] or [`Camera::finish_failure`].
#[derive(Debug, Clone, Default)]
pub struct Camera {
    state: CameraState,
    last_photo: Option<CapturedPhoto>,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn last_photo(&self) -> Option<&CapturedPhoto> {
        self.last_photo.as_ref()
    }

    /// Take the lock. Returns false if a capture is already running.
    pub fn try_begin(&mut self) -> bool {
        if self.state == CameraState::Busy {
            return false;
        }
        self.state = CameraState::Busy;
        true
    }

    /// Store the photo and release the lock
    pub fn finish_success(&mut self, photo: CapturedPhoto) {
        self.last_photo = Some(photo);
        self.state = CameraState::Idle;
    }

    /// Release the lock; the previous photo is kept
    pub fn finish_failure(&mut self) {
        self.state = CameraState::Idle;
    }
}
