use crate::aspect::AspectRatio;
use crate::error::{ReccamError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Which physical lens a capture device uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LensFacing {
    Back,
    Front,
}

impl LensFacing {
    pub fn opposite(self) -> Self {
        match self {
            LensFacing::Back => LensFacing::Front,
            LensFacing::Front => LensFacing::Back,
        }
    }
}

/// Target rotation applied to preview and capture output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Rotation {
    #[default]
    Rotate0,
    /// Rotate 90 degrees clockwise
    Rotate90,
    Rotate180,
    /// Rotate 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl Rotation {
    /// Get rotation angle in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Rotation::Rotate0),
            90 => Some(Rotation::Rotate90),
            180 => Some(Rotation::Rotate180),
            270 => Some(Rotation::Rotate270),
            _ => None,
        }
    }
}

/// Where a recording should be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub mime_type: String,
}

impl OutputTarget {
    pub fn video<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            mime_type: "video/mp4".to_string(),
        }
    }
}

/// A finalized recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecording {
    pub location: PathBuf,
}

/// Failure reported by the device after a recording was started
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct RecordingFailure {
    pub code: i32,
    pub message: String,
}

impl RecordingFailure {
    pub fn new<S: Into<String>>(code: i32, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<RecordingFailure> for ReccamError {
    fn from(failure: RecordingFailure) -> Self {
        ReccamError::RecordingFailed {
            message: failure.message,
        }
    }
}

pub type RecordingResult = std::result::Result<SavedRecording, RecordingFailure>;

/// Device side of a recording's completion channel
pub struct CompletionSender {
    sender: oneshot::Sender<RecordingResult>,
}

impl CompletionSender {
    /// Report the terminal result. Later reports are impossible by construction.
    pub fn complete(self, result: RecordingResult) {
        if self.sender.send(result).is_err() {
            debug!("Recording completion dropped: nobody is waiting for the result");
        }
    }
}

/// Caller side of a recording's completion channel; resolves exactly once
pub struct RecordingCompletion {
    receiver: oneshot::Receiver<RecordingResult>,
}

/// Create the single completion channel for one recording
pub fn completion_channel() -> (CompletionSender, RecordingCompletion) {
    let (sender, receiver) = oneshot::channel();
    (CompletionSender { sender }, RecordingCompletion { receiver })
}

impl std::fmt::Debug for RecordingCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingCompletion").finish_non_exhaustive()
    }
}

impl Future for RecordingCompletion {
    type Output = RecordingResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|result| {
            result.unwrap_or_else(|_| {
                Err(RecordingFailure::new(
                    -1,
                    "Device released the recording without a result",
                ))
            })
        })
    }
}

/// A live recording that can be asked to finalize
pub trait RecordingHandle: Send + Sync {
    /// Request finalization; the outcome arrives on the completion channel
    fn stop(&mut self);
}

/// Result of a successful `start_recording`
pub struct ActiveRecording {
    pub handle: Box<dyn RecordingHandle>,
    pub completion: RecordingCompletion,
}

/// Camera hardware abstraction bound to one lens
pub trait CaptureDevice: Send + Sync {
    /// Begin recording towards `target`
    fn start_recording(&self, target: OutputTarget) -> Result<ActiveRecording>;

    /// Turn the torch on or off
    fn enable_torch(&self, enabled: bool) -> Result<()>;

    /// Update the target rotation of preview and capture
    fn set_target_rotation(&self, rotation: Rotation);
}

/// Use cases requested when binding a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseCaseConfig {
    pub lens: LensFacing,
    pub aspect_ratio: AspectRatio,
    pub rotation: Rotation,
}

/// Process-level camera provider
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Whether a lens is present
    async fn has_camera(&self, lens: LensFacing) -> Result<bool>;

    /// Bind preview and video capture for a lens, replacing previous bindings
    async fn bind(&self, use_cases: UseCaseConfig) -> Result<Arc<dyn CaptureDevice>>;

    /// Release every bound use case
    async fn unbind_all(&self);
}

/// Choose the lens to open: the preferred one when present, otherwise the other
pub async fn select_lens(
    provider: &dyn CameraProvider,
    preferred: LensFacing,
) -> Result<LensFacing> {
    if provider.has_camera(preferred).await? {
        return Ok(preferred);
    }

    let fallback = preferred.opposite();
    if provider.has_camera(fallback).await? {
        info!("{:?} camera unavailable, using {:?}", preferred, fallback);
        return Ok(fallback);
    }

    Err(ReccamError::NoCameraAvailable)
}

/// Whether switching lenses makes sense; lookup failures disable the switch
pub async fn can_switch_lens(provider: &dyn CameraProvider) -> bool {
    let back = provider.has_camera(LensFacing::Back).await;
    let front = provider.has_camera(LensFacing::Front).await;
    match (back, front) {
        (Ok(back), Ok(front)) => back && front,
        (Err(e), _) | (_, Err(e)) => {
            warn!("Camera info unavailable: {}", e);
            false
        }
    }
}
