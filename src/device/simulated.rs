use super::interface::{
    completion_channel, ActiveRecording, CameraProvider, CaptureDevice, CompletionSender,
    LensFacing, OutputTarget, RecordingFailure, RecordingHandle, Rotation, SavedRecording,
    UseCaseConfig,
};
use crate::aspect::AspectRatio;
use crate::error::{ReccamError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Placeholder written in place of encoded video
const PLACEHOLDER_CONTENT: &[u8] = b"reccam simulated recording\n";

/// Observable state of the simulated hardware
#[derive(Debug, Clone, Default)]
pub struct SimulatedState {
    pub bound: Option<UseCaseConfig>,
    pub torch: bool,
    pub rotation: Rotation,
    pub recordings_started: u64,
    pub recordings_finalized: u64,
    pub fail_next_recording: Option<String>,
}

/// Sidecar written next to a saved recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub location: PathBuf,
    pub mime_type: String,
    pub lens: LensFacing,
    pub aspect_ratio: AspectRatio,
    pub rotation: Rotation,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
}

/// Camera provider backed by files on disk instead of hardware
pub struct SimulatedCameraProvider {
    has_back: bool,
    has_front: bool,
    save_metadata: bool,
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedCameraProvider {
    pub fn new(has_back: bool, has_front: bool) -> Self {
        Self {
            has_back,
            has_front,
            save_metadata: false,
            state: Arc::new(Mutex::new(SimulatedState::default())),
        }
    }

    pub fn with_metadata(mut self, save_metadata: bool) -> Self {
        self.save_metadata = save_metadata;
        self
    }

    /// Snapshot of the simulated hardware state
    pub fn state(&self) -> SimulatedState {
        self.state.lock().clone()
    }

    /// Make the next recording fail after it has started
    pub fn fail_next_recording<S: Into<String>>(&self, message: S) {
        self.state.lock().fail_next_recording = Some(message.into());
    }
}

#[async_trait]
impl CameraProvider for SimulatedCameraProvider {
    async fn has_camera(&self, lens: LensFacing) -> Result<bool> {
        Ok(match lens {
            LensFacing::Back => self.has_back,
            LensFacing::Front => self.has_front,
        })
    }

    async fn bind(&self, use_cases: UseCaseConfig) -> Result<Arc<dyn CaptureDevice>> {
        if !self.has_camera(use_cases.lens).await? {
            return Err(ReccamError::component(
                "simulated_camera".to_string(),
                format!("No {:?} camera to bind", use_cases.lens),
            ));
        }

        {
            let mut state = self.state.lock();
            state.bound = Some(use_cases);
            state.rotation = use_cases.rotation;
        }

        info!(
            "Bound simulated {:?} camera ({}, {} degrees)",
            use_cases.lens,
            use_cases.aspect_ratio,
            use_cases.rotation.degrees()
        );

        Ok(Arc::new(SimulatedCaptureDevice {
            use_cases,
            save_metadata: self.save_metadata,
            state: Arc::clone(&self.state),
        }))
    }

    async fn unbind_all(&self) {
        let mut state = self.state.lock();
        if state.bound.take().is_some() {
            debug!("Unbound simulated camera use cases");
        }
        state.torch = false;
    }
}

/// Capture device produced by [`SimulatedCameraProvider::bind`]
pub struct SimulatedCaptureDevice {
    use_cases: UseCaseConfig,
    save_metadata: bool,
    state: Arc<Mutex<SimulatedState>>,
}

impl CaptureDevice for SimulatedCaptureDevice {
    fn start_recording(&self, target: OutputTarget) -> Result<ActiveRecording> {
        let (sender, completion) = completion_channel();

        let failure = {
            let mut state = self.state.lock();
            if state.bound.is_none() {
                return Err(ReccamError::DeviceUnavailable);
            }
            state.recordings_started += 1;
            state.fail_next_recording.take()
        };

        debug!("Simulated recording started: {}", target.path.display());

        if let Some(message) = failure {
            warn!("Simulated recording will fail: {}", message);
            sender.complete(Err(RecordingFailure::new(1, message)));
            return Ok(ActiveRecording {
                handle: Box::new(FailedRecording),
                completion,
            });
        }

        let rotation = self.state.lock().rotation;
        let handle = SimulatedRecording {
            target,
            use_cases: UseCaseConfig {
                rotation,
                ..self.use_cases
            },
            save_metadata: self.save_metadata,
            started_at: Utc::now(),
            sender: Some(sender),
            state: Arc::clone(&self.state),
        };

        Ok(ActiveRecording {
            handle: Box::new(handle),
            completion,
        })
    }

    fn enable_torch(&self, enabled: bool) -> Result<()> {
        self.state.lock().torch = enabled;
        debug!("Simulated torch {}", if enabled { "on" } else { "off" });
        Ok(())
    }

    fn set_target_rotation(&self, rotation: Rotation) {
        self.state.lock().rotation = rotation;
    }
}

struct FailedRecording;

impl RecordingHandle for FailedRecording {
    fn stop(&mut self) {}
}

struct SimulatedRecording {
    target: OutputTarget,
    use_cases: UseCaseConfig,
    save_metadata: bool,
    started_at: DateTime<Utc>,
    sender: Option<CompletionSender>,
    state: Arc<Mutex<SimulatedState>>,
}

impl RecordingHandle for SimulatedRecording {
    fn stop(&mut self) {
        let Some(sender) = self.sender.take() else {
            debug!("Simulated recording already finalizing");
            return;
        };

        let metadata = RecordingMetadata {
            location: self.target.path.clone(),
            mime_type: self.target.mime_type.clone(),
            lens: self.use_cases.lens,
            aspect_ratio: self.use_cases.aspect_ratio,
            rotation: self.use_cases.rotation,
            started_at: self.started_at,
            stopped_at: Utc::now(),
        };
        let save_metadata = self.save_metadata;
        let state = Arc::clone(&self.state);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    let result = finalize(&metadata, save_metadata).await;
                    if result.is_ok() {
                        state.lock().recordings_finalized += 1;
                    }
                    sender.complete(result);
                });
            }
            Err(e) => {
                error!("No runtime available to finalize recording: {}", e);
                sender.complete(Err(RecordingFailure::new(
                    2,
                    "No runtime available to finalize recording",
                )));
            }
        }
    }
}

async fn finalize(
    metadata: &RecordingMetadata,
    save_metadata: bool,
) -> std::result::Result<SavedRecording, RecordingFailure> {
    write_outputs(metadata, save_metadata).await.map_err(|e| {
        error!(
            "Failed to write recording {}: {}",
            metadata.location.display(),
            e
        );
        RecordingFailure::new(3, format!("Failed to write recording: {}", e))
    })?;

    info!("Simulated recording saved: {}", metadata.location.display());
    Ok(SavedRecording {
        location: metadata.location.clone(),
    })
}

async fn write_outputs(metadata: &RecordingMetadata, save_metadata: bool) -> Result<()> {
    if let Some(parent) = metadata.location.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&metadata.location, PLACEHOLDER_CONTENT).await?;

    if save_metadata {
        let sidecar = metadata_path(&metadata.location);
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(&sidecar, json).await?;
        debug!("Saved metadata to {}", sidecar.display());
    }

    Ok(())
}

/// Sidecar path for a recording: `clip.mp4` -> `clip.mp4.json`
pub fn metadata_path(location: &Path) -> PathBuf {
    let mut name = location.as_os_str().to_os_string();
    name.push(".json");
    PathBuf::from(name)
}
