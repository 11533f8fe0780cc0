use super::capabilities::ScreenCapabilities;
use super::helper::{Destination, PermissionGate, ScreenHelper};
use super::keys::HostKey;
use crate::aspect::AspectRatio;
use crate::config::ReccamConfig;
use crate::device::{
    can_switch_lens, select_lens, CameraProvider, CaptureDevice, LensFacing, OutputTarget,
    RecordingCompletion, RecordingResult, Rotation, UseCaseConfig,
};
use crate::error::Result;
use crate::events::{EventBus, ReccamEvent};
use crate::gesture::TouchEvent;
use crate::media::{self, VIDEO_EXTENSION};
use crate::session::{
    EventBusDisplay, RecordingId, RecordingOutcome, RecordingSession, TickId, TokioScheduler,
};
use async_trait::async_trait;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Message shown when the device abandons a recording
pub const RECORD_FAILED_MESSAGE: &str = "Video record failed";

/// A recording whose outcome the screen still waits for
#[derive(Debug)]
pub struct PendingRecording {
    pub recording_id: RecordingId,
    pub completion: RecordingCompletion,
}

/// Video capture screen: one lens, one recording session
pub struct VideoScreen {
    config: ReccamConfig,
    provider: Arc<dyn CameraProvider>,
    device: Option<Arc<dyn CaptureDevice>>,
    lens: LensFacing,
    timezone: Tz,
    helper: ScreenHelper,
    session: RecordingSession<TokioScheduler, EventBusDisplay>,
    torch: bool,
    switch_enabled: bool,
}

impl VideoScreen {
    pub fn new(
        config: ReccamConfig,
        provider: Arc<dyn CameraProvider>,
        event_bus: EventBus,
        permissions: Box<dyn PermissionGate>,
        scheduler: TokioScheduler,
    ) -> Self {
        let helper = ScreenHelper::new(
            event_bus.clone(),
            permissions,
            PathBuf::from(&config.recording.output_path),
        );
        let session = RecordingSession::new(
            scheduler,
            EventBusDisplay::new(event_bus),
            config.recording.tick_interval(),
        );

        Self {
            lens: config.camera.lens,
            timezone: media::resolve_timezone(&config.recording.timezone),
            config,
            provider,
            device: None,
            helper,
            session,
            torch: false,
            switch_enabled: false,
        }
    }

    pub fn session(&self) -> &RecordingSession<TokioScheduler, EventBusDisplay> {
        &self.session
    }

    pub fn helper(&self) -> &ScreenHelper {
        &self.helper
    }

    pub fn lens(&self) -> LensFacing {
        self.lens
    }

    pub fn torch(&self) -> bool {
        self.torch
    }

    pub fn switch_enabled(&self) -> bool {
        self.switch_enabled
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    /// Screen resumed: verify permissions
    pub fn resume(&self) -> bool {
        self.helper.check_permissions()
    }

    /// Viewfinder laid out on `display_id`
    pub fn attach(&mut self, display_id: u32, rotation: Rotation) {
        self.helper.attach_display(display_id, rotation);
    }

    /// Capture button: start a recording or stop the active one
    pub fn record_video(&mut self) -> Result<Option<PendingRecording>> {
        let path = media::create_file(self.helper.output_dir(), &self.timezone, VIDEO_EXTENSION);
        let target = OutputTarget::video(path.clone());

        match self.session.toggle(self.device.as_deref(), target)? {
            RecordingOutcome::Started {
                recording_id,
                completion,
            } => {
                self.helper.publish(ReccamEvent::RecordingStarted {
                    recording_id: recording_id.0,
                    location: path,
                });
                Ok(Some(PendingRecording {
                    recording_id,
                    completion,
                }))
            }
            RecordingOutcome::Stopped { recording_id } => {
                self.helper.publish(ReccamEvent::RecordingStopped {
                    recording_id: recording_id.0,
                });
                Ok(None)
            }
        }
    }

    /// Device reported the end of a recording
    pub fn on_recording_finished(&mut self, recording_id: RecordingId, result: RecordingResult) {
        if self.session.on_device_finished(recording_id, &result) {
            debug!("Session reset by device for recording {}", recording_id);
        }

        match result {
            Ok(saved) => {
                self.helper.publish(ReccamEvent::VideoSaved {
                    recording_id: recording_id.0,
                    location: saved.location.clone(),
                });
                self.helper.set_gallery_thumbnail(saved.location);
            }
            Err(failure) => {
                self.helper.publish(ReccamEvent::RecordingFailed {
                    recording_id: recording_id.0,
                    message: failure.message,
                });
                self.helper.publish(ReccamEvent::UserMessage {
                    message: RECORD_FAILED_MESSAGE.to_string(),
                });
            }
        }
    }

    /// Periodic tick from the session's scheduler
    pub fn on_tick(&mut self, tick: TickId) -> bool {
        self.session.on_scheduled_tick(tick)
    }

    /// Host key press; volume down acts as the capture button
    pub fn on_key(&mut self, key: HostKey) -> Result<Option<PendingRecording>> {
        match key {
            HostKey::VolumeDown => {
                debug!("Volume down pressed, clicking capture button");
                self.record_video()
            }
            HostKey::VolumeUp => Ok(None),
        }
    }

    /// Viewfinder touch; a left swipe navigates to the photo screen
    pub fn on_touch(&mut self, event: TouchEvent) -> Option<Destination> {
        self.helper.on_touch(event, Destination::Photo)
    }

    /// Display rotation; retargets preview and capture on the attached display
    pub fn on_display_changed(&mut self, display_id: u32, rotation: Rotation) {
        if let Some(rotation) = self.helper.on_display_changed(display_id, rotation) {
            if let Some(device) = &self.device {
                device.set_target_rotation(rotation);
            }
        }
    }

    /// Flip between back and front lens
    pub async fn switch_camera(&mut self) -> Result<bool> {
        if self.session.is_recording() {
            warn!("Lens switch ignored while recording");
            return Ok(false);
        }

        self.lens = self.lens.opposite();
        info!("Switching to {:?} camera", self.lens);
        self.bind_camera_use_cases().await?;
        Ok(true)
    }

    pub fn show_flash_options(&self) {
        self.helper
            .publish(ReccamEvent::FlashOptionsVisible { visible: true });
    }

    /// Close the flash panel and apply the torch choice
    pub fn close_flash_options_and_select(&mut self, active: bool) -> Result<()> {
        if let Some(device) = &self.device {
            device.enable_torch(active)?;
        }
        self.torch = active;
        self.helper
            .publish(ReccamEvent::FlashOptionsVisible { visible: false });
        self.helper
            .publish(ReccamEvent::TorchChanged { enabled: active });
        Ok(())
    }

    /// Navigate to the gallery when there is something to show
    pub async fn show_gallery(&self) -> Result<bool> {
        self.helper.show_gallery().await
    }

    /// Screen exit: finish any recording and release the camera
    pub async fn leave(&mut self) {
        if let Some(recording_id) = self.session.stop() {
            self.helper.publish(ReccamEvent::RecordingStopped {
                recording_id: recording_id.0,
            });
        }
        self.provider.unbind_all().await;
        self.device = None;
        info!("Video screen left");
    }

    fn set_switch_enabled(&mut self, enabled: bool) {
        self.switch_enabled = enabled;
        self.helper
            .publish(ReccamEvent::CameraSwitchEnabled { enabled });
    }
}

#[async_trait]
impl ScreenCapabilities for VideoScreen {
    async fn update_camera_ui(&mut self) -> Result<()> {
        if let Err(e) = self.helper.refresh_thumbnail().await {
            warn!("Failed to load gallery thumbnail: {}", e);
        }
        // Re-enabled once the camera reports both lenses
        self.set_switch_enabled(false);
        Ok(())
    }

    async fn set_up_camera(&mut self) -> Result<()> {
        self.lens = select_lens(self.provider.as_ref(), self.config.camera.lens).await?;
        let enabled = can_switch_lens(self.provider.as_ref()).await;
        self.set_switch_enabled(enabled);
        self.bind_camera_use_cases().await
    }

    async fn bind_camera_use_cases(&mut self) -> Result<()> {
        let (width, height) = self.config.camera.viewport;
        let use_cases = UseCaseConfig {
            lens: self.lens,
            aspect_ratio: AspectRatio::select(width, height)?,
            rotation: self.helper.rotation(),
        };

        self.provider.unbind_all().await;
        self.device = None;

        match self.provider.bind(use_cases).await {
            Ok(device) => {
                if self.torch {
                    device.enable_torch(true)?;
                }
                self.device = Some(device);
                self.helper.publish(ReccamEvent::CameraBound {
                    lens: use_cases.lens,
                    aspect_ratio: use_cases.aspect_ratio,
                    rotation: use_cases.rotation,
                });
                Ok(())
            }
            Err(e) => {
                error!("Use case binding failed: {}", e);
                Err(e)
            }
        }
    }
}
