use super::capabilities::ScreenCapabilities;
use super::helper::PermissionGate;
use super::keys::{HostKey, HostKeyEvents};
use super::resources::ScreenResources;
use super::video::{PendingRecording, VideoScreen};
use crate::config::ReccamConfig;
use crate::device::{CameraProvider, RecordingResult, Rotation};
use crate::error::{ReccamError, Result};
use crate::events::{EventBus, ReccamEvent};
use crate::gesture::TouchEvent;
use crate::session::{RecordingId, TickId, TokioScheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const COMMAND_CAPACITY: usize = 32;

/// How long screen exit waits for recordings to finish writing
pub const FINALIZE_TIMEOUT: Duration = Duration::from_secs(3);

/// User interactions delivered to a running screen
#[derive(Debug, Clone)]
pub enum ScreenCommand {
    CaptureButton,
    SwitchCamera,
    ShowFlashOptions,
    SelectFlash(bool),
    ShowGallery,
    Touch(TouchEvent),
    DisplayChanged { display_id: u32, rotation: Rotation },
    Resume,
    Exit,
}

/// Sending side for [`ScreenCommand`]s
#[derive(Clone)]
pub struct ScreenHandle {
    commands: mpsc::Sender<ScreenCommand>,
}

impl ScreenHandle {
    pub async fn send(&self, command: ScreenCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ReccamError::system("Screen is no longer running"))
    }

    /// Send from a thread outside the async runtime
    pub fn blocking_send(&self, command: ScreenCommand) -> Result<()> {
        self.commands
            .blocking_send(command)
            .map_err(|_| ReccamError::system("Screen is no longer running"))
    }
}

type Finished = (RecordingId, RecordingResult);

/// Event loop for one video screen.
///
/// Ticks, commands, key presses and device completions are handled one at
/// a time on a single task, so a tick never overlaps a toggle.
pub struct ScreenRuntime {
    screen: VideoScreen,
    ticks: mpsc::UnboundedReceiver<TickId>,
    commands: mpsc::Receiver<ScreenCommand>,
    key_events: HostKeyEvents,
    display_id: u32,
}

impl ScreenRuntime {
    pub fn new(
        config: ReccamConfig,
        provider: Arc<dyn CameraProvider>,
        event_bus: EventBus,
        permissions: Box<dyn PermissionGate>,
        key_events: HostKeyEvents,
    ) -> (Self, ScreenHandle) {
        let (scheduler, ticks) = TokioScheduler::new();
        let (command_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let display_id = config.camera.display_id;
        let screen = VideoScreen::new(config, provider, event_bus, permissions, scheduler);

        (
            Self {
                screen,
                ticks,
                commands,
                key_events,
                display_id,
            },
            ScreenHandle {
                commands: command_tx,
            },
        )
    }

    /// Enter the screen, process events until exit, then release everything
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        let mut resources = ScreenResources::acquire(&self.key_events);
        let (finished_tx, mut finished_rx) = mpsc::unbounded_channel::<Finished>();

        self.enter().await;

        loop {
            resources.reap();

            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Screen shutdown requested");
                    break;
                }
                command = self.commands.recv() => match command {
                    None | Some(ScreenCommand::Exit) => break,
                    Some(command) => {
                        self.handle_command(command, &mut resources, &finished_tx).await;
                    }
                },
                Some(tick) = self.ticks.recv() => {
                    self.screen.on_tick(tick);
                }
                Some(key) = next_key(&mut resources) => {
                    let pending = self.screen.on_key(key);
                    self.track(pending, &mut resources, &finished_tx);
                }
                Some((recording_id, result)) = finished_rx.recv() => {
                    self.screen.on_recording_finished(recording_id, result);
                }
            }
        }

        self.screen.leave().await;

        // Stopped recordings are still being written; let them land
        if !resources.settle(FINALIZE_TIMEOUT).await {
            warn!("Recordings not finalized within {:?}", FINALIZE_TIMEOUT);
        }
        while let Ok((recording_id, result)) = finished_rx.try_recv() {
            self.screen.on_recording_finished(recording_id, result);
        }

        drop(resources);
        info!("Screen runtime exited");
        Ok(())
    }

    async fn enter(&mut self) {
        self.screen.resume();
        self.screen.attach(self.display_id, Rotation::Rotate0);

        if let Err(e) = self.screen.update_camera_ui().await {
            warn!("Failed to update camera UI: {}", e);
        }

        if let Err(e) = self.screen.set_up_camera().await {
            error!("Camera setup failed: {}", e);
            self.screen.helper().publish(ReccamEvent::SystemError {
                component: "camera".to_string(),
                error: e.to_string(),
            });
        }
    }

    async fn handle_command(
        &mut self,
        command: ScreenCommand,
        resources: &mut ScreenResources,
        finished_tx: &mpsc::UnboundedSender<Finished>,
    ) {
        debug!("Screen command: {:?}", command);

        let result = match command {
            ScreenCommand::CaptureButton => {
                let pending = self.screen.record_video();
                self.track(pending, resources, finished_tx);
                Ok(())
            }
            ScreenCommand::SwitchCamera => self.screen.switch_camera().await.map(|_| ()),
            ScreenCommand::ShowFlashOptions => {
                self.screen.show_flash_options();
                Ok(())
            }
            ScreenCommand::SelectFlash(active) => self.screen.close_flash_options_and_select(active),
            ScreenCommand::ShowGallery => self.screen.show_gallery().await.map(|_| ()),
            ScreenCommand::Touch(event) => {
                self.screen.on_touch(event);
                Ok(())
            }
            ScreenCommand::DisplayChanged {
                display_id,
                rotation,
            } => {
                self.screen.on_display_changed(display_id, rotation);
                Ok(())
            }
            ScreenCommand::Resume => {
                self.screen.resume();
                Ok(())
            }
            ScreenCommand::Exit => Ok(()),
        };

        if let Err(e) = result {
            self.report(e);
        }
    }

    /// Forward a started recording's completion into the event loop
    fn track(
        &mut self,
        pending: Result<Option<PendingRecording>>,
        resources: &mut ScreenResources,
        finished_tx: &mpsc::UnboundedSender<Finished>,
    ) {
        match pending {
            Ok(Some(PendingRecording {
                recording_id,
                completion,
            })) => {
                let finished_tx = finished_tx.clone();
                resources.spawn(async move {
                    let result = completion.await;
                    if finished_tx.send((recording_id, result)).is_err() {
                        debug!("Screen gone before recording {} finished", recording_id);
                    }
                });
            }
            Ok(None) => {}
            Err(e) => self.report(e),
        }
    }

    fn report(&self, e: ReccamError) {
        match e {
            ReccamError::DeviceUnavailable => {
                warn!("Capture device unavailable");
                self.screen.helper().publish(ReccamEvent::UserMessage {
                    message: "Camera is not ready".to_string(),
                });
            }
            e => {
                error!("Screen operation failed: {}", e);
                self.screen.helper().publish(ReccamEvent::SystemError {
                    component: "video_screen".to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}

async fn next_key(resources: &mut ScreenResources) -> Option<HostKey> {
    match resources.keys_mut() {
        Some(keys) => keys.recv().await,
        None => std::future::pending().await,
    }
}
