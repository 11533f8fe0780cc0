use crate::aspect::AspectRatio;
use crate::device::{LensFacing, Rotation};
use crate::error::EventBusError;
use crate::screen::Destination;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events emitted by the capture screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ReccamEvent {
    /// A recording was started towards the given output location
    RecordingStarted { recording_id: u64, location: PathBuf },
    /// The user stopped the active recording
    RecordingStopped { recording_id: u64 },
    /// The device finished writing a recording
    VideoSaved { recording_id: u64, location: PathBuf },
    /// The device abandoned a recording
    RecordingFailed { recording_id: u64, message: String },
    /// Elapsed-time readout changed
    TimerUpdated { elapsed_seconds: u64, formatted: String },
    /// Timer element should be shown or hidden
    TimerVisibility { visible: bool },
    /// Gallery thumbnail should show a new media file
    ThumbnailUpdated { location: PathBuf },
    /// Camera use cases were bound
    CameraBound {
        lens: LensFacing,
        aspect_ratio: AspectRatio,
        rotation: Rotation,
    },
    /// Lens switch control enabled state changed
    CameraSwitchEnabled { enabled: bool },
    /// Target rotation followed a display rotation
    RotationChanged { display_id: u32, rotation: Rotation },
    /// Torch was toggled
    TorchChanged { enabled: bool },
    /// Flash options panel visibility
    FlashOptionsVisible { visible: bool },
    /// The screen asks the host to navigate elsewhere
    NavigationRequested { destination: Destination },
    /// User-visible message
    UserMessage { message: String },
    /// A component reported an error
    SystemError { component: String, error: String },
    /// Shutdown requested
    ShutdownRequested { reason: String },
}

impl ReccamEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            ReccamEvent::RecordingStarted {
                recording_id,
                location,
            } => format!(
                "Recording {} started -> {}",
                recording_id,
                location.display()
            ),
            ReccamEvent::RecordingStopped { recording_id } => {
                format!("Recording {} stopped", recording_id)
            }
            ReccamEvent::VideoSaved {
                recording_id,
                location,
            } => format!("Recording {} saved to {}", recording_id, location.display()),
            ReccamEvent::RecordingFailed {
                recording_id,
                message,
            } => format!("Recording {} failed: {}", recording_id, message),
            ReccamEvent::TimerUpdated { formatted, .. } => format!("Timer {}", formatted),
            ReccamEvent::TimerVisibility { visible } => {
                format!("Timer {}", if *visible { "shown" } else { "hidden" })
            }
            ReccamEvent::ThumbnailUpdated { location } => {
                format!("Thumbnail {}", location.display())
            }
            ReccamEvent::CameraBound {
                lens,
                aspect_ratio,
                rotation,
            } => format!(
                "Camera bound: {:?} lens, {} at {} degrees",
                lens,
                aspect_ratio,
                rotation.degrees()
            ),
            ReccamEvent::CameraSwitchEnabled { enabled } => {
                format!("Camera switch {}", if *enabled { "enabled" } else { "disabled" })
            }
            ReccamEvent::RotationChanged {
                display_id,
                rotation,
            } => format!(
                "Display {} rotated to {} degrees",
                display_id,
                rotation.degrees()
            ),
            ReccamEvent::TorchChanged { enabled } => {
                format!("Torch {}", if *enabled { "on" } else { "off" })
            }
            ReccamEvent::FlashOptionsVisible { visible } => {
                format!("Flash options {}", if *visible { "shown" } else { "hidden" })
            }
            ReccamEvent::NavigationRequested { destination } => {
                format!("Navigate to {:?}", destination)
            }
            ReccamEvent::UserMessage { message } => message.clone(),
            ReccamEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
            ReccamEvent::ShutdownRequested { reason } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            ReccamEvent::RecordingStarted { .. } => "recording_started",
            ReccamEvent::RecordingStopped { .. } => "recording_stopped",
            ReccamEvent::VideoSaved { .. } => "video_saved",
            ReccamEvent::RecordingFailed { .. } => "recording_failed",
            ReccamEvent::TimerUpdated { .. } => "timer_updated",
            ReccamEvent::TimerVisibility { .. } => "timer_visibility",
            ReccamEvent::ThumbnailUpdated { .. } => "thumbnail_updated",
            ReccamEvent::CameraBound { .. } => "camera_bound",
            ReccamEvent::CameraSwitchEnabled { .. } => "camera_switch_enabled",
            ReccamEvent::RotationChanged { .. } => "rotation_changed",
            ReccamEvent::TorchChanged { .. } => "torch_changed",
            ReccamEvent::FlashOptionsVisible { .. } => "flash_options_visible",
            ReccamEvent::NavigationRequested { .. } => "navigation_requested",
            ReccamEvent::UserMessage { .. } => "user_message",
            ReccamEvent::SystemError { .. } => "system_error",
            ReccamEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Event bus for screen coordination using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ReccamEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: true,
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<ReccamEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: ReccamEvent) -> Result<usize, EventBusError> {
        match &event {
            ReccamEvent::RecordingStarted { .. }
            | ReccamEvent::RecordingStopped { .. }
            | ReccamEvent::VideoSaved { .. }
            | ReccamEvent::ShutdownRequested { .. } => {
                info!("{}", event.description());
            }
            ReccamEvent::RecordingFailed { .. } => {
                warn!("{}", event.description());
            }
            ReccamEvent::SystemError { component, error } => {
                error!("System error in {}: {}", component, error);
            }
            _ => {
                if self.debug_logging {
                    debug!("Event: {}", event.description());
                }
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Whether routine events are logged at debug level
    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Accept everything except the listed event types
    Excluding(Vec<&'static str>),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &ReccamEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Excluding(types) => !types.contains(&event.event_type()),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<ReccamEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(
        receiver: broadcast::Receiver<ReccamEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<ReccamEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}
