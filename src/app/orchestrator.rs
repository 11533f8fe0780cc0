use super::types::{ComponentState, ShutdownReason};
use crate::config::ReccamConfig;
use crate::device::{CameraProvider, SimulatedCameraProvider};
use crate::error::Result;
use crate::events::EventBus;
use crate::keyboard_input::KeyboardInputHandler;
use crate::screen::{HostKeyEvents, ScreenHandle, ScreenRuntime, StaticPermissions};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const HOST_KEY_CAPACITY: usize = 16;

/// Wires the capture screen, the simulated camera and the keyboard together
pub struct ReccamOrchestrator {
    pub(super) config: ReccamConfig,
    pub(super) event_bus: EventBus,
    pub(super) provider: Arc<SimulatedCameraProvider>,
    pub(super) key_events: HostKeyEvents,

    // Components
    pub(super) screen_runtime: Option<ScreenRuntime>,
    pub(super) screen_handle: ScreenHandle,
    pub(super) screen_task: Option<JoinHandle<Result<()>>>,
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) keyboard_enabled: bool,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl ReccamOrchestrator {
    /// Create a new orchestrator with the given configuration
    pub async fn new(config: ReccamConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = if config.system.debug_events {
            EventBus::with_debug_logging(config.system.event_bus_capacity)
        } else {
            EventBus::new(config.system.event_bus_capacity)
        };
        let key_events = HostKeyEvents::new(HOST_KEY_CAPACITY);
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let provider = Arc::new(
            SimulatedCameraProvider::new(config.camera.has_back, config.camera.has_front)
                .with_metadata(config.recording.save_metadata),
        );

        let (screen_runtime, screen_handle) = ScreenRuntime::new(
            config.clone(),
            Arc::clone(&provider) as Arc<dyn CameraProvider>,
            event_bus.clone(),
            Box::new(StaticPermissions(true)),
            key_events.clone(),
        );

        let keyboard_handler = Some(KeyboardInputHandler::new(
            screen_handle.clone(),
            key_events.clone(),
            event_bus.clone(),
            config.camera.display_id,
        ));

        Ok(Self {
            config,
            event_bus,
            provider,
            key_events,
            screen_runtime: Some(screen_runtime),
            screen_handle,
            screen_task: None,
            keyboard_handler,
            keyboard_enabled: false, // Needs a terminal, enable via set_keyboard_enabled()
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Enable or disable the keyboard input handler
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    pub fn event_bus(&self) -> EventBus {
        self.event_bus.clone()
    }

    pub fn screen_handle(&self) -> ScreenHandle {
        self.screen_handle.clone()
    }

    pub fn key_events(&self) -> HostKeyEvents {
        self.key_events.clone()
    }

    pub fn provider(&self) -> Arc<SimulatedCameraProvider> {
        Arc::clone(&self.provider)
    }

    pub fn config(&self) -> &ReccamConfig {
        &self.config
    }
}
