use super::{ComponentState, ReccamOrchestrator};
use crate::error::{ReccamError, Result};
use crate::events::ReccamEvent;
use tracing::{error, info, warn};

impl ReccamOrchestrator {
    /// Register all system components
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing reccam components");

        let mut states = self.component_states.lock().await;
        states.insert("screen".to_string(), ComponentState::Stopped);

        // Only register keyboard component if enabled
        if self.keyboard_enabled {
            states.insert("keyboard".to_string(), ComponentState::Stopped);
        }

        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start all system components
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting reccam");

        tokio::fs::create_dir_all(&self.config.recording.output_path)
            .await
            .map_err(|e| {
                error!(
                    "Failed to create output directory {}: {}",
                    self.config.recording.output_path, e
                );
                e
            })?;

        self.set_component_state("screen", ComponentState::Starting)
            .await;

        let runtime = self.screen_runtime.take().ok_or_else(|| {
            ReccamError::component("screen", "Screen runtime already started")
        })?;
        let token = self.cancellation_token.child_token();
        let event_bus = self.event_bus.clone();

        self.screen_task = Some(tokio::spawn(async move {
            let result = runtime.run(token.clone()).await;

            // The screen left on its own; bring the rest of the app down with it
            if !token.is_cancelled() {
                let reason = match &result {
                    Ok(()) => "Screen exited".to_string(),
                    Err(e) => format!("Screen failed: {}", e),
                };
                if let Err(e) = event_bus.publish(ReccamEvent::ShutdownRequested { reason }) {
                    warn!("Failed to publish shutdown event: {}", e);
                }
            }

            result
        }));

        self.set_component_state("screen", ComponentState::Running)
            .await;
        info!("Video screen started");

        // Start keyboard input handler (only if enabled)
        if self.keyboard_enabled {
            if let Some(keyboard_handler) = &self.keyboard_handler {
                self.set_component_state("keyboard", ComponentState::Starting)
                    .await;

                keyboard_handler.start().await.map_err(|e| {
                    error!("Failed to start keyboard handler: {}", e);
                    e
                })?;

                self.set_component_state("keyboard", ComponentState::Running)
                    .await;
                info!("Keyboard input handler started - press SPACE to record");
            }
        }

        info!("reccam started successfully");
        Ok(())
    }
}
