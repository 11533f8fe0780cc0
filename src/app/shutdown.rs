use super::{ComponentState, ReccamOrchestrator};
use crate::error::{ReccamError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

const KEYBOARD_STOP_TIMEOUT: Duration = Duration::from_secs(2);
const SCREEN_STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl ReccamOrchestrator {
    /// Perform graceful shutdown of all components
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Cancel all background tasks
        self.cancellation_token.cancel();

        let mut exit_code = 0;

        // Input first so nothing reaches a screen that is going away
        if self.keyboard_enabled {
            if let Err(e) = self.stop_component("keyboard").await {
                error!("Error stopping keyboard: {}", e);
                exit_code = 1;
            }
        }

        if let Err(e) = self.stop_component("screen").await {
            error!("Error stopping screen: {}", e);
            exit_code = 1;
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    /// Stop a specific component
    async fn stop_component(&mut self, component: &str) -> Result<()> {
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let result = match component {
            "keyboard" => match &self.keyboard_handler {
                Some(keyboard_handler) => {
                    stop_within(component, KEYBOARD_STOP_TIMEOUT, keyboard_handler.stop()).await
                }
                None => Ok(()),
            },
            "screen" => match self.screen_task.take() {
                Some(screen_task) => {
                    stop_within(component, SCREEN_STOP_TIMEOUT, async move {
                        screen_task.await.map_err(|e| {
                            ReccamError::component("screen".to_string(), e.to_string())
                        })?
                    })
                    .await
                }
                None => Ok(()),
            },
            _ => Err(ReccamError::component(
                component.to_string(),
                "Unknown component".to_string(),
            )),
        };

        match &result {
            Ok(()) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
            }
            Err(e) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", component, e);
            }
        }

        result
    }
}

async fn stop_within<F>(component: &str, limit: Duration, stop: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match timeout(limit, stop).await {
        Ok(result) => result,
        Err(_) => Err(ReccamError::component(
            component.to_string(),
            format!("{} component stop timeout", component),
        )),
    }
}
