use super::{ReccamOrchestrator, ShutdownReason};
use crate::error::{ReccamError, Result};
use crate::events::ReccamEvent;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

type SharedSender = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

impl ReccamOrchestrator {
    /// Run until a signal or a shutdown request arrives, then shut down
    pub async fn run(&mut self) -> Result<i32> {
        info!("reccam is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| ReccamError::system("Shutdown sender already taken"))?;

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| ReccamError::system("Shutdown receiver already taken"))?;

        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));
        self.setup_signal_handlers(Arc::clone(&shutdown_sender));
        self.setup_shutdown_listener(shutdown_sender);

        let shutdown_reason = shutdown_receiver
            .await
            .map_err(|_| ReccamError::system("Shutdown channel closed unexpectedly"))?;

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let exit_code = self.shutdown().await?;

        info!("reccam shutdown complete");
        Ok(exit_code)
    }

    fn setup_signal_handlers(&self, shutdown_sender: SharedSender) {
        let token = self.cancellation_token.clone();

        // Handle SIGTERM - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            let token = token.clone();
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate())
                {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };

                tokio::select! {
                    _ = token.cancelled() => {}
                    Some(()) = sigterm.recv() => {
                        info!("Received SIGTERM signal");
                        send_reason(&shutdown_sender_sigterm, ShutdownReason::Signal("SIGTERM".to_string())).await;
                    }
                }
            });
        }

        // Handle SIGINT (Ctrl+C)
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                Ok(()) = signal::ctrl_c() => {
                    info!("Received SIGINT signal (Ctrl+C)");
                    send_reason(&shutdown_sender, ShutdownReason::Signal("SIGINT".to_string())).await;
                }
            }
        });
    }

    /// Turn `ShutdownRequested` events from the bus into a shutdown
    fn setup_shutdown_listener(&self, shutdown_sender: SharedSender) {
        let mut events = self.event_bus.subscribe();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => event,
                };

                match event {
                    Ok(ReccamEvent::ShutdownRequested { reason }) => {
                        info!("Shutdown requested: {}", reason);
                        send_reason(&shutdown_sender, ShutdownReason::UserRequest(reason)).await;
                        break;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Shutdown listener lagged by {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}

async fn send_reason(shutdown_sender: &SharedSender, reason: ShutdownReason) {
    if let Some(sender) = shutdown_sender.lock().await.take() {
        let _ = sender.send(reason);
    }
}
