use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Hardware keys the host shell forwards to the active screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostKey {
    VolumeDown,
    VolumeUp,
}

/// Channel through which the host shell forwards key presses.
///
/// Screens subscribe on entry and drop their subscription on exit; a key
/// pressed while no screen is subscribed is discarded.
#[derive(Clone)]
pub struct HostKeyEvents {
    sender: broadcast::Sender<HostKey>,
}

impl HostKeyEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> KeySubscription {
        debug!("Key subscription added");
        KeySubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Forward a key press; returns how many screens received it
    pub fn dispatch(&self, key: HostKey) -> usize {
        match self.sender.send(key) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("Key {:?} dropped: no active screen", key);
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A screen's live subscription to host keys
pub struct KeySubscription {
    receiver: broadcast::Receiver<HostKey>,
}

impl KeySubscription {
    /// Next key press, or `None` once the host channel is gone
    pub async fn recv(&mut self) -> Option<HostKey> {
        loop {
            match self.receiver.recv().await {
                Ok(key) => return Some(key),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Key subscription lagged by {} presses", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        debug!("Key subscription removed");
    }
}
