use crate::events::{EventBus, ReccamEvent};
use tracing::trace;

/// Surface that renders the elapsed-time element
pub trait DisplaySurface {
    /// Show a new elapsed-time readout
    fn show_elapsed(&mut self, elapsed_seconds: u64, formatted: &str);

    /// Show or hide the timer element
    fn set_timer_visible(&mut self, visible: bool);
}

/// Display surface that forwards updates onto the event bus
pub struct EventBusDisplay {
    event_bus: EventBus,
}

impl EventBusDisplay {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }

    fn publish(&self, event: ReccamEvent) {
        if let Err(e) = self.event_bus.publish(event) {
            trace!("Timer update not delivered: {}", e);
        }
    }
}

impl DisplaySurface for EventBusDisplay {
    fn show_elapsed(&mut self, elapsed_seconds: u64, formatted: &str) {
        self.publish(ReccamEvent::TimerUpdated {
            elapsed_seconds,
            formatted: formatted.to_string(),
        });
    }

    fn set_timer_visible(&mut self, visible: bool) {
        self.publish(ReccamEvent::TimerVisibility { visible });
    }
}

/// In-memory surface keeping every update, for inspection
#[derive(Debug, Default, Clone)]
pub struct RecordedDisplay {
    pub updates: Vec<String>,
    pub visible: bool,
}

impl DisplaySurface for RecordedDisplay {
    fn show_elapsed(&mut self, _elapsed_seconds: u64, formatted: &str) {
        self.updates.push(formatted.to_string());
    }

    fn set_timer_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
