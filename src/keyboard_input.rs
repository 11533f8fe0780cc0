use crate::device::Rotation;
use crate::error::Result;
use crate::events::{EventBus, ReccamEvent};
use crate::gesture::TouchEvent;
use crate::screen::{HostKey, HostKeyEvents, ScreenCommand, ScreenHandle};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::{Duration, Instant};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a terminal key stands for on the capture screen
#[derive(Debug, Clone)]
enum KeyAction {
    Screen(ScreenCommand),
    Host(HostKey),
    SwipeLeft,
    Rotate,
    Quit,
}

fn action_for_key(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(KeyAction::Screen(ScreenCommand::CaptureButton)),
        KeyCode::Char('v') => Some(KeyAction::Host(HostKey::VolumeDown)),
        KeyCode::Char('s') => Some(KeyAction::Screen(ScreenCommand::SwitchCamera)),
        KeyCode::Char('f') => Some(KeyAction::Screen(ScreenCommand::ShowFlashOptions)),
        KeyCode::Char('1') => Some(KeyAction::Screen(ScreenCommand::SelectFlash(true))),
        KeyCode::Char('0') => Some(KeyAction::Screen(ScreenCommand::SelectFlash(false))),
        KeyCode::Char('g') => Some(KeyAction::Screen(ScreenCommand::ShowGallery)),
        KeyCode::Left => Some(KeyAction::SwipeLeft),
        KeyCode::Char('r') => Some(KeyAction::Rotate),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        _ => None,
    }
}

/// Press/release pair that reads as a left swipe across the viewfinder
fn swipe_left_commands(now: Instant) -> [ScreenCommand; 2] {
    [
        ScreenCommand::Touch(TouchEvent::press(800.0, 500.0, now)),
        ScreenCommand::Touch(TouchEvent::release(
            200.0,
            500.0,
            now + Duration::from_millis(120),
        )),
    ]
}

fn next_rotation(rotation: Rotation) -> Rotation {
    Rotation::from_degrees(rotation.degrees() + 90).unwrap_or_default()
}

/// Terminal keyboard driver for the capture screen
pub struct KeyboardInputHandler {
    screen: ScreenHandle,
    key_events: HostKeyEvents,
    event_bus: EventBus,
    display_id: u32,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    /// Create a new keyboard input handler
    pub fn new(
        screen: ScreenHandle,
        key_events: HostKeyEvents,
        event_bus: EventBus,
        display_id: u32,
    ) -> Self {
        Self {
            screen,
            key_events,
            event_bus,
            display_id,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!(
            "Keyboard controls: SPACE record, v volume-down, s switch, f/1/0 flash, \
             g gallery, LEFT swipe, r rotate, q quit"
        );

        let screen = self.screen.clone();
        let key_events = self.key_events.clone();
        let event_bus = self.event_bus.clone();
        let display_id = self.display_id;
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            let mut rotation = Rotation::Rotate0;

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let Some(action) = action_for_key(key_event.code) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        let commands: Vec<ScreenCommand> = match action {
                            KeyAction::Screen(command) => vec![command],
                            KeyAction::Host(key) => {
                                key_events.dispatch(key);
                                Vec::new()
                            }
                            KeyAction::SwipeLeft => swipe_left_commands(Instant::now()).to_vec(),
                            KeyAction::Rotate => {
                                rotation = next_rotation(rotation);
                                vec![ScreenCommand::DisplayChanged {
                                    display_id,
                                    rotation,
                                }]
                            }
                            KeyAction::Quit => {
                                info!("Quit key pressed - requesting shutdown");
                                if let Err(e) = event_bus.publish(ReccamEvent::ShutdownRequested {
                                    reason: "User requested via keyboard".to_string(),
                                }) {
                                    warn!("Failed to publish shutdown event: {}", e);
                                }
                                break;
                            }
                        };

                        for command in commands {
                            if let Err(e) = screen.blocking_send(command) {
                                warn!("Failed to deliver key to screen: {}", e);
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;

        let _ = disable_raw_mode();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{SwipeDirection, SwipeGestureDetector};

    #[test]
    fn test_key_mapping() {
        assert!(matches!(
            action_for_key(KeyCode::Char(' ')),
            Some(KeyAction::Screen(ScreenCommand::CaptureButton))
        ));
        assert!(matches!(
            action_for_key(KeyCode::Char('v')),
            Some(KeyAction::Host(HostKey::VolumeDown))
        ));
        assert!(matches!(
            action_for_key(KeyCode::Char('1')),
            Some(KeyAction::Screen(ScreenCommand::SelectFlash(true)))
        ));
        assert!(matches!(action_for_key(KeyCode::Esc), Some(KeyAction::Quit)));
        assert!(action_for_key(KeyCode::Char('z')).is_none());
    }

    #[test]
    fn test_swipe_left_commands_form_a_swipe() {
        let mut detector = SwipeGestureDetector::new();
        let mut direction = None;
        for command in swipe_left_commands(Instant::now()) {
            if let ScreenCommand::Touch(event) = command {
                direction = detector.on_touch_event(event);
            }
        }
        assert_eq!(direction, Some(SwipeDirection::Left));
    }

    #[test]
    fn test_rotation_cycles() {
        assert_eq!(next_rotation(Rotation::Rotate0), Rotation::Rotate90);
        assert_eq!(next_rotation(Rotation::Rotate270), Rotation::Rotate0);
    }
}
