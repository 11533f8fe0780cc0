pub mod app;
pub mod aspect;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod format;
pub mod gesture;
pub mod keyboard_input;
pub mod media;
pub mod screen;
pub mod session;

pub use app::{ComponentState, ReccamOrchestrator, ShutdownReason};
pub use aspect::AspectRatio;
pub use config::ReccamConfig;
pub use error::{ReccamError, Result};
pub use events::{EventBus, EventFilter, EventReceiver, ReccamEvent};
pub use format::format_seconds;
pub use gesture::{SwipeDirection, SwipeGestureDetector, TouchEvent, TouchEventType};
pub use keyboard_input::KeyboardInputHandler;
pub use screen::{ScreenCommand, ScreenHandle, ScreenRuntime, VideoScreen};
pub use session::{RecordingId, RecordingSession, RecordingState};
