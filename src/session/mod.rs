mod machine;
mod display;
mod scheduler;

pub use machine::{RecordingId, RecordingOutcome, RecordingSession, RecordingState};
pub use display::{DisplaySurface, EventBusDisplay, RecordedDisplay};
pub use scheduler::{
    CancelToken, ManualScheduler, ManualTickToken, Scheduler, TickId, TokioScheduler,
    TokioTickToken,
};
