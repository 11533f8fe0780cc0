use super::display::DisplaySurface;
use super::scheduler::{CancelToken, Scheduler, TickId};
use crate::device::{CaptureDevice, OutputTarget, RecordingCompletion, RecordingHandle, RecordingResult};
use crate::error::{ReccamError, Result};
use crate::format::format_seconds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Whether a recording is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingState {
    Idle,
    Recording,
}

/// Identifies one recording started by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordingId(pub u64);

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which branch a toggle took
#[derive(Debug)]
pub enum RecordingOutcome {
    /// A recording was started; the device reports its end on `completion`
    Started {
        recording_id: RecordingId,
        completion: RecordingCompletion,
    },
    /// The active recording was asked to finalize
    Stopped { recording_id: RecordingId },
}

struct ActiveRecording<T> {
    id: RecordingId,
    tick: T,
    handle: Box<dyn RecordingHandle>,
}

/// Recording state machine and elapsed-time counter for one capture screen.
///
/// The tick registration and the device handle live inside the active
/// recording, so a timer exists exactly while the session is recording.
pub struct RecordingSession<S: Scheduler, D: DisplaySurface> {
    scheduler: S,
    display: D,
    tick_interval: Duration,
    elapsed_seconds: u64,
    next_recording_id: u64,
    active: Option<ActiveRecording<S::Token>>,
}

impl<S: Scheduler, D: DisplaySurface> RecordingSession<S, D> {
    pub fn new(scheduler: S, display: D, tick_interval: Duration) -> Self {
        Self {
            scheduler,
            display,
            tick_interval,
            elapsed_seconds: 0,
            next_recording_id: 0,
            active: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        if self.active.is_some() {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Id of the recording in progress
    pub fn active_recording(&self) -> Option<RecordingId> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Id of the live tick registration
    pub fn active_tick(&self) -> Option<TickId> {
        self.active.as_ref().map(|active| active.tick.id())
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Elapsed time rendered as `HH:MM:SS`
    pub fn formatted_elapsed(&self) -> String {
        format_seconds(self.elapsed_seconds)
    }

    /// Start a recording when idle, stop the active one otherwise.
    ///
    /// Never starts a second concurrent recording. Starting requires a device;
    /// without one the session stays idle and `DeviceUnavailable` is returned.
    pub fn toggle(
        &mut self,
        device: Option<&dyn CaptureDevice>,
        target: OutputTarget,
    ) -> Result<RecordingOutcome> {
        if let Some(recording_id) = self.stop() {
            return Ok(RecordingOutcome::Stopped { recording_id });
        }

        let device = device.ok_or(ReccamError::DeviceUnavailable)?;
        self.start(device, target)
    }

    fn start(&mut self, device: &dyn CaptureDevice, target: OutputTarget) -> Result<RecordingOutcome> {
        let location = target.path.clone();
        let recording = device.start_recording(target)?;

        self.next_recording_id += 1;
        let id = RecordingId(self.next_recording_id);

        self.elapsed_seconds = 0;
        let tick = self.scheduler.schedule_periodic(self.tick_interval);
        self.display.set_timer_visible(true);

        self.active = Some(ActiveRecording {
            id,
            tick,
            handle: recording.handle,
        });

        info!("Recording {} started -> {}", id, location.display());
        Ok(RecordingOutcome::Started {
            recording_id: id,
            completion: recording.completion,
        })
    }

    /// Stop the active recording and ask the device to finalize it.
    ///
    /// Returns the stopped recording, or `None` when already idle.
    pub fn stop(&mut self) -> Option<RecordingId> {
        let (id, mut handle) = self.finish_active()?;
        handle.stop();
        info!("Recording {} stopped", id);
        Some(id)
    }

    /// Advance the elapsed counter by one and refresh the display.
    ///
    /// Ignored while idle; returns whether the display was updated.
    pub fn on_tick(&mut self) -> bool {
        if self.active.is_none() {
            trace!("Tick ignored while idle");
            return false;
        }

        self.elapsed_seconds += 1;
        let formatted = self.formatted_elapsed();
        self.display.show_elapsed(self.elapsed_seconds, &formatted);
        true
    }

    /// Tick delivered by the scheduler for registration `tick`.
    ///
    /// Ticks from a cancelled registration are dropped.
    pub fn on_scheduled_tick(&mut self, tick: TickId) -> bool {
        match self.active_tick() {
            Some(current) if current == tick => self.on_tick(),
            _ => {
                debug!("Dropping stale {}", tick);
                false
            }
        }
    }

    /// Terminal event reported by the device for `recording_id`.
    ///
    /// If it concerns the recording in progress, the device has abandoned or
    /// finalized it on its own: the session returns to idle without calling
    /// `stop` on the handle. Events for recordings already ended are no-ops.
    /// Returns whether the session state changed.
    pub fn on_device_finished(&mut self, recording_id: RecordingId, result: &RecordingResult) -> bool {
        if self.active_recording() != Some(recording_id) {
            debug!("Recording {} already ended; ignoring device result", recording_id);
            return false;
        }

        self.finish_active();
        match result {
            Ok(saved) => info!(
                "Recording {} finalized by device: {}",
                recording_id,
                saved.location.display()
            ),
            Err(failure) => warn!("Recording {} failed: {}", recording_id, failure),
        }
        true
    }

    fn finish_active(&mut self) -> Option<(RecordingId, Box<dyn RecordingHandle>)> {
        let ActiveRecording { id, tick, handle } = self.active.take()?;
        tick.cancel();

        self.elapsed_seconds = 0;
        let formatted = self.formatted_elapsed();
        self.display.show_elapsed(0, &formatted);
        self.display.set_timer_visible(false);

        Some((id, handle))
    }
}
