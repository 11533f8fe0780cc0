use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Shortest period a [`TokioScheduler`] registration runs at
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Identifies one periodic registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick-{}", self.0)
    }
}

/// Ownership of an active periodic registration.
///
/// `cancel` consumes the token, so a registration is cancelled at most once.
pub trait CancelToken: Send {
    fn id(&self) -> TickId;

    /// Stop future invocations. No tick for this registration may act afterwards.
    fn cancel(self);
}

/// Facility that runs a callback once per fixed interval until cancelled
pub trait Scheduler {
    type Token: CancelToken;

    fn schedule_periodic(&mut self, interval: Duration) -> Self::Token;
}

/// Scheduler delivering ticks as [`TickId`] messages on an mpsc channel.
///
/// The owner drains the receiver on the same task that mutates the session,
/// so ticks are serialized with every other operation.
pub struct TokioScheduler {
    ticks: mpsc::UnboundedSender<TickId>,
    next_id: u64,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TickId>) {
        let (ticks, receiver) = mpsc::unbounded_channel();
        (Self { ticks, next_id: 0 }, receiver)
    }
}

impl Scheduler for TokioScheduler {
    type Token = TokioTickToken;

    fn schedule_periodic(&mut self, period: Duration) -> Self::Token {
        // interval_at panics on a zero period
        let period = if period < MIN_TICK_PERIOD {
            warn!("Tick period {:?} too short, using {:?}", period, MIN_TICK_PERIOD);
            MIN_TICK_PERIOD
        } else {
            period
        };

        self.next_id += 1;
        let id = TickId(self.next_id);
        let cancellation = CancellationToken::new();
        let task_cancellation = cancellation.clone();
        let ticks = self.ticks.clone();

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = task_cancellation.cancelled() => break,
                    _ = interval.tick() => {
                        trace!("Delivering {}", id);
                        if ticks.send(id).is_err() {
                            break;
                        }
                    }
                }
            }

            debug!("Periodic task for {} exited", id);
        });

        debug!("Scheduled {} every {:?}", id, period);
        TokioTickToken { id, cancellation }
    }
}

/// Token for a [`TokioScheduler`] registration; cancels on drop as well
pub struct TokioTickToken {
    id: TickId,
    cancellation: CancellationToken,
}

impl CancelToken for TokioTickToken {
    fn id(&self) -> TickId {
        self.id
    }

    fn cancel(self) {
        debug!("Cancelling {}", self.id);
        // Drop performs the cancellation
    }
}

impl Drop for TokioTickToken {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

/// Scheduler that never fires on its own; the caller delivers ticks by hand.
///
/// Tracks live registrations so callers can assert how many exist.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    active: Arc<Mutex<HashSet<TickId>>>,
    next_id: Arc<Mutex<u64>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registrations not yet cancelled
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_active(&self, id: TickId) -> bool {
        self.active.lock().contains(&id)
    }
}

impl Scheduler for ManualScheduler {
    type Token = ManualTickToken;

    fn schedule_periodic(&mut self, _interval: Duration) -> Self::Token {
        let id = {
            let mut next_id = self.next_id.lock();
            *next_id += 1;
            TickId(*next_id)
        };
        self.active.lock().insert(id);
        ManualTickToken {
            id,
            active: Arc::clone(&self.active),
        }
    }
}

pub struct ManualTickToken {
    id: TickId,
    active: Arc<Mutex<HashSet<TickId>>>,
}

impl CancelToken for ManualTickToken {
    fn id(&self) -> TickId {
        self.id
    }

    fn cancel(self) {}
}

impl Drop for ManualTickToken {
    fn drop(&mut self) {
        self.active.lock().remove(&self.id);
    }
}
