mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use orchestrator::ReccamOrchestrator;
pub use types::{ComponentState, ShutdownReason};
