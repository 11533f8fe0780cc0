mod capabilities;
mod helper;
mod keys;
mod resources;
mod runtime;
mod video;
#[cfg(test)]
mod tests;

pub use capabilities::ScreenCapabilities;
pub use helper::{Destination, PermissionGate, ScreenHelper, StaticPermissions};
pub use keys::{HostKey, HostKeyEvents, KeySubscription};
pub use resources::ScreenResources;
pub use runtime::{ScreenCommand, ScreenHandle, ScreenRuntime};
pub use video::{PendingRecording, VideoScreen, RECORD_FAILED_MESSAGE};
