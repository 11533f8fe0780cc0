use crate::error::Result;
use async_trait::async_trait;

/// Camera-specific steps every capture screen variant provides
#[async_trait]
pub trait ScreenCapabilities {
    /// Refresh controls that do not depend on a bound camera
    async fn update_camera_ui(&mut self) -> Result<()>;

    /// Pick a lens and bind it once the camera provider is ready
    async fn set_up_camera(&mut self) -> Result<()>;

    /// Bind preview and capture use cases for the current lens
    async fn bind_camera_use_cases(&mut self) -> Result<()>;
}
