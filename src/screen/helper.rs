use crate::device::Rotation;
use crate::error::Result;
use crate::events::{EventBus, ReccamEvent};
use crate::gesture::{SwipeDirection, SwipeGestureDetector, TouchEvent};
use crate::media;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Places a capture screen can ask the host to navigate to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    Permissions,
    Photo,
    Gallery { directory: PathBuf },
}

/// Answers whether the camera and audio permissions are granted
pub trait PermissionGate: Send + Sync {
    fn has_permissions(&self) -> bool;
}

/// Fixed permission answer
pub struct StaticPermissions(pub bool);

impl PermissionGate for StaticPermissions {
    fn has_permissions(&self) -> bool {
        self.0
    }
}

/// Behaviour shared by every capture screen variant
pub struct ScreenHelper {
    event_bus: EventBus,
    permissions: Box<dyn PermissionGate>,
    output_dir: PathBuf,
    display_id: Option<u32>,
    rotation: Rotation,
    swipe: SwipeGestureDetector,
}

impl ScreenHelper {
    pub fn new(
        event_bus: EventBus,
        permissions: Box<dyn PermissionGate>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            event_bus,
            permissions,
            output_dir,
            display_id: None,
            rotation: Rotation::Rotate0,
            swipe: SwipeGestureDetector::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn display_id(&self) -> Option<u32> {
        self.display_id
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Publish an event, tolerating the absence of subscribers
    pub fn publish(&self, event: ReccamEvent) {
        if let Err(e) = self.event_bus.publish(event) {
            trace!("Event not delivered: {}", e);
        }
    }

    /// Permission check on resume; redirects to the permission screen when missing
    pub fn check_permissions(&self) -> bool {
        if self.permissions.has_permissions() {
            return true;
        }

        info!("Camera permissions missing, redirecting");
        self.navigate(Destination::Permissions);
        false
    }

    /// Remember which display the viewfinder is attached to
    pub fn attach_display(&mut self, display_id: u32, rotation: Rotation) {
        debug!(
            "Viewfinder attached to display {} at {} degrees",
            display_id,
            rotation.degrees()
        );
        self.display_id = Some(display_id);
        self.rotation = rotation;
    }

    /// Track a display rotation; only the attached display counts
    pub fn on_display_changed(&mut self, display_id: u32, rotation: Rotation) -> Option<Rotation> {
        if self.display_id != Some(display_id) {
            trace!("Ignoring change on display {}", display_id);
            return None;
        }

        debug!("Rotation changed: {} degrees", rotation.degrees());
        self.rotation = rotation;
        self.publish(ReccamEvent::RotationChanged {
            display_id,
            rotation,
        });
        Some(rotation)
    }

    /// Feed a viewfinder touch; a left swipe leads to `on_swipe_left`
    pub fn on_touch(&mut self, event: TouchEvent, on_swipe_left: Destination) -> Option<Destination> {
        match self.swipe.on_touch_event(event)? {
            SwipeDirection::Left => {
                self.navigate(on_swipe_left.clone());
                Some(on_swipe_left)
            }
            other => {
                trace!("Unhandled swipe {:?}", other);
                None
            }
        }
    }

    pub fn navigate(&self, destination: Destination) {
        self.publish(ReccamEvent::NavigationRequested { destination });
    }

    /// Show `location` on the gallery button
    pub fn set_gallery_thumbnail(&self, location: PathBuf) {
        self.publish(ReccamEvent::ThumbnailUpdated { location });
    }

    /// Load the newest capture into the gallery button, if any
    pub async fn refresh_thumbnail(&self) -> Result<Option<PathBuf>> {
        let latest = media::latest_media(&self.output_dir).await?;
        if let Some(location) = &latest {
            self.set_gallery_thumbnail(location.clone());
        }
        Ok(latest)
    }

    /// Open the gallery when the output directory has anything to show
    pub async fn show_gallery(&self) -> Result<bool> {
        if !media::has_entries(&self.output_dir).await? {
            debug!("Gallery is empty");
            return Ok(false);
        }

        self.navigate(Destination::Gallery {
            directory: self.output_dir.clone(),
        });
        Ok(true)
    }
}
