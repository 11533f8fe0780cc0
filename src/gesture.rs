use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::trace;

/// Minimum travel in pixels for a swipe
const SWIPE_DISTANCE_THRESHOLD: f64 = 100.0;
/// Minimum speed in pixels per second for a swipe
const SWIPE_VELOCITY_THRESHOLD: f64 = 100.0;

/// Touch event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEventType {
    Press,
    Release,
}

/// Touch event on the viewfinder
#[derive(Debug, Clone, Copy)]
pub struct TouchEvent {
    pub event_type: TouchEventType,
    pub x: f64,
    pub y: f64,
    pub timestamp: Instant,
}

impl TouchEvent {
    pub fn press(x: f64, y: f64, timestamp: Instant) -> Self {
        Self {
            event_type: TouchEventType::Press,
            x,
            y,
            timestamp,
        }
    }

    pub fn release(x: f64, y: f64, timestamp: Instant) -> Self {
        Self {
            event_type: TouchEventType::Release,
            x,
            y,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Recognizes fling-style swipes from press/release pairs
#[derive(Debug, Default)]
pub struct SwipeGestureDetector {
    origin: Option<TouchEvent>,
}

impl SwipeGestureDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a touch event; returns a direction when a release completes a swipe
    pub fn on_touch_event(&mut self, event: TouchEvent) -> Option<SwipeDirection> {
        match event.event_type {
            TouchEventType::Press => {
                self.origin = Some(event);
                None
            }
            TouchEventType::Release => {
                let origin = self.origin.take()?;
                classify(&origin, &event)
            }
        }
    }
}

fn classify(origin: &TouchEvent, release: &TouchEvent) -> Option<SwipeDirection> {
    let dx = release.x - origin.x;
    let dy = release.y - origin.y;
    let seconds = release
        .timestamp
        .saturating_duration_since(origin.timestamp)
        .as_secs_f64();

    let (distance, direction) = if dx.abs() > dy.abs() {
        let direction = if dx < 0.0 {
            SwipeDirection::Left
        } else {
            SwipeDirection::Right
        };
        (dx.abs(), direction)
    } else {
        let direction = if dy < 0.0 {
            SwipeDirection::Up
        } else {
            SwipeDirection::Down
        };
        (dy.abs(), direction)
    };

    if distance <= SWIPE_DISTANCE_THRESHOLD {
        return None;
    }

    // Zero elapsed time counts as infinitely fast
    let velocity = if seconds > 0.0 {
        distance / seconds
    } else {
        f64::INFINITY
    };
    if velocity <= SWIPE_VELOCITY_THRESHOLD {
        trace!("Swipe too slow: {:.1}px/s", velocity);
        return None;
    }

    Some(direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn swipe(from: (f64, f64), to: (f64, f64), millis: u64) -> Option<SwipeDirection> {
        let start = Instant::now();
        let mut detector = SwipeGestureDetector::new();
        assert!(detector
            .on_touch_event(TouchEvent::press(from.0, from.1, start))
            .is_none());
        detector.on_touch_event(TouchEvent::release(
            to.0,
            to.1,
            start + Duration::from_millis(millis),
        ))
    }

    #[test]
    fn test_horizontal_swipes() {
        assert_eq!(swipe((500.0, 300.0), (100.0, 320.0), 200), Some(SwipeDirection::Left));
        assert_eq!(swipe((100.0, 300.0), (500.0, 280.0), 200), Some(SwipeDirection::Right));
    }

    #[test]
    fn test_vertical_swipes() {
        assert_eq!(swipe((300.0, 800.0), (310.0, 200.0), 150), Some(SwipeDirection::Up));
        assert_eq!(swipe((300.0, 200.0), (290.0, 800.0), 150), Some(SwipeDirection::Down));
    }

    #[test]
    fn test_short_travel_is_a_tap() {
        assert_eq!(swipe((300.0, 300.0), (250.0, 300.0), 50), None);
    }

    #[test]
    fn test_slow_drag_is_ignored() {
        // 400px over 8 seconds = 50px/s
        assert_eq!(swipe((500.0, 300.0), (100.0, 300.0), 8000), None);
    }

    #[test]
    fn test_release_without_press() {
        let mut detector = SwipeGestureDetector::new();
        let event = TouchEvent::release(0.0, 0.0, Instant::now());
        assert_eq!(detector.on_touch_event(event), None);
    }
}
