//! Pinch detection over hand-landmark frames.

use crate::board::PixelPoint;
use crate::detector::DetectorFrame;

/// MediaPipe hand-landmark indices for the two tips we care about.
pub const THUMB_TIP: usize = 4;
pub const INDEX_FINGER_TIP: usize = 8;

/// Per-frame pinch sample. Carries no history; edge detection is the
/// session loop's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinchEvent {
    pub pinching: bool,
    /// Midpoint of thumb and index tips in camera-pixel space. Present
    /// whenever a hand is tracked, pinching or not.
    pub point: Option<PixelPoint>,
}

#[derive(Debug)]
pub struct PinchSensor {
    threshold: f32,
}

impl PinchSensor {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Classify one detector frame. Fails open: no hand, or a hand with too
    /// few landmarks, is simply "not pinching".
    ///
    /// Multiple hands: the first in provider order wins, matching the
    /// upstream detector's single-hand configuration.
    pub fn sample(&self, frame: &DetectorFrame) -> PinchEvent {
        let Some(hand) = frame.hands.first() else {
            return PinchEvent::default();
        };
        let (Some(thumb), Some(index)) = (
            hand.landmarks.get(THUMB_TIP),
            hand.landmarks.get(INDEX_FINGER_TIP),
        ) else {
            return PinchEvent::default();
        };

        let dx = thumb.x - index.x;
        let dy = thumb.y - index.y;
        let distance = (dx * dx + dy * dy).sqrt();

        let point = PixelPoint::new(
            (thumb.x + index.x) / 2.0 * frame.width,
            (thumb.y + index.y) / 2.0 * frame.height,
        );

        PinchEvent {
            pinching: distance < self.threshold,
            point: Some(point),
        }
    }
}
