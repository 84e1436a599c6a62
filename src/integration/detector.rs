//! Seams to the external camera and detection model.

use std::io;

use thiserror::Error;

use crate::tracker::Detection;

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the follow loop.
///
/// # Example
///
/// ```ignore
/// use target_follow::{DetectionSource, Detection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections in feed order
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures. A failure skips one cycle.
    type Error;

    /// Run inference on raw image data and return detections.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// One captured frame.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// The frame source cannot produce frames at all. Fatal to the loop.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("frame source unavailable: {0}")]
    Unavailable(String),
    #[error("frame source i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Upstream camera (or any stand-in for one).
pub trait FrameSource {
    /// Block until the next frame. `Ok(None)` means the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, AcquisitionError>;

    /// Release the underlying device. Called exactly once when the loop ends.
    fn release(&mut self) {}
}
