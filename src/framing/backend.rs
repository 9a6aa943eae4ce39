//! Compositor trait and shared error type.
//!
//! The [`FrameBackend`] trait is the seam between framing geometry and pixel
//! work: it receives a finished [`RenderPlan`] plus a [`Background`] and must
//! return the composed canvas.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in a recording mock.

use super::calculations::{BlurPlan, RenderPlan};
use super::params::Color;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The source has no pixels. Recoverable: batches skip the item.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },
    /// The canvas could not be allocated. Not recoverable within a batch.
    #[error("could not allocate a {side}x{side} canvas")]
    AllocationFailure { side: u32 },
}

impl FrameError {
    /// Whether a batch may skip the failing item and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FrameError::InvalidDimension { .. })
    }
}

/// How the canvas is filled before the photo is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Solid(Color),
    /// White base, then a blurred, enlarged copy of the photo.
    BlurredPhoto(BlurPlan),
}

/// Trait for compositing backends.
///
/// Implementations must be pure: the same source, plan and background always
/// give the same pixels, and nothing is shared between calls.
pub trait FrameBackend: Sync {
    /// Paint `background`, then the photo scaled to `plan.scaled_size` at
    /// `plan.content_origin`, on a fresh `plan.canvas_side` square canvas.
    fn compose(
        &self,
        source: &DynamicImage,
        plan: &RenderPlan,
        background: &Background,
    ) -> Result<RgbaImage, FrameError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::framing::calculations::plan_layout;
    use std::sync::Mutex;

    /// Mock backend that records compose calls and returns a plain canvas.
    ///
    /// Errors queued with [`MockBackend::fail_next`] are returned in order
    /// before falling back to success. Uses Mutex so it stays `Sync`.
    #[derive(Default)]
    pub struct MockBackend {
        pub failures: Mutex<Vec<FrameError>>,
        pub operations: Mutex<Vec<RecordedCompose>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCompose {
        pub source_size: (u32, u32),
        pub canvas_side: u32,
        pub scaled_size: (u32, u32),
        pub content_origin: (i64, i64),
        pub blurred: bool,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_next(self, error: FrameError) -> Self {
            self.failures.lock().unwrap().insert(0, error);
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedCompose> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl FrameBackend for MockBackend {
        fn compose(
            &self,
            source: &DynamicImage,
            plan: &RenderPlan,
            background: &Background,
        ) -> Result<RgbaImage, FrameError> {
            self.operations.lock().unwrap().push(RecordedCompose {
                source_size: (source.width(), source.height()),
                canvas_side: plan.canvas_side,
                scaled_size: plan.scaled_size,
                content_origin: plan.content_origin,
                blurred: matches!(background, Background::BlurredPhoto(_)),
            });

            if let Some(error) = self.failures.lock().unwrap().pop() {
                return Err(error);
            }
            Ok(RgbaImage::new(plan.canvas_side, plan.canvas_side))
        }
    }

    #[test]
    fn mock_records_compose() {
        let backend = MockBackend::new();
        let source = DynamicImage::new_rgb8(40, 20);
        let plan = plan_layout(40, 20, 5.0);

        let canvas = backend
            .compose(&source, &plan, &Background::Solid(Color::BLACK))
            .unwrap();
        assert_eq!(canvas.dimensions(), (40, 40));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].source_size, (40, 20));
        assert_eq!(ops[0].scaled_size, (30, 15));
        assert!(!ops[0].blurred);
    }

    #[test]
    fn mock_returns_queued_failures_in_order() {
        let backend = MockBackend::new()
            .fail_next(FrameError::AllocationFailure { side: 1 })
            .fail_next(FrameError::AllocationFailure { side: 2 });
        let source = DynamicImage::new_rgb8(4, 4);
        let plan = plan_layout(4, 4, 0.0);
        let bg = Background::Solid(Color::WHITE);

        assert_eq!(
            backend.compose(&source, &plan, &bg),
            Err(FrameError::AllocationFailure { side: 1 })
        );
        assert_eq!(
            backend.compose(&source, &plan, &bg),
            Err(FrameError::AllocationFailure { side: 2 })
        );
        assert!(backend.compose(&source, &plan, &bg).is_ok());
    }

    #[test]
    fn only_invalid_dimension_is_recoverable() {
        assert!(FrameError::InvalidDimension {
            width: 0,
            height: 3
        }
        .is_recoverable());
        assert!(!FrameError::AllocationFailure { side: 9 }.is_recoverable());
    }
}
