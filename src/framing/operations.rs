//! High-level framing operations.
//!
//! These functions run the three stages in order: resolve the border, plan
//! the layout, then hand the plan to a backend for compositing.

use super::backend::{Background, FrameBackend, FrameError};
use super::calculations::{RenderPlan, plan_blur, plan_layout, resolve_border_width};
use super::params::{BorderColorMode, FrameConfig};
use image::{DynamicImage, RgbaImage};

/// Result type for framing operations.
pub type Result<T> = std::result::Result<T, FrameError>;

/// Layout and background for one image, ready for a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    pub layout: RenderPlan,
    pub background: Background,
}

/// Plan a frame without touching pixels.
///
/// Fails with [`FrameError::InvalidDimension`] when either side is zero.
pub fn plan_frame(width: u32, height: u32, config: &FrameConfig) -> Result<FramePlan> {
    if width == 0 || height == 0 {
        return Err(FrameError::InvalidDimension { width, height });
    }

    let border_width =
        resolve_border_width(config.border_value, config.size_mode, width.max(height))?;
    let layout = plan_layout(width, height, border_width);
    let background = match config.color_mode {
        BorderColorMode::SolidColor => Background::Solid(config.color),
        BorderColorMode::BlurredPhoto => {
            Background::BlurredPhoto(plan_blur(width, height, layout.canvas_side))
        }
    };

    if layout.is_degenerate() {
        tracing::warn!(
            width,
            height,
            border_width,
            "border leaves no room for the photo, inner area clamped"
        );
    }
    tracing::debug!(
        width,
        height,
        canvas = layout.canvas_side,
        border_width,
        scale = layout.scale_factor,
        scaled_w = layout.scaled_size.0,
        scaled_h = layout.scaled_size.1,
        "planned frame"
    );

    Ok(FramePlan { layout, background })
}

/// Frame a single image.
pub fn frame_image(
    backend: &impl FrameBackend,
    source: &DynamicImage,
    config: &FrameConfig,
) -> Result<RgbaImage> {
    let plan = plan_frame(source.width(), source.height(), config)?;
    backend.compose(source, &plan.layout, &plan.background)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::backend::tests::MockBackend;
    use crate::framing::params::{BorderSizeMode, Color};
    use crate::framing::rust_backend::RustBackend;

    #[test]
    fn plan_frame_resolves_proportional_border() {
        let config = FrameConfig::solid(10.0, BorderSizeMode::Proportional, Color::BLACK);
        let plan = plan_frame(1000, 500, &config).unwrap();
        assert_eq!(plan.layout.border_width, 100.0);
        assert_eq!(plan.layout.canvas_side, 1000);
        assert_eq!(plan.layout.inner_side, 800.0);
        assert_eq!(plan.background, Background::Solid(Color::BLACK));
    }

    #[test]
    fn plan_frame_blur_mode_plans_background() {
        let config = FrameConfig::blurred(0.0, BorderSizeMode::Fixed);
        let plan = plan_frame(300, 200, &config).unwrap();
        match plan.background {
            Background::BlurredPhoto(blur) => {
                assert!(blur.enlarged.width > 300 || blur.enlarged.height > 300);
            }
            other => panic!("expected blurred background, got {other:?}"),
        }
    }

    #[test]
    fn plan_frame_rejects_zero_area() {
        let config = FrameConfig::default();
        assert_eq!(
            plan_frame(0, 50, &config),
            Err(FrameError::InvalidDimension {
                width: 0,
                height: 50
            })
        );
        assert!(plan_frame(50, 0, &config).is_err());
    }

    #[test]
    fn frame_image_passes_plan_to_backend() {
        let backend = MockBackend::new();
        let source = DynamicImage::new_rgb8(400, 200);
        let config = FrameConfig::solid(20.0, BorderSizeMode::Fixed, Color::WHITE);

        let canvas = frame_image(&backend, &source, &config).unwrap();
        assert_eq!(canvas.dimensions(), (400, 400));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].canvas_side, 400);
        assert_eq!(ops[0].scaled_size, (360, 180));
        assert_eq!(ops[0].content_origin, (20, 110));
        assert!(!ops[0].blurred);
    }

    #[test]
    fn frame_image_skips_backend_for_zero_area() {
        let backend = MockBackend::new();
        let source = DynamicImage::new_rgb8(0, 0);
        let result = frame_image(&backend, &source, &FrameConfig::default());
        assert!(matches!(result, Err(FrameError::InvalidDimension { .. })));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn frame_image_propagates_allocation_failure() {
        let backend = MockBackend::new().fail_next(FrameError::AllocationFailure { side: 10 });
        let source = DynamicImage::new_rgb8(10, 10);
        let result = frame_image(&backend, &source, &FrameConfig::default());
        assert_eq!(result, Err(FrameError::AllocationFailure { side: 10 }));
    }

    #[test]
    fn frame_image_is_repeatable() {
        let source = DynamicImage::ImageRgb8(image::RgbImage::from_fn(64, 48, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 5) as u8, 77])
        }));
        let config = FrameConfig::blurred(8.0, BorderSizeMode::Proportional);
        let backend = RustBackend::new();
        let a = frame_image(&backend, &source, &config).unwrap();
        let b = frame_image(&backend, &source, &config).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
