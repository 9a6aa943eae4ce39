//! Pure geometry for framing.
//!
//! All functions here are pure and testable without any pixels: the border
//! sizer, the layout planner, and the blurred-background policy.

use super::backend::FrameError;
use super::params::BorderSizeMode;

/// How much larger than the canvas the blurred background is drawn.
///
/// Applied on top of a cover fit, so both axes exceed the canvas by at least
/// this ratio and the blur's soft edges stay off-canvas.
pub const BLUR_ENLARGEMENT: f64 = 1.2;

/// Longest side of the downscaled copy the background blur is computed on.
pub const BLUR_WORKING_SIDE: u32 = 512;

/// Blur sigma as a fraction of the photo's longest side.
const BLUR_SIGMA_RATIO: f64 = 0.02;
const BLUR_SIGMA_MIN: f64 = 2.0;
const BLUR_SIGMA_MAX: f64 = 150.0;

/// Slack for float noise before snapping to whole pixels.
const EPSILON: f64 = 1e-9;

/// Smallest inner side a plan may have. Borders thicker than half the canvas
/// clamp here instead of going negative.
pub const MIN_INNER_SIDE: f64 = 1.0;

/// Geometry of one framed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPlan {
    /// Side of the square canvas: the source's longest side.
    pub canvas_side: u32,
    /// Resolved border thickness in pixels.
    pub border_width: f64,
    /// Side of the square area left for the photo, never below [`MIN_INNER_SIDE`].
    pub inner_side: f64,
    pub scale_factor: f64,
    /// Photo size on the canvas, rounded to whole pixels. An axis can round to
    /// zero under extreme borders.
    pub scaled_size: (u32, u32),
    /// Top-left pixel of the photo, centered on the full canvas.
    pub content_origin: (i64, i64),
}

impl RenderPlan {
    /// Whether the inner side had to be clamped up to [`MIN_INNER_SIDE`].
    pub fn is_degenerate(&self) -> bool {
        self.canvas_side as f64 - 2.0 * self.border_width < MIN_INNER_SIDE
    }

    pub fn has_foreground(&self) -> bool {
        self.scaled_size.0 > 0 && self.scaled_size.1 > 0
    }
}

/// Axis-aligned rectangle in canvas pixels. May extend past the canvas.
///
/// Sizes are 64-bit: a blurred background for a 1x100000 strip is
/// 1.2e10 pixels tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u64,
    pub height: u64,
}

/// Pixel region of the blur working copy, always inside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Everything the compositor needs to paint a blurred-photo background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurPlan {
    /// Size of the downscaled copy that gets blurred.
    pub working_size: (u32, u32),
    /// Gaussian sigma in working-copy pixels.
    pub sigma: f32,
    /// Where the blurred photo lands, centered on the canvas.
    pub enlarged: Rect,
    /// Part of the working copy that ends up visible on the canvas.
    pub visible: CropRegion,
}

/// Resolve the border thickness in pixels.
///
/// Fixed values pass through; proportional values are a percentage of
/// `longest_side`. Nothing is clamped against the canvas here.
///
/// # Examples
/// ```
/// # use squarify::framing::{BorderSizeMode, resolve_border_width};
/// // 10% of a 1000px longest side
/// assert_eq!(resolve_border_width(10.0, BorderSizeMode::Proportional, 1000).unwrap(), 100.0);
/// assert_eq!(resolve_border_width(32.0, BorderSizeMode::Fixed, 1000).unwrap(), 32.0);
/// ```
pub fn resolve_border_width(
    value: f64,
    mode: BorderSizeMode,
    longest_side: u32,
) -> Result<f64, FrameError> {
    if longest_side == 0 {
        return Err(FrameError::InvalidDimension {
            width: 0,
            height: 0,
        });
    }
    let value = if value.is_finite() && value >= 0.0 {
        value
    } else {
        tracing::warn!(value, "border value must be a non-negative number, using 0");
        0.0
    };

    Ok(match mode {
        BorderSizeMode::Fixed => value,
        BorderSizeMode::Proportional => value / 100.0 * longest_side as f64,
    })
}

/// Plan the canvas, inner area, scale and placement for a `width × height` source.
///
/// The scale fits the photo into the inner square preserving aspect ratio.
/// Callers validate that both dimensions are non-zero.
pub fn plan_layout(width: u32, height: u32, border_width: f64) -> RenderPlan {
    let canvas_side = width.max(height);
    let inner_side = (canvas_side as f64 - 2.0 * border_width).max(MIN_INNER_SIDE);

    let width_ratio = inner_side / width as f64;
    let height_ratio = inner_side / height as f64;
    let scale_factor = width_ratio.min(height_ratio);

    let scaled_size = (
        (width as f64 * scale_factor).round() as u32,
        (height as f64 * scale_factor).round() as u32,
    );
    let content_origin = (
        (canvas_side as i64 - scaled_size.0 as i64) / 2,
        (canvas_side as i64 - scaled_size.1 as i64) / 2,
    );

    RenderPlan {
        canvas_side,
        border_width,
        inner_side,
        scale_factor,
        scaled_size,
        content_origin,
    }
}

/// Blur strength for a photo, in source pixels.
pub fn blur_sigma_for(width: u32, height: u32) -> f32 {
    let longest = width.max(height) as f64;
    (longest * BLUR_SIGMA_RATIO).clamp(BLUR_SIGMA_MIN, BLUR_SIGMA_MAX) as f32
}

/// The rectangle the blurred photo is stretched into, centered on the canvas.
///
/// Keeps the photo's aspect ratio, covers the canvas, then grows by
/// [`BLUR_ENLARGEMENT`].
pub fn blur_enlarged_rect(width: u32, height: u32, canvas_side: u32) -> Rect {
    let cover = canvas_side as f64 / width.min(height) as f64;
    let factor = cover * BLUR_ENLARGEMENT;
    let enlarged_w = (width as f64 * factor - EPSILON).ceil() as u64;
    let enlarged_h = (height as f64 * factor - EPSILON).ceil() as u64;

    Rect {
        x: (canvas_side as i64 - enlarged_w as i64) / 2,
        y: (canvas_side as i64 - enlarged_h as i64) / 2,
        width: enlarged_w,
        height: enlarged_h,
    }
}

/// Size of the downscaled copy used for blurring.
///
/// Sources already within [`BLUR_WORKING_SIDE`] are used as-is.
pub fn blur_working_size(width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= BLUR_WORKING_SIDE {
        return (width, height);
    }
    let ratio = BLUR_WORKING_SIDE as f64 / longest as f64;
    (
        ((width as f64 * ratio).round() as u32).max(1),
        ((height as f64 * ratio).round() as u32).max(1),
    )
}

/// Map the on-canvas part of `enlarged` back into working-copy pixels.
fn visible_region(enlarged: Rect, canvas_side: u32, working: (u32, u32)) -> CropRegion {
    let scale_x = working.0 as f64 / enlarged.width as f64;
    let scale_y = working.1 as f64 / enlarged.height as f64;

    let axis = |offset: i64, scale: f64, limit: u32| -> (u32, u32) {
        let start = ((-offset).max(0) as f64 * scale + EPSILON).floor() as u32;
        let start = start.min(limit.saturating_sub(1));
        let len = (canvas_side as f64 * scale - EPSILON).ceil() as u32;
        let len = len.clamp(1, limit - start);
        (start, len)
    };

    let (x, width) = axis(enlarged.x, scale_x, working.0);
    let (y, height) = axis(enlarged.y, scale_y, working.1);
    CropRegion {
        x,
        y,
        width,
        height,
    }
}

/// Plan the blurred-photo background for a `width × height` source.
pub fn plan_blur(width: u32, height: u32, canvas_side: u32) -> BlurPlan {
    let working_size = blur_working_size(width, height);
    let working_scale = working_size.0.max(working_size.1) as f64 / width.max(height) as f64;
    let sigma = (blur_sigma_for(width, height) as f64 * working_scale) as f32;
    let enlarged = blur_enlarged_rect(width, height, canvas_side);

    BlurPlan {
        working_size,
        sigma,
        enlarged,
        visible: visible_region(enlarged, canvas_side, working_size),
    }
}
