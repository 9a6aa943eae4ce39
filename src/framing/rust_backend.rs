//! Pure Rust compositor on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Canvas allocation | `Vec::try_reserve_exact` + `ImageBuffer::from_raw` |
//! | Background blur | `image::imageops::blur` on a downscaled working copy |
//! | Background stretch | `imageops::crop_imm` + `imageops::resize` (`Triangle`) |
//! | Photo resize | `image::imageops::resize` with `Lanczos3` |
//! | Drawing | `Pixel::blend` (source-over), opaque pixels copied as-is |

use super::backend::{Background, FrameBackend, FrameError};
use super::calculations::{BlurPlan, RenderPlan};
use super::params::Color;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Pixel, Rgba, RgbaImage};

/// Compositor using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocate a square canvas filled with `fill`, reporting memory exhaustion
/// instead of aborting.
fn allocate_canvas(side: u32, fill: Rgba<u8>) -> Result<RgbaImage, FrameError> {
    let failure = || FrameError::AllocationFailure { side };
    let len = (side as usize)
        .checked_mul(side as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(failure)?;

    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| failure())?;
    buf.resize(len, 0);

    let mut canvas = RgbaImage::from_raw(side, side, buf).ok_or_else(failure)?;
    for pixel in canvas.pixels_mut() {
        *pixel = fill;
    }
    Ok(canvas)
}

/// Source-over `top` onto `canvas` with its top-left corner at `(x, y)`.
///
/// Opaque pixels are copied exactly and transparent ones skipped, so only
/// partially transparent pixels go through float blending.
fn draw_over(canvas: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
    for (tx, ty, pixel) in top.enumerate_pixels() {
        let (cx, cy) = (x + tx as i64, y + ty as i64);
        if cx < 0 || cy < 0 || cx >= canvas_w || cy >= canvas_h {
            continue;
        }
        match pixel[3] {
            0 => {}
            255 => canvas.put_pixel(cx as u32, cy as u32, *pixel),
            _ => canvas.get_pixel_mut(cx as u32, cy as u32).blend(pixel),
        }
    }
}

/// Draw the blurred photo over `canvas`.
fn paint_blurred_photo(canvas: &mut RgbaImage, source: &DynamicImage, blur: &BlurPlan) {
    let (working_w, working_h) = blur.working_size;
    let working = if (working_w, working_h) == (source.width(), source.height()) {
        source.to_rgba8()
    } else {
        imageops::resize(source, working_w, working_h, FilterType::Triangle)
    };
    let blurred = imageops::blur(&working, blur.sigma);

    let visible = blur.visible;
    let region = imageops::crop_imm(&blurred, visible.x, visible.y, visible.width, visible.height)
        .to_image();
    let side = canvas.width();
    let stretched = imageops::resize(&region, side, side, FilterType::Triangle);
    draw_over(canvas, &stretched, 0, 0);
}

/// Draw the photo at its planned size and position.
fn paint_photo(canvas: &mut RgbaImage, source: &DynamicImage, plan: &RenderPlan) {
    if !plan.has_foreground() {
        return;
    }
    let (w, h) = plan.scaled_size;
    let photo = if (w, h) == (source.width(), source.height()) {
        source.to_rgba8()
    } else {
        imageops::resize(source, w, h, FilterType::Lanczos3)
    };
    let (x, y) = plan.content_origin;
    draw_over(canvas, &photo, x, y);
}

impl FrameBackend for RustBackend {
    fn compose(
        &self,
        source: &DynamicImage,
        plan: &RenderPlan,
        background: &Background,
    ) -> Result<RgbaImage, FrameError> {
        if source.width() == 0 || source.height() == 0 {
            return Err(FrameError::InvalidDimension {
                width: source.width(),
                height: source.height(),
            });
        }

        let mut canvas = match background {
            Background::Solid(color) => allocate_canvas(plan.canvas_side, color.rgba())?,
            Background::BlurredPhoto(blur) => {
                let mut canvas = allocate_canvas(plan.canvas_side, Color::WHITE.rgba())?;
                paint_blurred_photo(&mut canvas, source, blur);
                canvas
            }
        };

        paint_photo(&mut canvas, source, plan);
        Ok(canvas)
    }
}
