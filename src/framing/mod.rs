//! The framer: square canvases with a border around a scaled photo.
//!
//! | Stage | Where |
//! |---|---|
//! | **Border sizer** | [`resolve_border_width`] |
//! | **Layout planner** | [`plan_layout`] → [`RenderPlan`] |
//! | **Blur background policy** | [`plan_blur`] → [`BlurPlan`] |
//! | **Compositor** | [`FrameBackend::compose`], implemented by [`RustBackend`] |
//!
//! The module is split into:
//! - **Calculations**: Pure geometry (unit testable, no pixels)
//! - **Parameters**: Border modes, colors, [`FrameConfig`]
//! - **Backend**: [`FrameBackend`] trait + [`RustBackend`]
//! - **Operations**: [`frame_image`], sequencing the stages for one image

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{Background, FrameBackend, FrameError};
pub use calculations::{
    BLUR_ENLARGEMENT, BlurPlan, MIN_INNER_SIDE, Rect, RenderPlan, plan_blur, plan_layout,
    resolve_border_width,
};
pub use operations::{FramePlan, frame_image, plan_frame};
pub use params::{BorderColorMode, BorderSizeMode, Color, ColorParseError, FrameConfig};
pub use rust_backend::RustBackend;
