//! # Squarify
//!
//! Puts photos on square canvases. Each photo is scaled into a square inner
//! area and surrounded by a border that is either a solid color or a blurred,
//! enlarged copy of the photo itself.
//!
//! # Architecture
//!
//! Framing one image is three pure steps followed by one pixel step:
//!
//! ```text
//! border value + mode ─► border width ─► RenderPlan ─► (BlurPlan) ─► compose
//!      Border Sizer        Layout Planner   Blur policy     Compositor
//! ```
//!
//! The first three live in [`framing::calculations`] and never touch pixels,
//! so the geometry is tested exhaustively without decoding anything. The
//! compositor sits behind the [`framing::FrameBackend`] trait; tests swap in a
//! recording mock to check what the backend was asked to do.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`framing`] | Border sizing, layout planning, compositing of a single image |
//! | [`batch`] | Sequential batch driver with progress events, pacing, and cancellation |
//! | [`config`] | `squarify.toml` loading, merging over stock defaults, validation |
//! | [`sources`] | Input discovery (files and directories) and parallel decoding |
//! | [`export`] | Output naming and PNG / JPEG / WebP encoding |
//! | [`output`] | CLI output formatting |
//!
//! # Example
//!
//! ```
//! use image::DynamicImage;
//! use squarify::framing::{BorderSizeMode, Color, FrameConfig, RustBackend, frame_image};
//!
//! let photo = DynamicImage::new_rgb8(300, 200);
//! let config = FrameConfig::solid(10.0, BorderSizeMode::Fixed, Color::BLACK);
//! let framed = frame_image(&RustBackend::new(), &photo, &config).unwrap();
//! assert_eq!(framed.dimensions(), (300, 300));
//! ```
//!
//! # Design Decisions
//!
//! ## The Canvas Is the Longest Side
//!
//! Framing never upsamples the canvas: a 4000x3000 photo becomes a 4000x4000
//! image and the border eats into the photo instead of growing the output.
//! Borders larger than half the canvas clamp the inner area to one pixel
//! rather than failing.
//!
//! ## Skip, Don't Stop
//!
//! A zero-area source is skipped and the batch goes on. Only a failed canvas
//! allocation stops a batch, because the next, equally large canvas would
//! fail the same way.

pub mod batch;
pub mod config;
pub mod export;
pub mod framing;
pub mod output;
pub mod sources;
