//! CLI output formatting.
//!
//! Each batch item is shown by its positional index and source file name,
//! with the written file as secondary context:
//!
//! ```text
//! Framing 3 images
//! 001 dawn.jpg → out/dawn-framed.png (4000x4000)
//! 002 empty.png skipped
//!     Reason: invalid image dimensions 0x0
//! 003 dusk.jpg → out/dusk-framed.png (3000x3000)
//! 004 notes.png unreadable
//!     Reason: failed to decode notes.png: ...
//! 005 full.jpg not saved
//!     Reason: IO error: No space left on device
//! Framed 2 images, skipped 2, not saved 1
//! ```
//!
//! The `plan` command prints a single layout:
//!
//! ```text
//! 300x200 → 300x300 canvas
//!     Border: 10px (Fixed 10)
//!     Photo: 280x187 at (10, 56), scale 0.9333
//!     Background: #ffffff
//! ```
//!
//! # Architecture
//!
//! Every `format_*` function returns `Vec<String>` and is pure, so it can be
//! tested without capturing stdout. `print_*` wrappers do the writing.

use crate::batch::BatchEvent;
use crate::framing::{Background, BorderSizeMode, FrameConfig, FramePlan};

/// How a batch item is shown: source name and the path it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLabel {
    pub source: String,
    pub target: String,
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Border description: resolved pixels plus the configured value.
fn border_line(config: &FrameConfig, border_width: f64) -> String {
    let unit = match config.size_mode {
        BorderSizeMode::Fixed => "",
        BorderSizeMode::Proportional => "%",
    };
    format!(
        "Border: {}px ({} {}{})",
        trim_float(border_width),
        config.size_mode.title(),
        trim_float(config.border_value),
        unit
    )
}

/// Up to two decimals, without trailing zeros.
fn trim_float(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

// ============================================================================
// Plan
// ============================================================================

/// Format a frame plan for the `plan` command.
pub fn format_plan(
    width: u32,
    height: u32,
    config: &FrameConfig,
    plan: &FramePlan,
) -> Vec<String> {
    let layout = &plan.layout;
    let side = layout.canvas_side;
    let (scaled_w, scaled_h) = layout.scaled_size;
    let (x, y) = layout.content_origin;

    let mut lines = vec![
        format!("{width}x{height} \u{2192} {side}x{side} canvas"),
        format!("    {}", border_line(config, layout.border_width)),
    ];
    if layout.has_foreground() {
        lines.push(format!(
            "    Photo: {scaled_w}x{scaled_h} at ({x}, {y}), scale {:.4}",
            layout.scale_factor
        ));
    } else {
        lines.push("    Photo: too small to draw".to_string());
    }
    if layout.is_degenerate() {
        lines.push("    Warning: border leaves no room, inner area clamped to 1px".to_string());
    }

    match &plan.background {
        Background::Solid(color) => lines.push(format!("    Background: {color}")),
        Background::BlurredPhoto(blur) => {
            let rect = blur.enlarged;
            lines.push(format!(
                "    Background: blurred photo {}x{} at ({}, {}), sigma {:.1}",
                rect.width, rect.height, rect.x, rect.y, blur.sigma
            ));
        }
    }
    lines
}

pub fn print_plan(width: u32, height: u32, config: &FrameConfig, plan: &FramePlan) {
    for line in format_plan(width, height, config, plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Format one batch event. `labels` is indexed like the batch sources.
pub fn format_batch_event(event: &BatchEvent, labels: &[ItemLabel]) -> Vec<String> {
    let source_name = |index: usize| {
        labels
            .get(index)
            .map(|l| l.source.clone())
            .unwrap_or_else(|| format!("#{}", index + 1))
    };

    match event {
        BatchEvent::Started { total } => vec![format!("Framing {}", plural(*total, "image"))],
        BatchEvent::ItemFramed {
            index,
            canvas_side,
            ..
        } => {
            let head = format!("{} {}", format_index(index + 1), source_name(*index));
            match labels.get(*index) {
                Some(label) => vec![format!(
                    "{head} \u{2192} {} ({canvas_side}x{canvas_side})",
                    label.target
                )],
                None => vec![format!("{head} ({canvas_side}x{canvas_side})")],
            }
        }
        BatchEvent::ItemSkipped { index, reason } => vec![
            format!("{} {} skipped", format_index(index + 1), source_name(*index)),
            format!("    Reason: {reason}"),
        ],
        BatchEvent::ItemUnreadable { index, message } => vec![
            format!("{} {} unreadable", format_index(index + 1), source_name(*index)),
            format!("    Reason: {message}"),
        ],
        BatchEvent::ItemNotSaved { index, message } => vec![
            format!("{} {} not saved", format_index(index + 1), source_name(*index)),
            format!("    Reason: {message}"),
        ],
        BatchEvent::Cancelled { remaining } => {
            vec![format!("Cancelled, {} not framed", plural(*remaining, "image"))]
        }
        BatchEvent::Finished {
            framed,
            skipped,
            failed,
        } => {
            let mut line = format!("Framed {}", plural(*framed, "image"));
            if *skipped > 0 {
                line.push_str(&format!(", skipped {skipped}"));
            }
            if *failed > 0 {
                line.push_str(&format!(", not saved {failed}"));
            }
            vec![line]
        }
    }
}
