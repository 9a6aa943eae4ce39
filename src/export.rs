//! Writing framed canvases to disk.
//!
//! | Format | Encoder | Alpha |
//! |---|---|---|
//! | PNG | `image::codecs::png::PngEncoder` | kept |
//! | JPEG | `image::codecs::jpeg::JpegEncoder`, `[output] quality` | dropped |
//! | WebP | `image::codecs::webp::WebPEncoder`, lossless | kept |

use crate::config::{OutputConfig, OutputFormat};
use image::{DynamicImage, ImageEncoder, RgbaImage};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
}

fn target_name(source: &Path, output: &OutputConfig, counter: Option<usize>) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = output.format.extension();
    match counter {
        Some(n) => format!("{stem}{}-{n}.{ext}", output.suffix),
        None => format!("{stem}{}.{ext}", output.suffix),
    }
}

/// Output path for a framed source: `<out_dir>/<stem><suffix>.<ext>`.
pub fn output_path(source: &Path, out_dir: &Path, output: &OutputConfig) -> PathBuf {
    out_dir.join(target_name(source, output, None))
}

/// Output paths for a whole batch, one per source, all distinct.
///
/// Sources that would land on the same file (`a/x.jpg` and `b/x.png`) get a
/// counter after the suffix, in input order: `x-framed.png`,
/// `x-framed-2.png`, `x-framed-3.png`.
pub fn output_paths(sources: &[PathBuf], out_dir: &Path, output: &OutputConfig) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let mut name = target_name(source, output, None);
            let mut counter = 2;
            while taken.contains(&name) {
                name = target_name(source, output, Some(counter));
                counter += 1;
            }
            taken.insert(name.clone());
            out_dir.join(name)
        })
        .collect()
}

/// Encode `canvas` to `path` in the configured format.
pub fn save(canvas: &RgbaImage, path: &Path, output: &OutputConfig) -> Result<(), ExportError> {
    let writer = BufWriter::new(File::create(path)?);
    let encode_err = |e: image::ImageError| ExportError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let (width, height) = canvas.dimensions();

    match output.format {
        OutputFormat::Png => image::codecs::png::PngEncoder::new(writer)
            .write_image(canvas.as_raw(), width, height, image::ExtendedColorType::Rgba8)
            .map_err(encode_err)?,
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
            image::codecs::jpeg::JpegEncoder::new_with_quality(writer, output.quality)
                .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
                .map_err(encode_err)?
        }
        OutputFormat::Webp => image::codecs::webp::WebPEncoder::new_lossless(writer)
            .write_image(canvas.as_raw(), width, height, image::ExtendedColorType::Rgba8)
            .map_err(encode_err)?,
    }

    tracing::debug!(path = %path.display(), width, height, "saved framed image");
    Ok(())
}
