//! Input discovery and decoding.
//!
//! Inputs given on the command line can be files or directories. Directories
//! are walked recursively; only files with a decodable extension are kept and
//! the result is sorted by path so batches are reproducible.
//!
//! Decoding runs on the rayon pool. Results come back in input order, one per
//! path, so a failed decode never shifts the indices of its neighbours.
//! [`ChunkedLoader`] decodes a chunk at a time on demand, so a long batch never
//! holds more than one chunk of decoded photos.

use image::{DynamicImage, ImageReader};
use rayon::prelude::*;
use std::borrow::Borrow;
use std::path::{Path, PathBuf};
use std::vec;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("input not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot walk {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Extensions the enabled `image` codecs can decode.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];

/// A decoded input image.
#[derive(Debug)]
pub struct Source {
    pub path: PathBuf,
    pub image: DynamicImage,
}

impl Borrow<DynamicImage> for Source {
    fn borrow(&self) -> &DynamicImage {
        &self.image
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Expand inputs into an ordered list of image files.
///
/// Explicit files are kept in the order given, even with an unknown
/// extension; the decoder gets the final say on those. Each directory
/// contributes its supported files sorted by path.
pub fn discover(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, SourceError> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(SourceError::NotFound(input.clone()));
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(input.as_path()).to_path_buf();
                let message = e.to_string();
                match e.into_io_error() {
                    Some(io) => SourceError::Io(io),
                    None => SourceError::Walk { path, message },
                }
            })?;
            if entry.file_type().is_file() && is_supported(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        tracing::debug!(dir = %input.display(), count = found.len(), "discovered images");
        files.extend(found);
    }

    Ok(files)
}

/// Decode a single image, guessing the format from its content.
pub fn load(path: &Path) -> Result<DynamicImage, SourceError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| SourceError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Decode every path in parallel, preserving order.
pub fn load_all(paths: &[PathBuf]) -> Vec<Result<Source, SourceError>> {
    paths
        .par_iter()
        .map(|path| {
            load(path).map(|image| Source {
                path: path.clone(),
                image,
            })
        })
        .collect()
}

/// Decodes `paths` lazily, `chunk` at a time in parallel, yielding one
/// result per path in order.
pub struct ChunkedLoader<'a> {
    paths: &'a [PathBuf],
    chunk: usize,
    cursor: usize,
    ready: vec::IntoIter<Result<Source, SourceError>>,
}

impl<'a> ChunkedLoader<'a> {
    /// A `chunk` of 0 is treated as 1.
    pub fn new(paths: &'a [PathBuf], chunk: usize) -> Self {
        Self {
            paths,
            chunk: chunk.max(1),
            cursor: 0,
            ready: Vec::new().into_iter(),
        }
    }
}

impl Iterator for ChunkedLoader<'_> {
    type Item = Result<Source, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ready.as_slice().is_empty() && self.cursor < self.paths.len() {
            let end = (self.cursor + self.chunk).min(self.paths.len());
            tracing::debug!(from = self.cursor, to = end, "decoding chunk");
            self.ready = load_all(&self.paths[self.cursor..end]).into_iter();
            self.cursor = end;
        }
        self.ready.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ready.len() + (self.paths.len() - self.cursor);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkedLoader<'_> {}
