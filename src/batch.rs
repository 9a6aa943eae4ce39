//! Batch framing.
//!
//! The [`BatchDriver`] runs the framer over an ordered list of sources with
//! one shared [`FrameConfig`], strictly one image at a time.
//!
//! ## Failure policy
//!
//! - [`FrameError::InvalidDimension`]: the item is skipped (`None` in the
//!   outputs), an [`BatchEvent::ItemSkipped`] is emitted, the batch continues.
//! - [`FrameError::AllocationFailure`]: the batch stops and returns
//!   [`BatchError::Aborted`]. No [`BatchEvent::Finished`] is emitted.
//! - A source that could not be loaded ([`BatchDriver::frame_stream`]) is
//!   skipped like an invalid one and reported as [`BatchEvent::ItemUnreadable`].
//! - A sink that rejects a framed image ([`BatchDriver::frame_stream`]) is
//!   reported as [`BatchEvent::ItemNotSaved`] and counted as failed.
//!
//! ## Memory
//!
//! [`BatchDriver::frame_stream`] pulls sources from an iterator one at a time
//! and drops each source before pulling the next, so a lazily decoding
//! iterator keeps a single decoded photo resident.
//!
//! ## Notifications
//!
//! Events go to a caller-supplied observer closure, so the caller decides
//! which thread consumes them. [`forward_to`] turns an `mpsc::Sender` into an
//! observer for the usual printer-thread setup:
//!
//! ```text
//! Started { total: 3 }
//! ItemFramed { index: 0, completed: 1 }
//! ItemSkipped { index: 1, .. }          // zero-area source
//! ItemFramed { index: 2, completed: 2 }
//! Finished { framed: 2, skipped: 1, failed: 0 } // once; progress resets
//! ```
//!
//! ## Pacing
//!
//! An optional delay between items bounds sustained CPU and memory pressure
//! when framing large photos. It is never applied after the last item.

use crate::framing::{FrameBackend, FrameConfig, FrameError, frame_image};
use image::{DynamicImage, RgbaImage};
use std::borrow::Borrow;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch aborted at item {index}: {source}")]
    Aborted { index: usize, source: FrameError },
}

/// Progress notifications, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    ItemFramed {
        index: usize,
        /// Running count of framed items in this batch.
        completed: usize,
        canvas_side: u32,
    },
    ItemSkipped {
        index: usize,
        reason: FrameError,
    },
    /// The source could not be loaded.
    ItemUnreadable {
        index: usize,
        message: String,
    },
    /// The image was framed but the sink rejected it.
    ItemNotSaved {
        index: usize,
        message: String,
    },
    /// Cancellation was observed before item `total - remaining`.
    Cancelled {
        remaining: usize,
    },
    Finished {
        framed: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub framed: usize,
    /// Invalid or unreadable sources.
    pub skipped: usize,
    /// Framed images the sink rejected.
    pub failed: usize,
    pub cancelled: bool,
}

/// Outputs of a finished batch, one slot per source in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// `None` for skipped or cancelled items.
    pub outputs: Vec<Option<RgbaImage>>,
    pub summary: BatchSummary,
}

/// Shared flag to stop a batch between items.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Observer that forwards every event to `tx`.
///
/// A disconnected receiver is ignored; the batch keeps going.
pub fn forward_to(tx: Sender<BatchEvent>) -> impl FnMut(&BatchEvent) {
    move |event| {
        let _ = tx.send(event.clone());
    }
}

/// Sequential batch runner.
///
/// The progress counter belongs to the driver: run one batch at a time per
/// driver if you read [`BatchDriver::progress`].
pub struct BatchDriver<B: FrameBackend> {
    backend: B,
    pacing: Duration,
    cancel: Option<CancelToken>,
    progress: AtomicUsize,
}

impl<B: FrameBackend> BatchDriver<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pacing: Duration::ZERO,
            cancel: None,
            progress: AtomicUsize::new(0),
        }
    }

    /// Sleep for `pacing` between items.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Items framed so far in the running batch; zero between batches.
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::SeqCst)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Frame `sources` in order as they are pulled from an iterator.
    ///
    /// Each output goes to `sink` as soon as it is ready; only outputs the
    /// sink accepts count as framed. Sources are pulled lazily and never
    /// after cancellation.
    pub fn frame_stream<I, S, E, O, K, W>(
        &self,
        sources: I,
        config: &FrameConfig,
        mut observer: O,
        mut sink: K,
    ) -> Result<BatchSummary, BatchError>
    where
        I: IntoIterator<Item = Result<S, E>>,
        I::IntoIter: ExactSizeIterator,
        S: Borrow<DynamicImage>,
        E: fmt::Display,
        O: FnMut(&BatchEvent),
        K: FnMut(usize, RgbaImage) -> Result<(), W>,
        W: fmt::Display,
    {
        let mut sources = sources.into_iter();
        let total = sources.len();
        let mut summary = BatchSummary::default();
        self.progress.store(0, Ordering::SeqCst);
        tracing::info!(total, ?config, "starting batch");
        observer(&BatchEvent::Started { total });

        for index in 0..total {
            if self.is_cancelled() {
                tracing::info!(index, "batch cancelled");
                summary.cancelled = true;
                observer(&BatchEvent::Cancelled {
                    remaining: total - index,
                });
                break;
            }
            let Some(item) = sources.next() else {
                break;
            };

            let source = match item {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping unreadable image");
                    summary.skipped += 1;
                    observer(&BatchEvent::ItemUnreadable {
                        index,
                        message: e.to_string(),
                    });
                    self.pace(index, total);
                    continue;
                }
            };

            let image: &DynamicImage = source.borrow();
            match frame_image(&self.backend, image, config) {
                Ok(framed) => {
                    let canvas_side = framed.width();
                    match sink(index, framed) {
                        Ok(()) => {
                            let completed = self.progress.fetch_add(1, Ordering::SeqCst) + 1;
                            summary.framed += 1;
                            observer(&BatchEvent::ItemFramed {
                                index,
                                completed,
                                canvas_side,
                            });
                        }
                        Err(e) => {
                            tracing::warn!(index, error = %e, "framed image not saved");
                            summary.failed += 1;
                            observer(&BatchEvent::ItemNotSaved {
                                index,
                                message: e.to_string(),
                            });
                        }
                    }
                }
                Err(reason) if reason.is_recoverable() => {
                    tracing::warn!(index, %reason, "skipping image");
                    summary.skipped += 1;
                    observer(&BatchEvent::ItemSkipped { index, reason });
                }
                Err(reason) => {
                    tracing::error!(index, %reason, "aborting batch");
                    self.progress.store(0, Ordering::SeqCst);
                    return Err(BatchError::Aborted {
                        index,
                        source: reason,
                    });
                }
            }
            drop(source);

            self.pace(index, total);
        }

        tracing::info!(
            framed = summary.framed,
            skipped = summary.skipped,
            failed = summary.failed,
            "batch finished"
        );
        observer(&BatchEvent::Finished {
            framed: summary.framed,
            skipped: summary.skipped,
            failed: summary.failed,
        });
        self.progress.store(0, Ordering::SeqCst);
        Ok(summary)
    }

    /// Sleep between items, never after the last one.
    fn pace(&self, index: usize, total: usize) {
        if index + 1 < total && !self.pacing.is_zero() {
            std::thread::sleep(self.pacing);
        }
    }

    /// Frame `sources` in order, handing each output to `sink` as soon as it
    /// is ready and every notification to `observer`.
    pub fn frame_each<S, O, K>(
        &self,
        sources: &[S],
        config: &FrameConfig,
        observer: O,
        mut sink: K,
    ) -> Result<BatchSummary, BatchError>
    where
        S: Borrow<DynamicImage>,
        O: FnMut(&BatchEvent),
        K: FnMut(usize, RgbaImage),
    {
        let sources = sources
            .iter()
            .map(|s| Ok::<&DynamicImage, Infallible>(Borrow::<DynamicImage>::borrow(s)));
        self.frame_stream(sources, config, observer, |index, framed| {
            sink(index, framed);
            Ok::<(), Infallible>(())
        })
    }

    /// Frame `sources` and collect the outputs, reporting to `observer`.
    pub fn frame_all_observed<S, O>(
        &self,
        sources: &[S],
        config: &FrameConfig,
        observer: O,
    ) -> Result<BatchOutcome, BatchError>
    where
        S: Borrow<DynamicImage>,
        O: FnMut(&BatchEvent),
    {
        let mut outputs: Vec<Option<RgbaImage>> = vec![None; sources.len()];
        let summary = self.frame_each(sources, config, observer, |index, framed| {
            outputs[index] = Some(framed);
        })?;
        Ok(BatchOutcome { outputs, summary })
    }

    /// Frame `sources` and collect the outputs.
    pub fn frame_all<S>(
        &self,
        sources: &[S],
        config: &FrameConfig,
    ) -> Result<BatchOutcome, BatchError>
    where
        S: Borrow<DynamicImage>,
    {
        self.frame_all_observed(sources, config, |_| {})
    }

    /// Frame `sources` with plain callbacks: `on_progress` gets the running
    /// count after each framed item, `on_done` runs once after the last item.
    pub fn frame_all_with_callbacks<S, P, D>(
        &self,
        sources: &[S],
        config: &FrameConfig,
        mut on_progress: P,
        on_done: D,
    ) -> Result<BatchOutcome, BatchError>
    where
        S: Borrow<DynamicImage>,
        P: FnMut(usize),
        D: FnOnce(),
    {
        let mut on_done = Some(on_done);
        self.frame_all_observed(sources, config, |event| match event {
            BatchEvent::ItemFramed { completed, .. } => on_progress(*completed),
            BatchEvent::Finished { .. } => {
                if let Some(done) = on_done.take() {
                    done();
                }
            }
            _ => {}
        })
    }
}
