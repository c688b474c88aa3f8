//! Progress reporting and cooperative cancellation.
//!
//! Every long-running operation accepts an optional progress sink and an
//! optional [`CancelFlag`]; omitting both yields silent, unabortable,
//! synchronous execution. The 5-field [`Progress`] record is the only
//! contract the pipeline exposes toward a presentation layer.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

/// Step label signalling that the operation was aborted.
pub const STEP_CANCEL: &str = "cancel";
/// Step label asking the consumer to reset its progress display.
pub const STEP_RESET: &str = "reset";

// ─── Progress record ─────────────────────────────────────────────────────────

/// One progress report: `(current, low, high, step label, stage label)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
  pub current: usize,
  pub low:     usize,
  pub high:    usize,
  pub step:    String,
  pub stage:   String,
}

impl Progress {
  pub fn at(current: usize, low: usize, high: usize, step: &str, stage: &str) -> Self {
    Self {
      current,
      low,
      high,
      step: step.to_string(),
      stage: stage.to_string(),
    }
  }

  /// The report emitted when an operation stops at a cancellation point.
  pub fn cancelled(current: usize, stage: &str) -> Self {
    Self::at(current, 0, current, STEP_CANCEL, stage)
  }

  pub fn is_cancel(&self) -> bool {
    self.step == STEP_CANCEL
  }
}

/// Borrowed progress sink; reports are pushed, never polled.
pub type ProgressFn<'a> = &'a (dyn Fn(Progress) + Send + Sync);

/// Push `report` into `sink` if one was supplied.
pub fn emit(sink: Option<ProgressFn<'_>>, report: Progress) {
  if let Some(sink) = sink {
    sink(report);
  }
}

// ─── Cancellation ────────────────────────────────────────────────────────────

/// Shared one-way abort switch, polled at per-item boundaries.
///
/// Setting the flag never rolls back work already committed; it only stops
/// the operation from scheduling further items.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
  inner: Arc<AtomicBool>,
}

impl CancelFlag {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&self) {
    self.inner.store(true, Ordering::SeqCst);
  }

  pub fn is_set(&self) -> bool {
    self.inner.load(Ordering::SeqCst)
  }
}

/// `true` when a flag was supplied and has been set.
pub fn cancel_requested(flag: Option<&CancelFlag>) -> bool {
  flag.is_some_and(CancelFlag::is_set)
}
