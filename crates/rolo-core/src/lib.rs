//! Core types for the rolo contact book.
//!
//! Records, the canonical store ([`Book`]) with its index-based view
//! projection, and the progress/cancellation contract shared by all
//! long-running pipeline stages. This crate is deliberately free of HTTP
//! and filesystem dependencies; all other crates depend on it.

pub mod book;
pub mod error;
pub mod progress;
pub mod record;

pub use book::{Book, View};
pub use error::{Error, Result};
pub use progress::{
  CancelFlag, Progress, ProgressFn, STEP_CANCEL, STEP_RESET, cancel_requested, emit,
};
pub use record::{GeoHit, GeoResult, Record};
