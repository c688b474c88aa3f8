//! Error types for `rolo-sync`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("reading {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("parsing {path}: {source}")]
  Card {
    path: PathBuf,
    #[source]
    source: rolo_vcard::Error,
  },

  /// A store-consistency violation: sync found several records claiming
  /// the same source file. Never auto-repaired.
  #[error("{count} records share source path {path}; the store is corrupt")]
  DuplicateSourcePath { path: String, count: usize },

  #[error(transparent)]
  Store(#[from] rolo_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
