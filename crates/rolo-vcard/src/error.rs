//! Error types for `rolo-vcard`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing BEGIN:VCARD / END:VCARD envelope")]
  MissingEnvelope,

  #[error("malformed content line: {0:?}")]
  MalformedLine(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
