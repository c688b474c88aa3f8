//! Error types for `rolo-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("row {0} is out of bounds")]
  RowOutOfBounds(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
