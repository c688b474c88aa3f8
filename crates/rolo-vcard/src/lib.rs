//! Card-format codec for rolo.
//!
//! Parses a single vCard file into the flat field map a
//! [`rolo_core`](../rolo_core) record carries. Pure synchronous; no HTTP
//! or filesystem dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! let card = "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Alice Smith\r\nEND:VCARD\r\n";
//! let fields = rolo_vcard::parse_card(card).unwrap();
//! assert_eq!(fields["fn"], "[Alice Smith]");
//! ```

pub mod error;
mod parse;

use std::collections::BTreeMap;

pub use error::{Error, Result};

/// Parse one card into its stringified field map.
///
/// Every field folds to a single string: entries are listed inside one
/// pair of brackets, and an entry carrying type tags renders as
/// `<name{TAG1,TAG2} value>`. The normalizer later collapses these shapes
/// into display text; keeping them here preserves the tag information
/// through the schema-less table.
pub fn parse_card(input: &str) -> Result<BTreeMap<String, String>> {
  let properties = parse::parse_one(input)?;
  Ok(parse::fold_fields(&properties))
}
