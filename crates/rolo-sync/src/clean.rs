//! Field normalization for a freshly merged book.
//!
//! Cleans the raw stringified card values into display text and imposes a
//! stable column order. Running the pass twice yields the same table as
//! running it once.

use std::sync::LazyLock;

use regex::Regex;
use rolo_core::{Book, Progress, ProgressFn, emit};

const STAGE_PREPARE: &str = "Prepare data";

/// Columns pinned to the front of the table, in this order; the rest
/// follow lexicographically.
pub const PRIORITY_FIELDS: [&str; 8] = [
  "categories",
  "fn",
  "n",
  "org",
  "role",
  "email",
  "adr",
  "tel",
];

// One enclosing pair of list brackets.
static OUTER_BRACKETS: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\[([\s\S]*)\]$").unwrap());
// A tagged entry `<name{TYPES} payload>`, with an optional trailing comma.
static TAGGED_ENTRY: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<[\w-]+(\{[^}]*\})([^>]+)>,?").unwrap());
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());
static LEADING_EMPTY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*,\s*").unwrap());

/// The four structural transforms, applied in order to a single value.
fn clean_value(value: &str) -> String {
  let value = OUTER_BRACKETS.replace(value, "$1");
  let value = TAGGED_ENTRY.replace_all(&value, "$1$2;");
  let value = MULTI_SPACE.replace_all(&value, " ");
  let value = LEADING_EMPTY.replace(&value, "");
  value.into_owned()
}

/// Normalize every value and reorder the columns of `book` in place.
pub fn cleanup(book: &mut Book, progress: Option<ProgressFn<'_>>) {
  emit(
    progress,
    Progress::at(0, 0, 3, "Formatting the database", STAGE_PREPARE),
  );

  // Scrub placeholder tokens so missing data reads as empty, then drop
  // the columns that carry nothing at all.
  for record in book.records_mut() {
    for value in record.fields.values_mut() {
      if value == "nan" {
        value.clear();
      }
    }
  }
  book.drop_empty_columns();

  emit(
    progress,
    Progress::at(1, 0, 3, "Cleaning tags", STAGE_PREPARE),
  );

  for record in book.records_mut() {
    for value in record.fields.values_mut() {
      *value = clean_value(value);
    }
  }

  emit(
    progress,
    Progress::at(2, 0, 3, "Sorting data", STAGE_PREPARE),
  );

  book.set_column_order(sorted_columns(book.columns()));

  emit(progress, Progress::at(3, 0, 3, "Sorted", STAGE_PREPARE));
}

/// Priority prefix first (omitting absent names), then everything else in
/// lexicographic order.
fn sorted_columns(columns: &[String]) -> Vec<String> {
  let mut rest: Vec<String> = columns
    .iter()
    .filter(|c| !PRIORITY_FIELDS.contains(&c.as_str()))
    .cloned()
    .collect();
  rest.sort();

  PRIORITY_FIELDS
    .iter()
    .filter(|p| columns.iter().any(|c| c == *p))
    .map(|p| p.to_string())
    .chain(rest)
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
