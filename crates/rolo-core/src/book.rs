//! [`Book`] — the canonical contact table and its view projection.

use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  record::Record,
};

// ─── Book ────────────────────────────────────────────────────────────────────

/// The canonical, ordered collection of contact records.
///
/// Records are unique by `source_path`; enforcing that invariant is the
/// sync stage's job, the book only reports how many rows share a path.
/// The set of known field names grows as cards introduce new tags and is
/// tracked separately from the records, in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
  records: Vec<Record>,
  columns: Vec<String>,
  #[serde(skip)]
  query:   String,
  #[serde(skip)]
  hidden:  Vec<String>,
}

impl Book {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn records(&self) -> &[Record] {
    &self.records
  }

  /// Mutable access for the pipeline stages (normalizer, resolver), which
  /// rewrite values wholesale rather than editing through the view.
  pub fn records_mut(&mut self) -> &mut [Record] {
    &mut self.records
  }

  pub fn record(&self, row: usize) -> Option<&Record> {
    self.records.get(row)
  }

  pub fn columns(&self) -> &[String] {
    &self.columns
  }

  // ── Growth ────────────────────────────────────────────────────────────

  /// Register a field name, keeping first-registered order.
  pub fn note_column(&mut self, name: &str) {
    if !self.columns.iter().any(|c| c == name) {
      self.columns.push(name.to_string());
    }
  }

  /// Append a record, registering any field names it introduces.
  pub fn push(&mut self, record: Record) {
    for name in record.field_names() {
      if !self.columns.iter().any(|c| c == name) {
        self.columns.push(name.to_string());
      }
    }
    self.records.push(record);
  }

  /// Overwrite the record at `row`, registering any new field names. The
  /// row keeps its position.
  pub fn overwrite(&mut self, row: usize, record: Record) -> Result<()> {
    if row >= self.records.len() {
      return Err(Error::RowOutOfBounds(row));
    }
    for name in record.field_names() {
      if !self.columns.iter().any(|c| c == name) {
        self.columns.push(name.to_string());
      }
    }
    self.records[row] = record;
    Ok(())
  }

  /// Rows whose record originates from `path`. More than one element is a
  /// store-consistency violation the caller must surface.
  pub fn rows_by_path(&self, path: &str) -> Vec<usize> {
    self
      .records
      .iter()
      .enumerate()
      .filter(|(_, r)| r.source_path == path)
      .map(|(i, _)| i)
      .collect()
  }

  // ── Column maintenance ────────────────────────────────────────────────

  /// Drop every column whose value is empty (or absent) in all records,
  /// from the registry and from the records themselves.
  pub fn drop_empty_columns(&mut self) {
    let records = &self.records;
    let empty: Vec<String> = self
      .columns
      .iter()
      .filter(|c| records.iter().all(|r| r.get(c).is_empty()))
      .cloned()
      .collect();
    self.columns.retain(|c| !empty.contains(c));
    for record in &mut self.records {
      record.fields.retain(|name, _| !empty.contains(name));
    }
  }

  /// Replace the column display order. Field values are untouched; this
  /// only affects how projections lay columns out.
  pub fn set_column_order(&mut self, order: Vec<String>) {
    self.columns = order;
  }

  // ── View projection ───────────────────────────────────────────────────

  pub fn set_query(&mut self, query: &str) {
    self.query = query.to_string();
  }

  pub fn set_hidden(&mut self, hidden: Vec<String>) {
    self.hidden = hidden;
  }

  /// Compute the current view: indices of the rows matching the text
  /// query, and the visible columns in display order.
  ///
  /// The view holds indices into the canonical table, not copies; edits go
  /// through [`Book::set_value`] so there is a single source of truth.
  pub fn view(&self) -> View {
    let needle = self.query.to_lowercase();
    let rows = self
      .records
      .iter()
      .enumerate()
      .filter(|(_, r)| {
        needle.is_empty()
          || r
            .fields
            .values()
            .any(|v| v.to_lowercase().contains(&needle))
      })
      .map(|(i, _)| i)
      .collect();
    let columns = self
      .columns
      .iter()
      .filter(|c| !self.hidden.contains(c))
      .cloned()
      .collect();
    View { rows, columns }
  }

  /// Edit a value on the canonical row behind a view cell; flags the row
  /// as changed.
  pub fn set_value(&mut self, row: usize, field: &str, value: &str) -> Result<()> {
    let record = self
      .records
      .get_mut(row)
      .ok_or(Error::RowOutOfBounds(row))?;
    record.set(field, value);
    record.changed = true;
    if !self.columns.iter().any(|c| c == field) {
      self.columns.push(field.to_string());
    }
    Ok(())
  }
}

// ─── View ────────────────────────────────────────────────────────────────────

/// A filtered, column-restricted projection of the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
  /// Indices into the canonical record table.
  pub rows:    Vec<usize>,
  /// Visible columns, in display order.
  pub columns: Vec<String>,
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use super::*;

  fn record(path: &str, pairs: &[(&str, &str)]) -> Record {
    let fields: BTreeMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    Record::new(path.to_string(), "00".to_string(), fields)
  }

  #[test]
  fn push_unions_columns() {
    let mut book = Book::new();
    book.push(record("a.vcf", &[("fn", "Alice")]));
    book.push(record("b.vcf", &[("fn", "Bob"), ("tel", "+1555")]));

    assert_eq!(book.columns(), ["fn", "tel"]);
    // The earlier record reads the new column as empty.
    assert_eq!(book.record(0).unwrap().get("tel"), "");
  }

  #[test]
  fn overwrite_keeps_position_and_unions_columns() {
    let mut book = Book::new();
    book.push(record("a.vcf", &[("fn", "Alice")]));
    book.push(record("b.vcf", &[("fn", "Bob")]));

    book
      .overwrite(0, record("a.vcf", &[("fn", "Alicia"), ("tel", "+1555")]))
      .unwrap();
    assert_eq!(book.record(0).unwrap().get("fn"), "Alicia");
    assert_eq!(book.columns(), ["fn", "tel"]);

    assert!(matches!(
      book.overwrite(9, record("c.vcf", &[])),
      Err(Error::RowOutOfBounds(9))
    ));
  }

  #[test]
  fn view_filters_rows_case_insensitively() {
    let mut book = Book::new();
    book.push(record("a.vcf", &[("fn", "Alice Martin")]));
    book.push(record("b.vcf", &[("fn", "Bob Durand")]));

    book.set_query("durand");
    assert_eq!(book.view().rows, [1]);

    book.set_query("");
    assert_eq!(book.view().rows, [0, 1]);
  }

  #[test]
  fn view_hides_columns_without_dropping_data() {
    let mut book = Book::new();
    book.push(record("a.vcf", &[("fn", "Alice"), ("note", "secret")]));
    book.set_hidden(vec!["note".to_string()]);

    let view = book.view();
    assert_eq!(view.columns, ["fn"]);
    assert_eq!(book.record(0).unwrap().get("note"), "secret");
  }

  #[test]
  fn edits_through_the_view_reach_the_backing_record() {
    let mut book = Book::new();
    book.push(record("a.vcf", &[("fn", "Alice")]));
    book.push(record("b.vcf", &[("fn", "Bob")]));

    book.set_query("bob");
    let view = book.view();
    let row = view.rows[0];
    book.set_value(row, "fn", "Robert").unwrap();

    assert_eq!(book.record(1).unwrap().get("fn"), "Robert");
    assert!(book.record(1).unwrap().changed);
    assert!(!book.record(0).unwrap().changed);
  }

  #[test]
  fn set_value_out_of_bounds_is_an_error() {
    let mut book = Book::new();
    assert!(matches!(
      book.set_value(3, "fn", "x"),
      Err(Error::RowOutOfBounds(3))
    ));
  }

  #[test]
  fn drop_empty_columns_removes_registry_and_values() {
    let mut book = Book::new();
    book.push(record("a.vcf", &[("fn", "Alice"), ("nickname", "")]));
    book.push(record("b.vcf", &[("fn", "Bob")]));

    book.drop_empty_columns();
    assert_eq!(book.columns(), ["fn"]);
    assert!(!book.record(0).unwrap().fields.contains_key("nickname"));
  }

  #[test]
  fn rows_by_path_reports_duplicates() {
    let mut book = Book::new();
    book.push(record("a.vcf", &[]));
    book.push(record("a.vcf", &[]));
    assert_eq!(book.rows_by_path("a.vcf"), [0, 1]);
    assert_eq!(book.rows_by_path("missing.vcf"), Vec::<usize>::new());
  }
}
