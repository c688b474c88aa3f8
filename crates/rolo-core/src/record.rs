//! Contact records and the geocode result attached to them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ─── Geocode result ──────────────────────────────────────────────────────────

/// One hit returned by the geocoding endpoint.
///
/// The upstream wire format carries `lat`/`lon` as strings; everything else
/// it returns is kept verbatim in `rest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoHit {
  pub lat: String,
  pub lon: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  #[serde(flatten)]
  pub rest: BTreeMap<String, serde_json::Value>,
}

/// The outcome of a full resolution attempt for one record.
///
/// An empty `hits` list means the record was looked up and explicitly not
/// found, as opposed to never attempted (`Record::geo == None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
  /// The cleaned, flattened address text the queries were derived from.
  pub hint:  String,
  /// One hit per address variant that resolved.
  pub hits:  Vec<GeoHit>,
  /// Whether any variant resolved on the first, most specific query.
  pub exact: bool,
}

impl GeoResult {
  pub fn found(&self) -> bool {
    !self.hits.is_empty()
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One contact, as parsed from a single card file.
///
/// Card fields are schema-less: the map holds whatever tags the card used,
/// and an absent field reads as empty. The identity of a record is its
/// `source_path`; `source_hash` is the SHA-256 of the file bytes at last
/// read and drives incremental sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub source_path: String,
  pub source_hash: String,
  /// True until geocoding has run to completion for this record.
  pub needs_geo_update: bool,
  /// Set when a value is edited through the view interface.
  #[serde(default)]
  pub changed: bool,
  pub fields: BTreeMap<String, String>,
  #[serde(default)]
  pub geo: Option<GeoResult>,
}

impl Record {
  pub fn new(source_path: String, source_hash: String, fields: BTreeMap<String, String>) -> Self {
    Self {
      source_path,
      source_hash,
      needs_geo_update: true,
      changed: false,
      fields,
      geo: None,
    }
  }

  /// The value of `field`, or the empty string when the card never set it.
  pub fn get(&self, field: &str) -> &str {
    self.fields.get(field).map(String::as_str).unwrap_or("")
  }

  pub fn set(&mut self, field: &str, value: &str) {
    self.fields.insert(field.to_string(), value.to_string());
  }

  pub fn field_names(&self) -> impl Iterator<Item = &str> {
    self.fields.keys().map(String::as_str)
  }
}
