//! ETag computation for ContactView resources.
//!
//! ETags are SHA-256 hashes over the sorted (fact_id, recorded_at) pairs of
//! all active facts. Ordering is deterministic regardless of insertion order.

use chrono::{DateTime, Utc};
use kith_core::lifecycle::ContactView;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Compute an ETag for the given `ContactView`.
///
/// Stable: same active facts in any order → same ETag.
pub fn compute_etag(view: &ContactView) -> String {
  let mut pairs: Vec<(Uuid, DateTime<Utc>)> = view
    .active_facts
    .iter()
    .map(|rf| (rf.fact.fact_id, rf.fact.recorded_at))
    .collect();
  compute_etag_from_pairs(&mut pairs)
}

/// Compute an ETag directly from (fact_id, recorded_at) pairs.
///
/// The slice is sorted in-place for determinism.
pub fn compute_etag_from_pairs(pairs: &mut [(Uuid, DateTime<Utc>)]) -> String {
  pairs.sort_by_key(|(id, _)| *id);

  let mut hasher = Sha256::new();
  for (id, ts) in pairs.iter() {
    hasher.update(id.as_bytes());
    hasher.update(ts.timestamp_micros().to_le_bytes());
  }
  let hash = hasher.finalize();
  format!("\"{}\"", hex::encode(hash))
}
