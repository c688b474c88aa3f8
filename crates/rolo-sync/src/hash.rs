//! Content hashing for card files.
//!
//! Hashes are SHA-256 over the raw file bytes, hex-encoded. The hash is
//! what makes sync incremental: an unchanged file is skipped without
//! being reparsed.

use std::{fs::File, io::Read, path::Path};

use sha2::{Digest, Sha256};

const BLOCK_SIZE: usize = 64 * 1024;

/// Hash the file at `path`, streaming in fixed-size blocks.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
  let mut file = File::open(path)?;
  let mut hasher = Sha256::new();
  let mut block = vec![0u8; BLOCK_SIZE];

  loop {
    let read = file.read(&mut block)?;
    if read == 0 {
      break;
    }
    hasher.update(&block[..read]);
  }

  Ok(hex::encode(hasher.finalize()))
}
