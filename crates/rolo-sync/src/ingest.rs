//! Directory scan and incremental sync.
//!
//! Both operations walk the directory in lexicographic file-name order so
//! progress reporting and hashing are reproducible across runs. The
//! cancel flag is polled once per file; a set flag stops the walk after
//! the current file and returns the partial result without rollback.

use std::{
  fs,
  path::{Path, PathBuf},
};

use rolo_core::{Book, CancelFlag, Progress, ProgressFn, Record, cancel_requested, emit};

use crate::{
  error::{Error, Result},
  hash::hash_file,
};

/// File extension a card file must carry to be considered.
pub const CARD_EXTENSION: &str = "vcf";

const STEP_PARSING: &str = "Parsing files";
const STAGE_READING: &str = "Reading directory";

// ─── Directory helpers ───────────────────────────────────────────────────────

/// Card files in `dir`, sorted by file name. Not recursive.
fn card_files(dir: &Path) -> Result<Vec<PathBuf>> {
  let entries = fs::read_dir(dir).map_err(|source| Error::Io {
    path: dir.to_path_buf(),
    source,
  })?;

  let mut files: Vec<PathBuf> = Vec::new();
  for entry in entries {
    let entry = entry.map_err(|source| Error::Io {
      path: dir.to_path_buf(),
      source,
    })?;
    let path = entry.path();
    if path.extension().is_some_and(|ext| ext == CARD_EXTENSION) && path.is_file() {
      files.push(path);
    }
  }
  files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
  Ok(files)
}

/// Read and parse one card file into a record, attaching the source path
/// and content hash. A parse failure is fatal for the whole run.
fn read_card(path: &Path) -> Result<Record> {
  let content = fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let fields = rolo_vcard::parse_card(&content).map_err(|source| Error::Card {
    path: path.to_path_buf(),
    source,
  })?;
  let hash = hash_file(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(Record::new(
    path.to_string_lossy().into_owned(),
    hash,
    fields,
  ))
}

// ─── First run ───────────────────────────────────────────────────────────────

/// Build a fresh book from every card file in `dir`.
pub fn scan_directory(
  dir: &Path,
  progress: Option<ProgressFn<'_>>,
  cancel: Option<&CancelFlag>,
) -> Result<Book> {
  let files = card_files(dir)?;
  let total = files.len();
  let mut book = Book::new();
  let mut done = 0usize;

  for path in &files {
    if cancel_requested(cancel) {
      emit(progress, Progress::cancelled(done, STAGE_READING));
      return Ok(book);
    }
    book.push(read_card(path)?);
    done += 1;
    emit(
      progress,
      Progress::at(done, 0, total, STEP_PARSING, STAGE_READING),
    );
  }

  emit(
    progress,
    Progress::at(done, total, total, STEP_PARSING, STAGE_READING),
  );
  Ok(book)
}

// ─── Incremental sync ────────────────────────────────────────────────────────

/// Reconcile `book` against the current contents of `dir`.
///
/// Per file, matching on `source_path`: no existing record appends a new
/// one; exactly one match is re-hashed and overwritten in place only when
/// the content changed; several matches abort the sync as a
/// data-integrity violation.
pub fn sync_directory(
  dir: &Path,
  book: &mut Book,
  progress: Option<ProgressFn<'_>>,
  cancel: Option<&CancelFlag>,
) -> Result<()> {
  let files = card_files(dir)?;
  let total = files.len();
  let mut done = 0usize;

  for path in &files {
    if cancel_requested(cancel) {
      emit(progress, Progress::cancelled(done, STAGE_READING));
      return Ok(());
    }

    let path_str = path.to_string_lossy().into_owned();
    let rows = book.rows_by_path(&path_str);
    match rows.as_slice() {
      [] => {
        tracing::info!(path = %path_str, "adding");
        book.push(read_card(path)?);
      }
      [row] => {
        let row = *row;
        let hash = hash_file(path).map_err(|source| Error::Io {
          path: path.clone(),
          source,
        })?;
        // Only a content change triggers a reparse; the row keeps its
        // position either way.
        if book.records()[row].source_hash != hash {
          tracing::info!(path = %path_str, "updating");
          book.overwrite(row, read_card(path)?)?;
        }
      }
      rows => {
        return Err(Error::DuplicateSourcePath {
          path: path_str,
          count: rows.len(),
        });
      }
    }

    done += 1;
    emit(
      progress,
      Progress::at(done, 0, total, STEP_PARSING, STAGE_READING),
    );
  }

  emit(
    progress,
    Progress::at(done, total, total, STEP_PARSING, STAGE_READING),
  );
  Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
