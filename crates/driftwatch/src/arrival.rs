//! Arrival detection over the source directory.
//!
//! A pure set difference: list regular files directly under the source
//! directory, filter to the configured extension, subtract the basenames the
//! ingested-file ledger already knows.

use crate::error::PipelineError;
use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Unseen data files under `source_dir`, by basename.
///
/// Non-recursive; subdirectories and non-matching extensions are ignored.
/// An empty or fully-known directory yields the empty set. A missing or
/// unreadable directory is fatal for the invocation, not retried.
pub fn detect_new_files(
    source_dir: &Path,
    extension: &str,
    known: &BTreeSet<String>,
) -> Result<BTreeSet<String>, PipelineError> {
    if !source_dir.is_dir() {
        return Err(source_unavailable(
            source_dir,
            io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut fresh = BTreeSet::new();

    for entry in WalkDir::new(source_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| {
            let io_err = err
                .into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "walk failed"));
            source_unavailable(source_dir, io_err)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let matches_extension = Path::new(&name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));

        if matches_extension && !known.contains(&name) {
            fresh.insert(name);
        }
    }

    Ok(fresh)
}

fn source_unavailable(path: &Path, source: io::Error) -> PipelineError {
    PipelineError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    }
}
