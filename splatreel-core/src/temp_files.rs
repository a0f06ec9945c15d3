//! Scratch files written next to a run's outputs.
//!
//! Frames handed to the predictor live in [`scratch_file`]s that vanish on
//! drop. Files produced by another process are first written to a
//! [`staging_path`] and renamed into place once complete, so a session
//! directory never holds a half-written PLY under its final name.

use crate::error::CoreResult;

use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

use std::fs;
use std::path::{Path, PathBuf};

/// Length of the random part of a staging file name.
const STAGING_SUFFIX_LEN: usize = 8;

/// Creates `{dir}/{prefix}_XXXXXX.{extension}`, removed when dropped.
pub fn scratch_file(dir: &Path, prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    fs::create_dir_all(dir)?;
    Ok(TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?)
}

/// Picks an unused-looking `{dir}/{prefix}_{random}.{extension}` path without
/// creating it. The caller owns cleanup.
pub fn staging_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STAGING_SUFFIX_LEN)
        .map(char::from)
        .collect();
    dir.join(format!("{prefix}_{suffix}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let file = scratch_file(dir.path(), "frame", "png").unwrap();
            let path = file.path().to_path_buf();
            assert!(path.exists());
            assert!(path.file_name().unwrap().to_string_lossy().starts_with("frame_"));
            assert_eq!(path.extension().unwrap(), "png");
            path
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_staging_path_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let a = staging_path(dir.path(), "native", "ply");
        let b = staging_path(dir.path(), "native", "ply");
        assert!(!a.exists());
        assert_ne!(a, b);
        assert_eq!(a.parent().unwrap(), dir.path());
    }
}
