//! Header migration through a staging file.
//!
//! The new header and the existing rows are written to a sibling staging
//! file which then replaces the data file with a single rename. Until the
//! rename the data file is untouched; after it the data file is complete.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, StoreError};

/// Suffix appended to the data file name for the staging file.
const STAGING_SUFFIX: &str = ".tmp";

/// A fully written staging file waiting to replace the data file.
#[derive(Debug)]
pub(crate) struct StagedMigration {
    target: PathBuf,
    staging: PathBuf,
}

impl StagedMigration {
    /// Write `header` and, when `copy_rows` is set, every row of `target`
    /// below its header into the staging file.
    pub(crate) fn stage(target: &Path, header: &str, copy_rows: bool) -> Result<Self> {
        let staging = staging_path(target)?;

        if let Err(e) = write_staging(target, &staging, header, copy_rows) {
            // Partial staging files are never committed.
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        debug!(staging = %staging.display(), copy_rows, "header migration staged");
        Ok(Self {
            target: target.to_path_buf(),
            staging,
        })
    }

    #[cfg(test)]
    pub(crate) fn staging(&self) -> &Path {
        &self.staging
    }

    /// Replace the data file with the staging file.
    pub(crate) fn commit(self) -> Result<()> {
        if let Err(source) = fs::rename(&self.staging, &self.target) {
            let _ = fs::remove_file(&self.staging);
            return Err(StoreError::Replace {
                path: self.target.clone(),
                source,
            });
        }

        #[cfg(unix)]
        sync_parent_dir(&self.target);

        debug!(path = %self.target.display(), "header migration committed");
        Ok(())
    }
}

/// Sibling path used for staging: `<file name>.tmp`.
pub(crate) fn staging_path(target: &Path) -> Result<PathBuf> {
    let mut name = target
        .file_name()
        .ok_or_else(|| StoreError::InvalidPath(target.to_path_buf()))?
        .to_os_string();
    name.push(STAGING_SUFFIX);
    Ok(target.with_file_name(name))
}

fn write_staging(target: &Path, staging: &Path, header: &str, copy_rows: bool) -> Result<()> {
    let stage_err = |source| StoreError::Stage {
        path: staging.to_path_buf(),
        source,
    };

    let file = File::create(staging).map_err(stage_err)?;
    let mut out = BufWriter::new(file);
    out.write_all(header.as_bytes()).map_err(stage_err)?;
    out.write_all(b"\n").map_err(stage_err)?;

    if copy_rows {
        copy_rows_below_header(target, &mut out, staging)?;
    }

    let file = out.into_inner().map_err(|e| stage_err(e.into_error()))?;
    file.sync_all().map_err(stage_err)?;
    Ok(())
}

fn copy_rows_below_header(
    target: &Path,
    out: &mut BufWriter<File>,
    staging: &Path,
) -> Result<()> {
    let read_err = |source| StoreError::Read {
        path: target.to_path_buf(),
        source,
    };

    let file = File::open(target).map_err(read_err)?;
    let mut reader = BufReader::new(file);
    let mut line = Vec::new();

    if reader.read_until(b'\n', &mut line).map_err(read_err)? == 0 {
        return Err(StoreError::MissingHeader(target.to_path_buf()));
    }

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).map_err(read_err)? == 0 {
            break;
        }
        out.write_all(trim_line_end(&line))
            .and_then(|()| out.write_all(b"\n"))
            .map_err(|source| StoreError::Stage {
                path: staging.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

/// Strip a trailing `\n` or `\r\n`.
pub(crate) fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
        debug!(dir = %parent.display(), error = %e, "could not sync data directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn staging_path_is_a_sibling() {
        let path = staging_path(Path::new("/var/log/data.csv")).unwrap();
        assert_eq!(path, PathBuf::from("/var/log/data.csv.tmp"));
        assert!(matches!(
            staging_path(Path::new("/")),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn trim_line_end_handles_crlf() {
        assert_eq!(trim_line_end(b"a,b\r\n"), b"a,b");
        assert_eq!(trim_line_end(b"a,b\n"), b"a,b");
        assert_eq!(trim_line_end(b"a,b"), b"a,b");
    }

    #[test]
    fn stage_copies_rows_and_normalises_endings() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("data.csv");
        fs::write(&target, "x,y\r\n1,2\r\n3,4").unwrap();

        let staged = StagedMigration::stage(&target, "x,y,z", true).unwrap();
        assert_eq!(
            fs::read_to_string(staged.staging()).unwrap(),
            "x,y,z\n1,2\n3,4\n"
        );
        // Nothing replaced yet.
        assert_eq!(fs::read_to_string(&target).unwrap(), "x,y\r\n1,2\r\n3,4");

        staged.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "x,y,z\n1,2\n3,4\n");
        assert!(!staging_path(&target).unwrap().exists());
    }

    #[test]
    fn stage_without_rows_writes_header_only() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("data.csv");
        fs::write(&target, "old,header\n").unwrap();

        let staged = StagedMigration::stage(&target, "Timestamp,a", false).unwrap();
        staged.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "Timestamp,a\n");
    }

    #[test]
    fn failed_rename_reports_replace_and_drops_staging() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("data.csv");
        fs::write(&target, "a\n1\n").unwrap();

        let staged = StagedMigration::stage(&target, "a,b", true).unwrap();
        // A non-empty directory cannot be replaced by a file.
        fs::remove_file(&target).unwrap();
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let err = staged.commit().unwrap_err();
        assert!(matches!(err, StoreError::Replace { .. }));
        assert!(target.join("keep").exists());
        assert!(!staging_path(&target).unwrap().exists());
    }

    #[test]
    fn stage_failure_leaves_target_alone() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("data.csv");
        fs::write(&target, "a\n1\n").unwrap();
        // A directory squatting on the staging path makes creation fail.
        fs::create_dir(staging_path(&target).unwrap()).unwrap();

        let err = StagedMigration::stage(&target, "a,b", true).unwrap_err();
        assert!(matches!(err, StoreError::Stage { .. }));
        assert_eq!(fs::read_to_string(&target).unwrap(), "a\n1\n");
    }
}
