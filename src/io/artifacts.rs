//! All-or-nothing artifact writes.
//!
//! Every file is first written next to its destination with a `.partial`
//! suffix. Only when all of them are on disk are they renamed into place.
//! A destination that already exists is moved aside to `.previous` first and
//! put back if a later rename fails, so a failed run leaves the previous
//! plan (or nothing) on disk, never a mix.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::AppError;

const PARTIAL_SUFFIX: &str = ".partial";
const PREVIOUS_SUFFIX: &str = ".previous";

/// A rendered file waiting to be written.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// A destination that has been renamed into place.
struct Placed {
    path: PathBuf,
    backup: Option<PathBuf>,
}

/// Write every artifact, or none of them.
pub fn write_all_or_nothing(artifacts: &[Artifact]) -> Result<(), AppError> {
    if let Some(artifact) = artifacts.iter().find(|a| a.path.is_dir()) {
        return Err(AppError::output(format!(
            "Cannot write '{}': a directory is in the way.",
            artifact.path.display()
        )));
    }

    let mut staged: Vec<PathBuf> = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let tmp = with_suffix(&artifact.path, PARTIAL_SUFFIX);
        if let Err(e) = fs::write(&tmp, &artifact.contents) {
            discard(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(AppError::output(format!(
                "Failed to write '{}': {e}",
                artifact.path.display()
            )));
        }
        staged.push(tmp);
    }

    commit(artifacts, &staged)
}

/// Rename staged files into place. On failure every earlier rename is undone
/// and the staged files are removed.
fn commit(artifacts: &[Artifact], staged: &[PathBuf]) -> Result<(), AppError> {
    let mut placed: Vec<Placed> = Vec::with_capacity(staged.len());

    for (tmp, artifact) in staged.iter().zip(artifacts) {
        match place(tmp, &artifact.path) {
            Ok(p) => placed.push(p),
            Err(e) => {
                roll_back(&placed);
                discard(staged);
                return Err(AppError::output(format!(
                    "Failed to move '{}' into place: {e}",
                    artifact.path.display()
                )));
            }
        }
        debug!(path = %artifact.path.display(), bytes = artifact.contents.len(), "wrote artifact");
    }

    for backup in placed.iter().filter_map(|p| p.backup.as_ref()) {
        if let Err(e) = fs::remove_file(backup) {
            warn!(path = %backup.display(), "could not remove previous artifact: {e}");
        }
    }
    Ok(())
}

fn place(tmp: &Path, dest: &Path) -> io::Result<Placed> {
    let backup = if dest.is_file() {
        let backup = with_suffix(dest, PREVIOUS_SUFFIX);
        fs::rename(dest, &backup)?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(tmp, dest) {
        if let Some(b) = &backup {
            let _ = fs::rename(b, dest);
        }
        return Err(e);
    }
    Ok(Placed {
        path: dest.to_path_buf(),
        backup,
    })
}

/// Undo renames in reverse order.
fn roll_back(placed: &[Placed]) {
    for p in placed.iter().rev() {
        let restored = match &p.backup {
            Some(backup) => fs::rename(backup, &p.path),
            None => fs::remove_file(&p.path),
        };
        if let Err(e) = restored {
            warn!(path = %p.path.display(), "could not roll back artifact: {e}");
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn discard(paths: &[PathBuf]) {
    for p in paths {
        let _ = fs::remove_file(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn partial(path: &Path) -> PathBuf {
        with_suffix(path, PARTIAL_SUFFIX)
    }

    fn previous(path: &Path) -> PathBuf {
        with_suffix(path, PREVIOUS_SUFFIX)
    }

    #[test]
    fn writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("run.dag");
        let b = dir.path().join("run.sub");
        write_all_or_nothing(&[Artifact::new(&a, "dag"), Artifact::new(&b, "sub")]).unwrap();
        assert_eq!(fs::read_to_string(&a).unwrap(), "dag");
        assert_eq!(fs::read_to_string(&b).unwrap(), "sub");
        assert!(!partial(&a).exists());
    }

    #[test]
    fn replaces_existing_files_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("run.dag");
        fs::write(&a, "old dag").unwrap();
        write_all_or_nothing(&[Artifact::new(&a, "new dag")]).unwrap();
        assert_eq!(fs::read_to_string(&a).unwrap(), "new dag");
        assert!(!previous(&a).exists());
    }

    #[test]
    fn failure_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("run.dag");
        let b = dir.path().join("missing").join("run.sub");
        let err = write_all_or_nothing(&[Artifact::new(&a, "dag"), Artifact::new(&b, "sub")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Output);
        assert!(!a.exists());
        assert!(!partial(&a).exists());
    }

    #[test]
    fn directory_at_destination_writes_no_dag() {
        let dir = tempfile::tempdir().unwrap();
        let dag = dir.path().join("run.dag");
        let sub = dir.path().join("run.sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("keep.txt"), "x").unwrap();

        let err = write_all_or_nothing(&[Artifact::new(&dag, "dag"), Artifact::new(&sub, "sub")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Output);
        assert!(!dag.exists());
        assert!(!partial(&dag).exists());
        assert!(!partial(&sub).exists());
        assert!(sub.join("keep.txt").exists());
    }

    #[test]
    fn failed_rename_restores_earlier_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let dag = dir.path().join("run.dag");
        let sub = dir.path().join("run.sub");
        fs::write(&dag, "old dag").unwrap();
        let artifacts = [Artifact::new(&dag, "new dag"), Artifact::new(&sub, "sub")];
        // The second staged file never made it to disk.
        fs::write(partial(&dag), "new dag").unwrap();
        let staged = vec![partial(&dag), partial(&sub)];

        let err = commit(&artifacts, &staged).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Output);
        assert_eq!(fs::read_to_string(&dag).unwrap(), "old dag");
        assert!(!previous(&dag).exists());
        assert!(!partial(&dag).exists());
        assert!(!sub.exists());
    }

    #[test]
    fn failed_rename_removes_fresh_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let dag = dir.path().join("run.dag");
        let sub = dir.path().join("run.sub");
        let artifacts = [Artifact::new(&dag, "dag"), Artifact::new(&sub, "sub")];
        fs::write(partial(&dag), "dag").unwrap();
        let staged = vec![partial(&dag), partial(&sub)];

        assert!(commit(&artifacts, &staged).is_err());
        assert!(!dag.exists());
    }
}
