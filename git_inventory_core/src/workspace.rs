use crate::error::{Error, ErrorKind, Result};

use std::path::{Component, Path, PathBuf};

use log::{trace, warn};
use tempfile::TempDir;

const PREFIX: &str = "git-inventory-";

/// Temporary checkout directory.
///
/// The directory and everything cloned into it is removed when the value is
/// dropped, whichever way the clone and parse sequence ends.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir()?;
        trace!("workspace created: {:?}", dir.path());
        Ok(Workspace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Resolve `relative` inside the checkout, refusing paths that escape it.
    pub fn locate(&self, relative: &Path) -> Result<PathBuf> {
        let escapes = relative.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if escapes {
            return Err(Error::new(
                ErrorKind::Configuration,
                format!(
                    "inventory path \"{}\" must be relative to the repository root",
                    relative.display()
                ),
            ));
        }

        let path = self.path().join(relative);
        if !path.is_file() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!(
                    "Inventory file \"{}\" not found in repository",
                    relative.display()
                ),
            ));
        }
        Ok(path)
    }

    /// Remove the directory now, reporting failures instead of ignoring them
    /// as `Drop` does.
    pub fn close(self) {
        let path = self.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => trace!("workspace removed: {path:?}"),
            Err(e) => warn!("failed to remove {path:?}: {e}"),
        }
    }
}
