use std::{
    ffi::OsString,
    fs::{File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::error::{TrecError, TrecResult};

pub const LOCK_SUFFIX: &str = ".lock";

/// Advisory lock on an output file, shared with every process that can see the
/// output directory.
///
/// The lock is a marker file next to the target, named `<file name>.lock`. It
/// is created with a single create-only open, so two processes racing on the
/// same target cannot both succeed. A marker left behind by a killed process
/// has to be removed by hand.
#[derive(Debug, Default)]
pub struct LockFile {
    held: Option<HeldLock>,
}

#[derive(Debug)]
struct HeldLock {
    file: File,
    path: PathBuf,
}

impl LockFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the marker guarding `target`.
    pub fn lock_path(target: &Path) -> PathBuf {
        let mut filename = OsString::from(target.file_name().unwrap_or_default());
        filename.push(LOCK_SUFFIX);
        target.with_file_name(filename)
    }

    pub fn acquire(&mut self, target: &Path) -> TrecResult<()> {
        if let Some(held) = &self.held {
            return Err(TrecError::AlreadyHeld(held.path.clone()));
        }

        let path = Self::lock_path(target);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(TrecError::AlreadyLocked(path))
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Acquired lock {}", path.display());
        self.held = Some(HeldLock { file, path });
        Ok(())
    }

    pub fn release(&mut self) -> TrecResult<()> {
        let HeldLock { file, path } = self.held.take().ok_or(TrecError::NotHeld)?;

        // The marker must be gone before our handle is closed.
        match std::fs::remove_file(&path) {
            Ok(()) => (),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Lock {} was removed externally", path.display());
            }
            Err(e) => return Err(e.into()),
        }
        drop(file);

        tracing::debug!("Released lock {}", path.display());
        Ok(())
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Marker path while held.
    pub fn path(&self) -> Option<&Path> {
        self.held.as_ref().map(|held| held.path.as_path())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if self.held.is_some() {
            if let Err(e) = self.release() {
                tracing::error!("Failed to release lock: {e}");
            }
        }
    }
}
