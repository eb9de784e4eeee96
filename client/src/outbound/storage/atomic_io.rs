//! Atomic file writes within a capability-scoped directory.
//!
//! Contents go to a hidden temporary sibling first and are renamed over the
//! target, so readers never observe a partial entry.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Component, Utf8Path};
use cap_std::fs::{Dir, OpenOptions};

use crate::domain::ports::CredentialStoreError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `contents` to `path` inside `dir` via temp file and rename.
///
/// `path` must be a bare file name.
pub(super) fn write_atomic(
    dir: &Dir,
    path: &Utf8Path,
    contents: &str,
) -> Result<(), CredentialStoreError> {
    let mut components = path.components();
    let (Some(Utf8Component::Normal(file_name)), None) = (components.next(), components.next())
    else {
        return Err(CredentialStoreError::io(format!(
            "{path}: credential entry must be a bare file name"
        )));
    };
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let tmp_name = format!(
        ".{}.tmp.{}.{}.{}",
        file_name,
        std::process::id(),
        suffix,
        counter
    );

    write_to_temp_file(dir, &tmp_name, contents)?;
    if let Err(err) = rename_temp_to_target(dir, &tmp_name, file_name) {
        if dir.remove_file(&tmp_name).is_err() {
            // Leftover temp files are hidden and harmless.
        }
        return Err(CredentialStoreError::io(format!("{path}: {err}")));
    }
    sync_directory(dir);
    Ok(())
}

/// Remove `name` from `dir`, treating an absent entry as success.
pub(super) fn remove_if_present(dir: &Dir, name: &str) -> Result<(), CredentialStoreError> {
    match dir.remove_file(name) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(CredentialStoreError::io(format!("{name}: {err}"))),
    }
}

/// Read `name` from `dir`; `None` when absent.
pub(super) fn read_if_present(dir: &Dir, name: &str) -> Result<Option<String>, CredentialStoreError> {
    match dir.read(name) {
        Ok(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|err| CredentialStoreError::corrupt(format!("{name}: {err}"))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(CredentialStoreError::io(format!("{name}: {err}"))),
    }
}

fn write_to_temp_file(dir: &Dir, tmp_name: &str, contents: &str) -> Result<(), CredentialStoreError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir
        .open_with(tmp_name, &options)
        .map_err(|err| CredentialStoreError::io(format!("{tmp_name}: {err}")))?;

    let written = file.write_all(contents.as_bytes()).and_then(|()| file.sync_all());
    if let Err(err) = written {
        drop(file);
        drop(dir.remove_file(tmp_name));
        return Err(CredentialStoreError::io(format!("{tmp_name}: {err}")));
    }
    Ok(())
}

#[cfg(windows)]
fn rename_temp_to_target(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    // Windows rename fails if the target exists.
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn rename_temp_to_target(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}

fn sync_directory(dir: &Dir) {
    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Best effort.
    }
}
