//! File system utilities for task actions.
//!
//! Task actions run on the blocking thread pool, so these helpers use
//! `std::fs` directly. Directory copies preserve symlinks and skip any path
//! listed in an exclude list. Excludes are compared as absolute paths, so a
//! relative input directory and a relative build root still match.

use crate::{
    bail,
    error::{ErrorExt, Result},
};
use path_absolutize::Absolutize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Creates all of the directories of the specified path.
pub fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).fs_context("removing directory", path)
    } else {
        Ok(())
    }
}

/// Returns true if the directory does not exist or has no entries.
pub fn is_empty_dir(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    let mut entries = fs::read_dir(path).fs_context("listing directory", path)?;
    Ok(entries.next().is_none())
}

/// Writes `contents` to `path`, creating any parent directories as needed.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    fs::write(path, contents).fs_context("writing file", path)
}

/// Marks a file as executable (0755) on Unix. No-op elsewhere.
pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .fs_context("setting executable permission", path)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Entries whose path equals or lies under any of `excludes` are skipped
/// together with their subtrees. Existing files at the destination are
/// overwritten. Preserves symlinks on platforms that support them.
pub fn copy_dir(from: &Path, to: &Path, excludes: &[PathBuf]) -> Result<()> {
    if !from.exists() {
        bail!("{from:?} does not exist");
    }
    if !from.is_dir() {
        bail!("{from:?} is not a directory");
    }
    create_dir_all(to)?;

    let from = absolute(from)?;
    let excludes = excludes
        .iter()
        .map(|ex| absolute(ex))
        .collect::<Result<Vec<_>>>()?;

    let mut walker = walkdir::WalkDir::new(&from).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry?;
        if excludes.iter().any(|ex| entry.path().starts_with(ex)) {
            log::debug!("Excluding {} from copy", entry.path().display());
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        let rel_path = entry.path().strip_prefix(&from)?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path()).fs_context("reading link", entry.path())?;
            if dest_path.symlink_metadata().is_ok() {
                fs::remove_file(&dest_path).fs_context("replacing link", &dest_path)?;
            }
            let linked = if entry.path().is_dir() {
                symlink_dir(&target, &dest_path)
            } else {
                symlink_file(&target, &dest_path)
            };
            linked.fs_context("creating link", &dest_path)?;
        } else if entry.file_type().is_dir() {
            create_dir_all(&dest_path)?;
        } else {
            fs::copy(entry.path(), &dest_path).fs_context("copying file", entry.path())?;
        }
    }

    Ok(())
}

/// Makes `path` absolute against the working directory without touching the
/// file system, so paths that do not exist yet resolve too.
fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .fs_context("resolving path", path)?
        .into_owned())
}
