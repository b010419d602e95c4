//! Role-by-role copy between two resolved layouts.

use super::AppImageLayout;
use crate::{error::Result, utils::fs};
use std::path::{Path, PathBuf};

/// Copies every role directory of `src` into the same role of `dst`.
///
/// Roles nested inside another role of the source (e.g., the Linux app
/// directory inside `lib`) are copied once, as part of their parent. Roles
/// whose source directory does not exist are skipped. Paths in `excludes`
/// are not copied.
pub fn copy_layout(src: &AppImageLayout, dst: &AppImageLayout, excludes: &[PathBuf]) -> Result<()> {
    let mut pairs: Vec<(&Path, &Path)> = src
        .roles()
        .filter_map(|role| Some((src.path(role)?, dst.path(role)?)))
        .collect();
    pairs.sort_by_key(|(from, _)| from.components().count());

    let mut copied: Vec<&Path> = Vec::new();
    for (from, to) in pairs {
        if copied.iter().any(|parent| from.starts_with(parent)) {
            continue;
        }
        copied.push(from);
        if !from.exists() {
            log::debug!("Skipping missing layout directory {}", from.display());
            continue;
        }
        log::debug!("Copying {} to {}", from.display(), to.display());
        fs::copy_dir(from, to, excludes)?;
    }
    Ok(())
}
