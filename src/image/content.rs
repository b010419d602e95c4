//! Application files and content directories.

use crate::{
    error::{ConfigError, Result},
    layout::ApplicationLayout,
    pipeline::AppImageBuildEnv,
    utils::fs,
};
use std::path::PathBuf;

/// Copies the input directory into the app directory, the modules directory
/// into the app mods directory and every content directory under the content
/// directory.
///
/// The build root and the app image itself are never copied, so an input
/// directory containing them does not recurse into its own output.
pub fn copy_content(ctx: &AppImageBuildEnv<'_, ApplicationLayout>) -> Result<()> {
    let excludes: Vec<PathBuf> = vec![
        ctx.env.build_root().to_path_buf(),
        ctx.env.app_image_dir().to_path_buf(),
    ];

    if let Some(src) = ctx.app.src_dir() {
        log::debug!(
            "Copying application files from {} to {}",
            src.display(),
            ctx.layout.app_directory().display()
        );
        fs::copy_dir(src, ctx.layout.app_directory(), &excludes)?;
    }

    if let Some(mods) = ctx.app.mods_dir() {
        fs::copy_dir(mods, ctx.layout.app_mods_directory(), &excludes)?;
    }

    for dir in ctx.app.content_dirs() {
        let name = dir.file_name().ok_or_else(|| ConfigError::InvalidOption {
            option: "content".into(),
            reason: format!("{} has no directory name", dir.display()),
        })?;
        fs::copy_dir(dir, &ctx.layout.content_directory().join(name), &excludes)?;
    }
    Ok(())
}
