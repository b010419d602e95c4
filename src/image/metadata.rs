//! Metadata files: `.jpackage.xml` and `.package`.

use crate::{
    app_image_file::AppImageFile,
    error::Result,
    layout::ApplicationLayout,
    pipeline::{AppImageBuildEnv, PackageBuildEnv},
    utils::fs,
};

/// File name of the package marker.
pub const PACKAGE_FILE: &str = ".package";

/// Writes `.jpackage.xml` into the app directory.
pub fn write_app_image_file(ctx: &AppImageBuildEnv<'_, ApplicationLayout>) -> Result<()> {
    let file = AppImageFile::from_application(ctx.app)?;
    log::debug!("Writing {}", AppImageFile::path_in(ctx.layout).display());
    file.save(ctx.layout)
}

/// Writes the package name to `.package` in the app directory.
///
/// Runtime installers have no app directory and get no marker.
pub fn write_package_file(ctx: &PackageBuildEnv<'_>) -> Result<()> {
    let Some(layout) = ctx.env.application_layout() else {
        log::debug!("No app directory in {}; skipping {PACKAGE_FILE}", ctx.env.app_image_dir().display());
        return Ok(());
    };
    fs::write_file(
        &layout.app_directory().join(PACKAGE_FILE),
        ctx.pkg.package_name(),
    )
}
