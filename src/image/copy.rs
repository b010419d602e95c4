//! Copy of a predefined app image into the package staging directory.

use crate::{
    app_image_file::AppImageFile,
    error::Result,
    layout::{AppImageLayout, ApplicationLayout, copy_layout},
    model::Package,
};

/// Copies every role of `src` into `dst`, leaving out `.jpackage.xml`.
pub fn copy_app_image(pkg: &Package, src: &AppImageLayout, dst: &AppImageLayout) -> Result<()> {
    log::info!(
        "Copying app image of {} from {} to {}",
        pkg.package_name(),
        src.root_directory().display(),
        dst.root_directory().display()
    );
    let excludes = match ApplicationLayout::from_layout(src.clone()) {
        Ok(layout) => vec![AppImageFile::path_in(&layout)],
        Err(_) => Vec::new(),
    };
    copy_layout(src, dst, &excludes)
}
