//! Standard task actions.
//!
//! Each action touches a disjoint part of the image: the runtime directory,
//! launcher files, application content, or one metadata file. Actions of
//! tasks without an ordering between them may run concurrently.

mod content;
mod copy;
mod launcher;
mod metadata;
mod script;

pub use content::copy_content;
pub use copy::copy_app_image;
pub use launcher::{LAUNCHER_RESOURCE, launcher_config, write_launchers};
pub use metadata::{PACKAGE_FILE, write_app_image_file, write_package_file};
pub use script::{APP_IMAGE_DIR_VAR, post_image_script_name, run_post_image_script};

use crate::{error::Result, layout::AppImageLayout, pipeline::AppImageBuildEnv};

/// Creates the runtime with the application's runtime builder, if any.
pub fn create_runtime(ctx: &AppImageBuildEnv<'_, AppImageLayout>) -> Result<()> {
    match ctx.app.runtime_builder() {
        Some(builder) => builder.create_runtime(ctx.layout),
        None => {
            log::debug!("No runtime builder for {}", ctx.app.name());
            Ok(())
        }
    }
}
