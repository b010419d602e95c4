//! User script run after the app image is complete.

use crate::{
    config, error::Result, exec::Executor, pipeline::PackageBuildEnv,
    platform::OperatingSystem,
};

/// Environment variable pointing the script at the app image.
pub const APP_IMAGE_DIR_VAR: &str = "JpAppImageDir";

/// Resource name of the script for `package_name`.
pub fn post_image_script_name(package_name: &str) -> String {
    match OperatingSystem::current() {
        OperatingSystem::Windows => format!("{package_name}-post-image.wsf"),
        OperatingSystem::Linux | OperatingSystem::MacOs => format!("{package_name}-post-image.sh"),
    }
}

/// Runs `<package-name>-post-image.sh` (`.wsf` on Windows) from the resource
/// directory, if the user supplied one.
///
/// The script runs in the app image directory with [`APP_IMAGE_DIR_VAR`] set
/// and is killed after the configured tool timeout.
pub fn run_post_image_script(ctx: &PackageBuildEnv<'_>) -> Result<()> {
    let resource = ctx
        .env
        .create_resource(post_image_script_name(ctx.pkg.package_name()))
        .with_category("post-image script");
    let Some(script) = resource.override_path() else {
        log::debug!("No {} in resource directory", resource.name());
        return Ok(());
    };

    let shell = match OperatingSystem::current() {
        OperatingSystem::Windows => "cscript",
        OperatingSystem::Linux | OperatingSystem::MacOs => "sh",
    };
    let app_image_dir = ctx.env.app_image_dir();
    log::info!("Running post-image script {}", script.display());

    let output = Executor::new(shell)
        .arg(&script)
        .current_dir(app_image_dir)
        .env(APP_IMAGE_DIR_VAR, app_image_dir)
        .timeout(config::tool_timeout())
        .execute()?;
    if !output.trim().is_empty() {
        log::debug!("{}", output.trim_end());
    }
    Ok(())
}
