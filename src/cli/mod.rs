//! Command line interface for app_packager.
//!
//! Reads a packaging descriptor, builds the application and package models
//! from it and runs the standard pipeline.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::{
    config::PackagingConfig,
    error::{ConfigError, ErrorExt, Result},
    pipeline::PackagingPipeline,
    platform::OperatingSystem,
    utils::fs,
};
use std::{path::PathBuf, sync::Arc};

/// Main CLI entry point
pub async fn run(args: Args) -> Result<i32> {
    let output = OutputManager::new(args.verbose);
    if let Err(reason) = args.validate() {
        output.error(&format!("Invalid arguments: {reason}"));
        return Ok(2);
    }

    match execute(&args, &output).await {
        Ok(()) => Ok(0),
        Err(e) => {
            output.error(&format!("{e}"));
            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                let _ = output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    let _ = output.indent(&format!("• {suggestion}"));
                }
            }
            Ok(1)
        }
    }
}

async fn execute(args: &Args, output: &OutputManager) -> Result<()> {
    let mut config = PackagingConfig::load(&args.config)?;
    if args.verbose {
        config.build.verbose = true;
    }
    let app = Arc::new(config.to_application()?);
    let output_dir = args.dest.clone().unwrap_or_else(|| config.output_dir());

    // Removed at the end of an app-image-only run; packaging runs keep it
    let mut temp_root = None;
    let build_root: PathBuf = match args.build_root.clone().or_else(|| config.build_root()) {
        Some(root) => root,
        None => {
            let dir = tempfile::Builder::new()
                .prefix("app_packager")
                .tempdir()
                .fs_context("creating temporary build root", std::env::temp_dir())?;
            let root = dir.path().join("build");
            temp_root = Some(dir);
            root
        }
    };
    let _ = output.verbose(&format!("Build root: {}", build_root.display()));

    let env = config.build_env(&build_root, &app)?;
    let pipeline = PackagingPipeline::standard()?;

    if args.app_image_only {
        let image_name = match OperatingSystem::current() {
            OperatingSystem::MacOs if !app.is_runtime() => format!("{}.app", app.name()),
            _ => app.name().to_string(),
        };
        let image_dir = output_dir.join(image_name);
        if !fs::is_empty_dir(&image_dir)? {
            return Err(ConfigError::InvalidOption {
                option: "dest".into(),
                reason: format!("{} already exists", image_dir.display()),
            }
            .into());
        }
        let env = env.with_app_image_dir(&image_dir)?;
        let _ = output.info(&format!("Building app image of {}", app.name()));
        pipeline.execute_app_image(&env, app).await?;
        let _ = output.success(&format!("App image created at {}", image_dir.display()));
        return Ok(());
    }

    let pkg = Arc::new(config.to_package(app, args.package_type)?);
    let _ = output.info(&format!(
        "Packaging {} as {}",
        pkg.package_name(),
        pkg.package_type().short_name()
    ));
    let result = pipeline.execute_package(&env, pkg.clone(), &output_dir).await;
    if let Some(dir) = temp_root {
        let kept = dir.keep();
        let _ = output.verbose(&format!("Keeping build root {}", kept.display()));
    }
    result?;

    let _ = output.success(&format!(
        "Package tasks for {} completed; staged image kept in {}",
        pkg.package_name(),
        env.build_root().display()
    ));
    let _ = output.info(&format!(
        "No installer backend is attached for {}; nothing was written to {}",
        pkg.package_type().short_name(),
        output_dir.display()
    ));
    Ok(())
}
