//! Command line argument parsing and validation.

use crate::platform::PackageType;
use clap::Parser;
use std::path::PathBuf;

/// Builds application images and installers from a packaging descriptor
#[derive(Parser, Debug)]
#[command(
    name = "app_packager",
    version,
    about = "Build application images and installers",
    long_about = "Build a self-contained application image, or package one into a native installer.

Usage:
  app_packager packager.toml --app-image-only
  app_packager packager.toml --type deb
  app_packager packager.toml --type msi --dest out --build-root build"
)]
pub struct Args {
    /// Packaging descriptor (TOML)
    #[arg(index = 1, value_name = "DESCRIPTOR")]
    pub config: PathBuf,

    /// Installer type; overrides `[package] type`
    #[arg(short = 't', long = "type", value_name = "TYPE", value_parser = parse_package_type)]
    pub package_type: Option<PackageType>,

    /// Output directory; overrides `[build] output`
    #[arg(short, long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Build root; overrides `[build] root`. Must be empty
    #[arg(long, value_name = "DIR")]
    pub build_root: Option<PathBuf>,

    /// Build the application image only
    #[arg(long, conflicts_with = "package_type")]
    pub app_image_only: bool,

    /// Log every task
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_package_type(name: &str) -> Result<PackageType, String> {
    PackageType::from_short_name(name).ok_or_else(|| {
        format!("unknown installer type '{name}' (expected deb, rpm, msi, exe, dmg or pkg)")
    })
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.config.as_os_str().is_empty() {
            return Err("Packaging descriptor is required".to_string());
        }
        Ok(())
    }
}
