//! # App Packager
//!
//! Builds self-contained application images and turns them into native
//! installers.
//!
//! An application image is a directory tree holding a runtime, launcher
//! executables with their `.cfg` files, the application files and a
//! `.jpackage.xml` metadata file. Packaging either builds a fresh image or
//! reuses a predefined one, then runs the installer-specific tasks.
//!
//! ## Features
//!
//! - **Task graph**: every build step is a node in a dependency graph; steps
//!   without an ordering between them run concurrently
//! - **Pipeline modes**: the same graph serves image-only builds, packaging
//!   with a fresh image and packaging of an existing image
//! - **Platform layouts**: Linux, Windows and macOS image layouts
//! - **Guarded reuse**: predefined images are checked against the platform
//!   and packager version that created them
//!
//! ## Usage
//!
//! ```bash
//! app_packager packager.toml --app-image-only
//! app_packager packager.toml --type deb --dest dist
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod app_image_file;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod exec;
pub mod graph;
pub mod image;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod platform;
pub mod runtime;

pub(crate) mod utils;

pub use app_image_file::AppImageFile;
pub use config::PackagingConfig;
pub use env::{BuildEnv, BuildEnvBuilder};
pub use error::{Error, Result};
pub use layout::{AppImageLayout, ApplicationLayout};
pub use model::{Application, ApplicationBuilder, Launcher, Package, PackageBuilder};
pub use pipeline::{PackagingPipeline, PipelineBuilder, PipelineMode, StartupParameters, TaskId};
pub use platform::{OperatingSystem, PackageType};
