//! Application, launcher and package models.
//!
//! All models are built once through their builders and shared immutably
//! (behind `Arc`) with pipeline tasks afterwards.

mod application;
mod launcher;
mod package;

pub use application::{Application, ApplicationBuilder, SplitRuntime};
pub use launcher::{FileAssociation, Launcher, LauncherStartupInfo, StartupEntry};
pub use package::{Package, PackageBuilder};
