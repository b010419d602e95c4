//! Build environment.
//!
//! A [`BuildEnv`] describes where a build happens: the build root, the
//! directory holding user resource overrides, and the resolved layout of the
//! app image being produced or consumed. It is created once through
//! [`BuildEnvBuilder`] and never mutated; the pipeline derives adjusted copies
//! with [`BuildEnv::with_app_image_dir`] and [`BuildEnv::with_app_image_layout`].

mod resource;

pub use resource::{OverridableResource, ResourceSource};

use crate::{
    error::{ConfigError, Result},
    layout::{AppImageLayout, ApplicationLayout},
    model::Application,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Immutable build context shared by all pipeline tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnv {
    build_root: PathBuf,
    resource_dir: Option<PathBuf>,
    verbose: bool,
    app_image_layout: AppImageLayout,
}

impl BuildEnv {
    /// Scratch directory of the build.
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Directory searched for resource overrides.
    pub fn resource_dir(&self) -> Option<&Path> {
        self.resource_dir.as_deref()
    }

    /// Whether verbose logging was requested.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Resolved layout of the app image.
    pub fn app_image_layout(&self) -> &AppImageLayout {
        &self.app_image_layout
    }

    /// Root of the app image. Always the root of [`app_image_layout`](Self::app_image_layout).
    pub fn app_image_dir(&self) -> &Path {
        self.app_image_layout.root_directory()
    }

    /// The app image layout as an application layout, if it is one.
    pub fn application_layout(&self) -> Option<ApplicationLayout> {
        ApplicationLayout::from_layout(self.app_image_layout.clone()).ok()
    }

    /// Copy with the same layout template resolved at `dir`.
    pub fn with_app_image_dir(&self, dir: impl AsRef<Path>) -> Result<Self> {
        let template = self.app_image_layout.unresolve()?;
        Ok(Self {
            app_image_layout: template.resolve_at(dir)?,
            ..self.clone()
        })
    }

    /// Copy with a different resolved layout.
    pub fn with_app_image_layout(&self, layout: AppImageLayout) -> Self {
        Self {
            app_image_layout: layout,
            ..self.clone()
        }
    }

    /// Resource named `name`, overridable from the resource directory.
    pub fn create_resource(&self, name: impl Into<String>) -> OverridableResource {
        OverridableResource::new(name, self.resource_dir.clone())
    }
}

/// Builder for [`BuildEnv`].
#[derive(Debug, Clone)]
pub struct BuildEnvBuilder {
    build_root: PathBuf,
    resource_dir: Option<PathBuf>,
    verbose: bool,
    app_image_dir: Option<PathBuf>,
    app_image_layout: Option<AppImageLayout>,
}

impl BuildEnvBuilder {
    /// Creates a builder for a build rooted at `build_root`.
    pub fn new<P: AsRef<Path>>(build_root: P) -> Self {
        Self {
            build_root: build_root.as_ref().to_path_buf(),
            resource_dir: None,
            verbose: false,
            app_image_dir: None,
            app_image_layout: None,
        }
    }

    /// Sets the resource override directory.
    pub fn resource_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.resource_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables verbose logging.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets the app image directory.
    pub fn app_image_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.app_image_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the layout template. Defaults to the platform app image layout.
    pub fn app_image_layout(mut self, layout: AppImageLayout) -> Self {
        self.app_image_layout = Some(layout);
        self
    }

    /// Places the app image of `app` at `<build_root>/image`.
    pub fn app_image_dir_for(mut self, app: &Application) -> Self {
        self.app_image_dir = Some(self.build_root.join("image"));
        self.app_image_layout = Some(app.image_layout().clone());
        self
    }

    /// Validates and creates the environment.
    ///
    /// Fails when the build root already has content or no app image
    /// directory was set.
    pub fn create(self) -> Result<BuildEnv> {
        if !fs::is_empty_dir(&self.build_root)? {
            return Err(ConfigError::BuildRootNotEmpty {
                path: self.build_root,
            }
            .into());
        }
        let Some(app_image_dir) = self.app_image_dir else {
            return Err(ConfigError::AppImageDirNotSet {
                build_root: self.build_root,
            }
            .into());
        };

        let template = match self.app_image_layout {
            Some(layout) if layout.is_resolved() => layout.unresolve()?,
            Some(layout) => layout,
            None => ApplicationLayout::platform_app_image().into_inner(),
        };

        Ok(BuildEnv {
            app_image_layout: template.resolve_at(app_image_dir)?,
            build_root: self.build_root,
            resource_dir: self.resource_dir,
            verbose: self.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, model::ApplicationBuilder};

    #[test]
    fn test_non_empty_build_root_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write_file(&tmp.path().join("leftover"), "x").unwrap();
        let err = BuildEnvBuilder::new(tmp.path())
            .app_image_dir(tmp.path().join("image"))
            .create()
            .unwrap_err();
        match err {
            Error::Config(ConfigError::BuildRootNotEmpty { path }) => assert_eq!(path, tmp.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_app_image_dir_required() {
        let tmp = tempfile::tempdir().unwrap();
        let err = BuildEnvBuilder::new(tmp.path().join("root"))
            .create()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::AppImageDirNotSet { .. })
        ));
    }

    #[test]
    fn test_app_image_dir_for_uses_image_subdir() {
        let tmp = tempfile::tempdir().unwrap();
        let app = ApplicationBuilder::new().name("rt").build().unwrap();
        let env = BuildEnvBuilder::new(tmp.path())
            .app_image_dir_for(&app)
            .create()
            .unwrap();
        assert_eq!(env.app_image_dir(), tmp.path().join("image"));
        assert_eq!(env.app_image_layout().unresolve().unwrap(), *app.image_layout());
        assert!(env.application_layout().is_none());
    }

    #[test]
    fn test_derived_copies_keep_other_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let env = BuildEnvBuilder::new(tmp.path())
            .resource_dir("/res")
            .verbose(true)
            .app_image_dir(tmp.path().join("a"))
            .create()
            .unwrap();

        let moved = env.with_app_image_dir(tmp.path().join("b")).unwrap();
        assert_eq!(moved.app_image_dir(), tmp.path().join("b"));
        assert_eq!(moved.resource_dir(), Some(Path::new("/res")));
        assert!(moved.verbose());
        assert_eq!(
            moved.app_image_layout().unresolve().unwrap(),
            env.app_image_layout().unresolve().unwrap()
        );

        let swapped = env.with_app_image_layout(
            AppImageLayout::runtime_only("rt").resolve_at("/c").unwrap(),
        );
        assert_eq!(swapped.app_image_dir(), Path::new("/c"));
        assert_eq!(swapped.build_root(), env.build_root());
    }
}
