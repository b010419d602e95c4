//! Package model: an application plus installer-specific settings.

use super::application::Application;
use crate::{
    error::{ConfigError, Result},
    layout::{AppImageLayout, ApplicationLayout},
    platform::{OperatingSystem, PackageType},
};
use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

/// An installable package of an [`Application`].
#[derive(Clone, Debug)]
pub struct Package {
    app: Arc<Application>,
    package_type: PackageType,
    package_name: String,
    description: String,
    version: String,
    about_url: Option<String>,
    license_file: Option<PathBuf>,
    predefined_app_image: Option<PathBuf>,
    relative_install_dir: PathBuf,
}

impl Package {
    /// The packaged application.
    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }

    /// Installer type.
    pub fn package_type(&self) -> PackageType {
        self.package_type
    }

    /// Package name.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Package description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Package version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Project home page.
    pub fn about_url(&self) -> Option<&str> {
        self.about_url.as_deref()
    }

    /// License file shown by the installer.
    pub fn license_file(&self) -> Option<&Path> {
        self.license_file.as_deref()
    }

    /// App image packaged as-is instead of building a fresh one.
    pub fn predefined_app_image(&self) -> Option<&Path> {
        self.predefined_app_image.as_deref()
    }

    /// Whether the package installs a runtime rather than an application.
    pub fn is_runtime_installer(&self) -> bool {
        self.app.is_runtime()
    }

    /// Install directory relative to the file system root (Linux, macOS) or
    /// to the program files directory (Windows).
    pub fn relative_install_dir(&self) -> &Path {
        &self.relative_install_dir
    }

    /// Layout template of the packaged image: the application layout, or the
    /// runtime layout for runtime installers.
    pub fn package_layout(&self) -> AppImageLayout {
        match self.app.application_layout() {
            Some(layout) => layout.into_inner(),
            None => self.app.image_layout().clone(),
        }
    }

    /// Layout of the installed package.
    pub fn installed_layout(&self) -> Result<AppImageLayout> {
        self.package_layout()
            .resolve_at(Path::new("/").join(&self.relative_install_dir))
    }

    /// Layout of the package staged under `root`.
    pub fn package_layout_at(&self, root: impl AsRef<Path>) -> Result<AppImageLayout> {
        self.package_layout()
            .resolve_at(root.as_ref().join(&self.relative_install_dir))
    }

    /// Application layout resolved at a predefined image directory.
    ///
    /// Runtime installers get the runtime layout.
    pub fn app_layout_at(&self, image_dir: impl AsRef<Path>) -> Result<AppImageLayout> {
        self.package_layout().resolve_at(image_dir)
    }

    /// Application layout of the installed package, if this is an
    /// application installer.
    pub fn installed_application_layout(&self) -> Result<Option<ApplicationLayout>> {
        if self.is_runtime_installer() {
            return Ok(None);
        }
        Ok(Some(ApplicationLayout::from_layout(self.installed_layout()?)?))
    }
}

/// Builder for [`Package`].
#[derive(Debug, Default)]
pub struct PackageBuilder {
    app: Option<Arc<Application>>,
    package_type: Option<PackageType>,
    package_name: Option<String>,
    description: Option<String>,
    version: Option<String>,
    about_url: Option<String>,
    license_file: Option<PathBuf>,
    predefined_app_image: Option<PathBuf>,
    install_dir: Option<PathBuf>,
}

impl PackageBuilder {
    /// Creates a builder for a package of `app`.
    pub fn new(app: Arc<Application>) -> Self {
        Self {
            app: Some(app),
            ..Self::default()
        }
    }

    /// Sets the installer type.
    pub fn package_type(mut self, package_type: PackageType) -> Self {
        self.package_type = Some(package_type);
        self
    }

    /// Sets the package name. Defaults to the application name.
    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    /// Sets the description. Defaults to the application description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the version. Defaults to the application version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the project home page.
    pub fn about_url(mut self, url: impl Into<String>) -> Self {
        self.about_url = Some(url.into());
        self
    }

    /// Sets the license file.
    pub fn license_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.license_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Packages an existing app image instead of building one.
    pub fn predefined_app_image<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.predefined_app_image = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the install directory.
    pub fn install_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.install_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Validates and builds the package.
    pub fn build(self) -> Result<Package> {
        let app = self.app.ok_or_else(|| ConfigError::InvalidOption {
            option: "application".into(),
            reason: "application is required".into(),
        })?;
        let package_type = self.package_type.ok_or_else(|| ConfigError::InvalidOption {
            option: "package_type".into(),
            reason: "package type is required".into(),
        })?;
        let package_name = self
            .package_name
            .unwrap_or_else(|| app.name().to_string());

        if app.is_fresh_image() && self.predefined_app_image.is_some() {
            return Err(ConfigError::InvalidOption {
                option: "predefined_app_image".into(),
                reason: "cannot be combined with a runtime builder".into(),
            }
            .into());
        }
        if !app.is_fresh_image() && self.predefined_app_image.is_none() {
            return Err(ConfigError::InvalidOption {
                option: "predefined_app_image".into(),
                reason: "required when the application has no runtime builder".into(),
            }
            .into());
        }

        let relative_install_dir = relative_install_dir(
            package_type.operating_system(),
            &package_name,
            self.install_dir.as_deref(),
        )?;

        Ok(Package {
            description: self
                .description
                .unwrap_or_else(|| app.description().to_string()),
            version: self.version.unwrap_or_else(|| app.version().to_string()),
            app,
            package_type,
            package_name,
            about_url: self.about_url,
            license_file: self.license_file,
            predefined_app_image: self.predefined_app_image,
            relative_install_dir,
        })
    }
}

/// Computes the install directory of a package, relative to its root.
///
/// Linux and macOS install directories are absolute and returned with the
/// root stripped; Windows install directories are relative to the program
/// files directory.
fn relative_install_dir(
    os: OperatingSystem,
    package_name: &str,
    configured: Option<&Path>,
) -> Result<PathBuf> {
    let dir = match (configured, os) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, OperatingSystem::Linux) => Path::new("/opt").join(package_name),
        (None, OperatingSystem::Windows) => PathBuf::from(package_name),
        (None, OperatingSystem::MacOs) => {
            Path::new("/Applications").join(format!("{package_name}.app"))
        }
    };

    let invalid = |reason: &str| -> Result<PathBuf> {
        Err(ConfigError::InvalidInstallDir {
            path: dir.clone(),
            reason: reason.to_string(),
        }
        .into())
    };

    if dir.components().any(|c| matches!(c, Component::ParentDir)) {
        return invalid("must not contain '..'");
    }
    match os {
        OperatingSystem::Windows => {
            if dir.has_root() {
                return invalid("must be relative on Windows");
            }
            if dir.as_os_str().is_empty() {
                return invalid("must not be empty");
            }
            Ok(dir)
        }
        OperatingSystem::Linux | OperatingSystem::MacOs => {
            if !dir.has_root() {
                return invalid("must be absolute");
            }
            let relative: PathBuf = dir
                .components()
                .filter(|c| matches!(c, Component::Normal(_) | Component::CurDir))
                .collect();
            if relative.as_os_str().is_empty() {
                return invalid("must not be the root directory");
            }
            Ok(relative)
        }
    }
}
