//! Application model and its builder.

use super::launcher::Launcher;
use crate::{
    app_image_file,
    error::{ConfigError, Error, Result},
    layout::{AppImageLayout, ApplicationLayout},
    runtime::RuntimeBuilder,
};
use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Reference to a runtime installed outside the app image.
///
/// Emitted as `runtime.*` keys in launcher `.cfg` files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitRuntime {
    /// Required runtime version
    pub version: Option<String>,
    /// Required runtime release
    pub release: Option<String>,
    /// Directories searched for the runtime
    pub search_path: Vec<String>,
}

/// The thing being packaged.
///
/// An application without launchers is a runtime: packaging it produces a
/// runtime installer rather than an application installer.
#[derive(Clone, Debug)]
pub struct Application {
    name: String,
    description: String,
    version: String,
    vendor: String,
    copyright: String,
    src_dir: Option<PathBuf>,
    mods_dir: Option<PathBuf>,
    content_dirs: Vec<PathBuf>,
    image_layout: AppImageLayout,
    runtime_builder: Option<Arc<dyn RuntimeBuilder>>,
    split_runtime: Option<SplitRuntime>,
    launcher_template: Option<PathBuf>,
    extra_app_image_file_data: BTreeMap<String, String>,
    launchers: Vec<Launcher>,
}

impl Application {
    /// Application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Vendor.
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Copyright notice.
    pub fn copyright(&self) -> &str {
        &self.copyright
    }

    /// Directory holding the application files.
    pub fn src_dir(&self) -> Option<&Path> {
        self.src_dir.as_deref()
    }

    /// Directory holding modules that are not linked into the runtime.
    pub fn mods_dir(&self) -> Option<&Path> {
        self.mods_dir.as_deref()
    }

    /// Additional directories copied into the content directory.
    pub fn content_dirs(&self) -> &[PathBuf] {
        &self.content_dirs
    }

    /// Layout template of the app image.
    pub fn image_layout(&self) -> &AppImageLayout {
        &self.image_layout
    }

    /// Layout template as an application layout; `None` for runtimes.
    pub fn application_layout(&self) -> Option<ApplicationLayout> {
        if self.is_runtime() {
            return None;
        }
        ApplicationLayout::from_layout(self.image_layout.clone()).ok()
    }

    /// Builder producing the bundled runtime; `None` for predefined images.
    pub fn runtime_builder(&self) -> Option<&Arc<dyn RuntimeBuilder>> {
        self.runtime_builder.as_ref()
    }

    /// Externally installed runtime the launchers should use.
    pub fn split_runtime(&self) -> Option<&SplitRuntime> {
        self.split_runtime.as_ref()
    }

    /// Default launcher executable, used when no resource override exists.
    pub fn launcher_template(&self) -> Option<&Path> {
        self.launcher_template.as_deref()
    }

    /// App-level metadata stored in the app image file.
    pub fn extra_app_image_file_data(&self) -> &BTreeMap<String, String> {
        &self.extra_app_image_file_data
    }

    /// All launchers; the first one is the main launcher.
    pub fn launchers(&self) -> &[Launcher] {
        &self.launchers
    }

    /// The main launcher, `None` for runtimes.
    pub fn main_launcher(&self) -> Option<&Launcher> {
        self.launchers.first()
    }

    /// Launchers after the main one.
    pub fn additional_launchers(&self) -> &[Launcher] {
        self.launchers.get(1..).unwrap_or_default()
    }

    /// Whether this is a runtime without launchers.
    pub fn is_runtime(&self) -> bool {
        self.main_launcher().is_none()
    }

    /// Whether the app image is produced by this run rather than predefined.
    pub fn is_fresh_image(&self) -> bool {
        self.runtime_builder.is_some()
    }
}

/// Builder for [`Application`].
#[derive(Debug, Default)]
pub struct ApplicationBuilder {
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
    vendor: Option<String>,
    copyright: Option<String>,
    src_dir: Option<PathBuf>,
    mods_dir: Option<PathBuf>,
    content_dirs: Vec<PathBuf>,
    image_layout: Option<AppImageLayout>,
    runtime_builder: Option<Arc<dyn RuntimeBuilder>>,
    split_runtime: Option<SplitRuntime>,
    launcher_template: Option<PathBuf>,
    extra_app_image_file_data: BTreeMap<String, String>,
    launchers: Vec<Launcher>,
}

impl ApplicationBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description. Defaults to the name.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the version. Defaults to `1.0`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the vendor.
    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    /// Sets the copyright notice.
    pub fn copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = Some(copyright.into());
        self
    }

    /// Sets the directory with the application files.
    pub fn src_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.src_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the directory with application modules kept out of the runtime.
    pub fn mods_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.mods_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds a directory copied into the content directory.
    pub fn content_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.content_dirs.push(path.as_ref().to_path_buf());
        self
    }

    /// Overrides the layout template.
    pub fn image_layout(mut self, layout: AppImageLayout) -> Self {
        self.image_layout = Some(layout);
        self
    }

    /// Sets the runtime builder.
    pub fn runtime_builder(mut self, builder: Arc<dyn RuntimeBuilder>) -> Self {
        self.runtime_builder = Some(builder);
        self
    }

    /// Points launchers at an externally installed runtime.
    pub fn split_runtime(mut self, runtime: SplitRuntime) -> Self {
        self.split_runtime = Some(runtime);
        self
    }

    /// Sets the default launcher executable.
    pub fn launcher_template<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.launcher_template = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds app-level metadata stored in the app image file.
    pub fn extra_app_image_file_data(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.extra_app_image_file_data.insert(key.into(), value.into());
        self
    }

    /// Appends a launcher; the first one added is the main launcher.
    pub fn launcher(mut self, launcher: Launcher) -> Self {
        self.launchers.push(launcher);
        self
    }

    /// Replaces the launcher list.
    pub fn launchers(mut self, launchers: Vec<Launcher>) -> Self {
        self.launchers = launchers;
        self
    }

    /// Validates and builds the application.
    ///
    /// Without an explicit layout, applications get the platform app image
    /// template and runtimes the platform runtime template.
    pub fn build(self) -> Result<Application> {
        let name = self
            .name
            .ok_or_else(|| invalid_option("name", "application name is required"))?;
        if name.trim().is_empty() {
            return Err(invalid_option("name", "must not be empty"));
        }
        for key in self.extra_app_image_file_data.keys() {
            app_image_file::check_app_extra_key(key)
                .map_err(|reason| invalid_option(format!("extra.{key}"), reason))?;
        }

        let mut seen = HashSet::new();
        for launcher in &self.launchers {
            check_launcher_name(launcher.name())?;
            if !seen.insert(launcher.name()) {
                return Err(ConfigError::DuplicateLauncher {
                    name: launcher.name().to_string(),
                }
                .into());
            }
            for key in launcher.extra_app_image_file_data().keys() {
                app_image_file::check_launcher_extra_key(key).map_err(|reason| {
                    invalid_option(format!("launcher.{}.{key}", launcher.name()), reason)
                })?;
            }
        }

        if self.runtime_builder.is_some()
            && let Some(launcher) = self.launchers.iter().find(|l| l.startup_info().is_none())
        {
            return Err(ConfigError::InvalidOption {
                option: format!("launcher.{}", launcher.name()),
                reason: "launchers of a fresh app image need a main class".into(),
            }
            .into());
        }

        let image_layout = match self.image_layout {
            Some(layout) => layout,
            None if self.launchers.is_empty() => AppImageLayout::platform_runtime(),
            None => ApplicationLayout::platform_app_image().into_inner(),
        };
        if !self.launchers.is_empty() && !image_layout.is_application_layout() {
            return Err(ConfigError::InvalidOption {
                option: "image_layout".into(),
                reason: "applications with launchers need a full application layout".into(),
            }
            .into());
        }

        Ok(Application {
            description: self.description.unwrap_or_else(|| name.clone()),
            name,
            version: self.version.unwrap_or_else(|| "1.0".to_string()),
            vendor: self.vendor.unwrap_or_else(|| "Unknown".to_string()),
            copyright: self.copyright.unwrap_or_default(),
            src_dir: self.src_dir,
            mods_dir: self.mods_dir,
            content_dirs: self.content_dirs,
            image_layout,
            runtime_builder: self.runtime_builder,
            split_runtime: self.split_runtime,
            launcher_template: self.launcher_template,
            extra_app_image_file_data: self.extra_app_image_file_data,
            launchers: self.launchers,
        })
    }
}

fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Error {
    ConfigError::InvalidOption {
        option: option.into(),
        reason: reason.into(),
    }
    .into()
}

/// Launcher names become file names in the app image.
fn check_launcher_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "launcher name must not be empty"
    } else if name.contains(['/', '\\']) {
        "launcher name must not contain path separators"
    } else if name == "." || name == ".." {
        "launcher name must be a file name"
    } else {
        return Ok(());
    };
    Err(invalid_option(format!("launcher.{name}"), reason))
}
