//! Packaging descriptor and environment overrides.
//!
//! A descriptor is a TOML file describing one application and, optionally,
//! the installer built from it:
//!
//! ```toml
//! [application]
//! name = "Foo"
//! version = "1.0"
//! input = "target/app"
//!
//! [[launcher]]
//! name = "Foo"
//! module = "m"
//! main_class = "m.Main"
//!
//! [runtime]
//! modules = ["java.base"]
//!
//! [package]
//! type = "deb"
//! ```
//!
//! Relative paths are resolved against the directory holding the descriptor.

use crate::{
    env::{BuildEnv, BuildEnvBuilder},
    error::{ConfigError, Result},
    model::{
        Application, ApplicationBuilder, FileAssociation, Launcher, LauncherStartupInfo, Package,
        PackageBuilder, SplitRuntime,
    },
    platform::PackageType,
    runtime::{CopyRuntimeBuilder, JlinkRuntimeBuilder, RuntimeBuilder},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

/// Environment variable overriding the external tool timeout, in seconds.
pub const TOOL_TIMEOUT_ENV: &str = "APP_PACKAGER_TOOL_TIMEOUT";

const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 600;
const MAX_TOOL_TIMEOUT_SECS: u64 = 3600;

/// Timeout applied to external tools (`jlink`, user scripts).
///
/// Reads [`TOOL_TIMEOUT_ENV`]; unset or unparsable values fall back to ten
/// minutes and values above one hour are clamped.
pub fn tool_timeout() -> Duration {
    Duration::from_secs(parse_env_secs(
        TOOL_TIMEOUT_ENV,
        DEFAULT_TOOL_TIMEOUT_SECS,
        MAX_TOOL_TIMEOUT_SECS,
    ))
}

fn parse_env_secs(var_name: &str, default: u64, max: u64) -> u64 {
    std::env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|v| v.min(max))
        .unwrap_or(default)
}

/// Parsed packaging descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagingConfig {
    /// `[application]`
    pub application: ApplicationConfig,
    /// `[[launcher]]`, first is the main launcher
    #[serde(default, rename = "launcher")]
    pub launchers: Vec<LauncherConfig>,
    /// `[runtime]`
    pub runtime: Option<RuntimeConfig>,
    /// `[package]`
    pub package: Option<PackageConfig>,
    /// `[build]`
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// `[application]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Version
    pub version: Option<String>,
    /// Vendor
    pub vendor: Option<String>,
    /// Copyright line
    pub copyright: Option<String>,
    /// Directory copied into the app directory
    pub input: Option<PathBuf>,
    /// Directory copied into the app mods directory
    pub mods: Option<PathBuf>,
    /// Directories copied under the content directory
    #[serde(default)]
    pub content: Vec<PathBuf>,
    /// Default launcher executable
    pub launcher_template: Option<PathBuf>,
    /// Runtime installed outside the image
    pub split_runtime: Option<SplitRuntimeConfig>,
    /// Extra `.jpackage.xml` properties
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// `[application.split_runtime]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitRuntimeConfig {
    /// Required runtime version
    pub version: Option<String>,
    /// Required runtime release
    pub release: Option<String>,
    /// Directories searched for the runtime
    #[serde(default)]
    pub search_path: Vec<String>,
}

/// One `[[launcher]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    /// Launcher name
    pub name: String,
    /// Main module; selects module startup
    pub module: Option<String>,
    /// Main class
    pub main_class: Option<String>,
    /// Main jar, relative to the app directory
    pub main_jar: Option<PathBuf>,
    /// Class path entries, relative to the app directory
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
    /// JVM options
    #[serde(default)]
    pub java_options: Vec<String>,
    /// Default application arguments
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Description
    pub description: Option<String>,
    /// Icon file
    pub icon: Option<PathBuf>,
    /// Install as a service
    #[serde(default)]
    pub service: bool,
    /// File associations
    #[serde(default, rename = "file_association")]
    pub file_associations: Vec<FileAssociationConfig>,
    /// Extra `.jpackage.xml` launcher properties
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// `[[launcher.file_association]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileAssociationConfig {
    /// Description
    pub description: Option<String>,
    /// MIME types
    #[serde(default)]
    pub mime_types: Vec<String>,
    /// Extensions without the leading dot
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Icon
    pub icon: Option<PathBuf>,
}

/// `[runtime]` table.
///
/// Either `modules` (linked with `jlink`) or `predefined` (copied).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Modules passed to `--add-modules`
    #[serde(default)]
    pub modules: Vec<String>,
    /// `--module-path` entries
    #[serde(default)]
    pub module_path: Vec<PathBuf>,
    /// Explicit `jlink` binary
    pub jlink: Option<PathBuf>,
    /// Replaces the default `jlink` options
    pub options: Option<Vec<String>>,
    /// Runtime directory copied as-is
    pub predefined: Option<PathBuf>,
}

/// `[package]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    /// Installer type short name (`deb`, `rpm`, `msi`, `exe`, `dmg`, `pkg`)
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    /// Package name
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Version
    pub version: Option<String>,
    /// Project home page
    pub about_url: Option<String>,
    /// License file
    pub license_file: Option<PathBuf>,
    /// Install directory
    pub install_dir: Option<PathBuf>,
    /// Existing app image to package
    pub app_image: Option<PathBuf>,
}

/// `[build]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Build root; must be empty
    pub root: Option<PathBuf>,
    /// Directory searched for resource overrides
    pub resource_dir: Option<PathBuf>,
    /// Directory receiving the installer
    pub output: Option<PathBuf>,
    /// Log task progress at info level
    #[serde(default)]
    pub verbose: bool,
}

impl PackagingConfig {
    /// Reads and parses the descriptor at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Descriptor {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::parse(&text, base_dir).map_err(|reason| {
            ConfigError::Descriptor {
                path: path.to_path_buf(),
                reason,
            }
            .into()
        })
    }

    /// Parses descriptor text, resolving relative paths against `base_dir`.
    pub fn parse(text: &str, base_dir: impl Into<PathBuf>) -> std::result::Result<Self, String> {
        let mut config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        config.base_dir = base_dir.into();
        Ok(config)
    }

    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Configured build root, if any.
    pub fn build_root(&self) -> Option<PathBuf> {
        self.build.root.as_deref().map(|p| self.resolve(p))
    }

    /// Directory receiving the installer; `dist` next to the descriptor by default.
    pub fn output_dir(&self) -> PathBuf {
        match &self.build.output {
            Some(output) => self.resolve(output),
            None => self.base_dir.join("dist"),
        }
    }

    /// Installer type from `[package]`, if set.
    pub fn package_type(&self) -> Result<Option<PackageType>> {
        let Some(name) = self.package.as_ref().and_then(|p| p.package_type.as_deref()) else {
            return Ok(None);
        };
        PackageType::from_short_name(name)
            .map(Some)
            .ok_or_else(|| {
                ConfigError::InvalidOption {
                    option: "package.type".into(),
                    reason: format!("unknown package type '{name}'"),
                }
                .into()
            })
    }

    fn runtime_builder(&self) -> Result<Option<Arc<dyn RuntimeBuilder>>> {
        let Some(runtime) = &self.runtime else {
            return Ok(None);
        };
        match (&runtime.predefined, runtime.modules.is_empty()) {
            (Some(_), false) => Err(ConfigError::InvalidOption {
                option: "runtime.predefined".into(),
                reason: "cannot be combined with runtime.modules".into(),
            }
            .into()),
            (Some(predefined), true) => {
                let builder: Arc<dyn RuntimeBuilder> =
                    Arc::new(CopyRuntimeBuilder::new(self.resolve(predefined)));
                Ok(Some(builder))
            }
            (None, _) => {
                let mut builder = JlinkRuntimeBuilder::new(runtime.modules.clone())
                    .module_path(runtime.module_path.iter().map(|p| self.resolve(p)).collect())
                    .timeout(tool_timeout());
                if let Some(jlink) = &runtime.jlink {
                    builder = builder.jlink(self.resolve(jlink));
                }
                if let Some(options) = &runtime.options {
                    builder = builder.options(options.clone());
                }
                let builder: Arc<dyn RuntimeBuilder> = Arc::new(builder);
                Ok(Some(builder))
            }
        }
    }

    fn launcher(&self, config: &LauncherConfig) -> Result<Launcher> {
        let startup_info = match (&config.module, &config.main_class) {
            (Some(module), Some(main_class)) => {
                Some(LauncherStartupInfo::module(module, main_class))
            }
            (Some(_), None) => {
                return Err(ConfigError::InvalidOption {
                    option: format!("launcher.{}.main_class", config.name),
                    reason: "required with a main module".into(),
                }
                .into());
            }
            (None, Some(main_class)) => Some(LauncherStartupInfo::class_path(
                main_class,
                config.main_jar.clone(),
            )),
            (None, None) => None,
        };

        let mut launcher = Launcher::new(&config.name).with_service(config.service);
        if let Some(info) = startup_info {
            launcher = launcher.with_startup_info(
                info.with_classpath(config.classpath.clone())
                    .with_java_options(config.java_options.clone())
                    .with_default_parameters(config.arguments.clone()),
            );
        }
        if let Some(description) = &config.description {
            launcher = launcher.with_description(description);
        }
        if let Some(icon) = &config.icon {
            launcher = launcher.with_icon(self.resolve(icon));
        }
        if !config.file_associations.is_empty() {
            launcher = launcher.with_file_associations(
                config
                    .file_associations
                    .iter()
                    .map(|fa| FileAssociation {
                        description: fa.description.clone(),
                        mime_types: fa.mime_types.clone(),
                        extensions: fa.extensions.clone(),
                        icon: fa.icon.as_deref().map(|p| self.resolve(p)),
                    })
                    .collect(),
            );
        }
        for (key, value) in &config.extra {
            launcher = launcher.with_extra_app_image_file_data(key, value);
        }
        Ok(launcher)
    }

    /// Builds the application the descriptor describes.
    pub fn to_application(&self) -> Result<Application> {
        let app = &self.application;
        let mut builder = ApplicationBuilder::new().name(&app.name);
        if let Some(description) = &app.description {
            builder = builder.description(description);
        }
        if let Some(version) = &app.version {
            builder = builder.version(version);
        }
        if let Some(vendor) = &app.vendor {
            builder = builder.vendor(vendor);
        }
        if let Some(copyright) = &app.copyright {
            builder = builder.copyright(copyright);
        }
        if let Some(input) = &app.input {
            builder = builder.src_dir(self.resolve(input));
        }
        if let Some(mods) = &app.mods {
            builder = builder.mods_dir(self.resolve(mods));
        }
        for dir in &app.content {
            builder = builder.content_dir(self.resolve(dir));
        }
        if let Some(template) = &app.launcher_template {
            builder = builder.launcher_template(self.resolve(template));
        }
        if let Some(split) = &app.split_runtime {
            builder = builder.split_runtime(SplitRuntime {
                version: split.version.clone(),
                release: split.release.clone(),
                search_path: split.search_path.clone(),
            });
        }
        for (key, value) in &app.extra {
            builder = builder.extra_app_image_file_data(key, value);
        }
        if let Some(runtime_builder) = self.runtime_builder()? {
            builder = builder.runtime_builder(runtime_builder);
        }
        for launcher in &self.launchers {
            builder = builder.launcher(self.launcher(launcher)?);
        }
        builder.build()
    }

    /// Builds the package of `app`.
    ///
    /// `package_type` overrides `[package] type`; one of them is required.
    pub fn to_package(
        &self,
        app: Arc<Application>,
        package_type: Option<PackageType>,
    ) -> Result<Package> {
        let package_type = match package_type {
            Some(package_type) => package_type,
            None => self.package_type()?.ok_or_else(|| ConfigError::InvalidOption {
                option: "package.type".into(),
                reason: "no installer type configured".into(),
            })?,
        };
        let mut builder = PackageBuilder::new(app).package_type(package_type);
        if let Some(package) = &self.package {
            if let Some(name) = &package.name {
                builder = builder.package_name(name);
            }
            if let Some(description) = &package.description {
                builder = builder.description(description);
            }
            if let Some(version) = &package.version {
                builder = builder.version(version);
            }
            if let Some(url) = &package.about_url {
                builder = builder.about_url(url);
            }
            if let Some(license) = &package.license_file {
                builder = builder.license_file(self.resolve(license));
            }
            if let Some(install_dir) = &package.install_dir {
                builder = builder.install_dir(install_dir);
            }
            if let Some(app_image) = &package.app_image {
                builder = builder.predefined_app_image(self.resolve(app_image));
            }
        }
        builder.build()
    }

    /// Creates the build environment of `app` rooted at `build_root`.
    ///
    /// The app image goes to `build_root/image`.
    pub fn build_env(&self, build_root: &Path, app: &Application) -> Result<BuildEnv> {
        let mut builder = BuildEnvBuilder::new(build_root)
            .verbose(self.build.verbose)
            .app_image_dir_for(app);
        if let Some(resource_dir) = &self.build.resource_dir {
            builder = builder.resource_dir(self.resolve(resource_dir));
        }
        builder.create()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StartupEntry;

    const DESCRIPTOR: &str = r#"
[application]
name = "Foo"
version = "2.1"
input = "input"
content = ["docs"]

[application.split_runtime]
version = "21"

[[launcher]]
name = "Foo"
module = "m"
main_class = "m.Main"
java_options = ["-Xmx1g"]

[[launcher]]
name = "Tool"
main_class = "t.Main"
main_jar = "tool.jar"
service = true

[[launcher.file_association]]
extensions = ["foo"]

[runtime]
modules = ["java.base"]

[package]
type = "deb"
install_dir = "/opt/foo"

[build]
resource_dir = "res"
"#;

    #[test]
    fn test_parse_descriptor() {
        let config = PackagingConfig::parse(DESCRIPTOR, "/work").unwrap();
        let app = config.to_application().unwrap();

        assert_eq!(app.name(), "Foo");
        assert_eq!(app.version(), "2.1");
        assert_eq!(app.src_dir(), Some(Path::new("/work/input")));
        assert_eq!(app.content_dirs(), [PathBuf::from("/work/docs")]);
        assert!(app.is_fresh_image());
        assert_eq!(app.launchers().len(), 2);

        let main = app.main_launcher().unwrap();
        assert_eq!(
            main.startup_info().unwrap().entry(),
            &StartupEntry::Module("m".into())
        );
        let tool = &app.additional_launchers()[0];
        assert!(tool.is_service());
        assert_eq!(tool.file_associations()[0].extensions, ["foo"]);
        assert_eq!(app.split_runtime().unwrap().version.as_deref(), Some("21"));
    }

    #[test]
    fn test_to_package() {
        let config = PackagingConfig::parse(DESCRIPTOR, "/work").unwrap();
        let app = Arc::new(config.to_application().unwrap());
        let pkg = config.to_package(app.clone(), None).unwrap();
        assert_eq!(pkg.package_type(), PackageType::Deb);
        assert_eq!(pkg.relative_install_dir(), Path::new("opt/foo"));

        let rpm = config.to_package(app, Some(PackageType::Rpm)).unwrap();
        assert_eq!(rpm.package_type(), PackageType::Rpm);
    }

    #[test]
    fn test_unknown_package_type() {
        let config = PackagingConfig::parse(
            "[application]\nname = \"Foo\"\n[package]\ntype = \"zip\"\n",
            "/work",
        )
        .unwrap();
        assert!(config.package_type().unwrap_err().is_config());
    }

    #[test]
    fn test_predefined_runtime_conflicts_with_modules() {
        let config = PackagingConfig::parse(
            "[application]\nname = \"Foo\"\n[runtime]\nmodules = [\"java.base\"]\npredefined = \"/jdk\"\n",
            "/work",
        )
        .unwrap();
        assert!(config.to_application().unwrap_err().is_config());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(PackagingConfig::parse("[application]\nname = \"Foo\"\ncolour = 1\n", "/").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = PackagingConfig::load("/nonexistent/packager.toml").unwrap_err();
        assert!(matches!(err, crate::Error::Config(ConfigError::Descriptor { .. })));
    }

    #[test]
    fn test_build_env() {
        let dir = tempfile::tempdir().unwrap();
        let config = PackagingConfig::parse(DESCRIPTOR, dir.path()).unwrap();
        let app = config.to_application().unwrap();
        let root = dir.path().join("build");
        let env = config.build_env(&root, &app).unwrap();
        assert_eq!(env.app_image_dir(), root.join("image"));
        assert_eq!(env.resource_dir(), Some(dir.path().join("res").as_path()));
        assert_eq!(config.output_dir(), dir.path().join("dist"));
    }

    #[test]
    fn test_parse_env_secs() {
        assert_eq!(parse_env_secs("APP_PACKAGER_TEST_UNSET_VARIABLE", 7, 10), 7);
    }
}
