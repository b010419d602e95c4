//! Runtime builders.
//!
//! A [`RuntimeBuilder`] populates the runtime directory of an app image. The
//! pipeline treats it as an opaque collaborator: an application with a
//! runtime builder gets a freshly built image, one without packages a
//! predefined image.

use crate::{
    error::{ConfigError, Result},
    exec::Executor,
    layout::AppImageLayout,
    utils::fs,
};
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    time::Duration,
};

/// Produces the runtime of an app image.
pub trait RuntimeBuilder: Debug + Send + Sync {
    /// Writes the runtime into `layout.runtime_directory()`.
    fn create_runtime(&self, layout: &AppImageLayout) -> Result<()>;
}

/// Links a runtime with `jlink`.
#[derive(Debug, Clone)]
pub struct JlinkRuntimeBuilder {
    jlink: Option<PathBuf>,
    module_path: Vec<PathBuf>,
    add_modules: Vec<String>,
    options: Vec<String>,
    timeout: Option<Duration>,
}

impl JlinkRuntimeBuilder {
    /// Options passed to `jlink` unless replaced with [`options`](Self::options).
    pub const DEFAULT_OPTIONS: [&'static str; 4] = [
        "--strip-native-commands",
        "--strip-debug",
        "--no-man-pages",
        "--no-header-files",
    ];

    /// Creates a builder linking `add_modules`.
    pub fn new(add_modules: Vec<String>) -> Self {
        Self {
            jlink: None,
            module_path: Vec::new(),
            add_modules,
            options: Self::DEFAULT_OPTIONS.iter().map(|s| s.to_string()).collect(),
            timeout: None,
        }
    }

    /// Uses an explicit `jlink` binary instead of searching `PATH`.
    pub fn jlink<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.jlink = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the module path.
    pub fn module_path(mut self, module_path: Vec<PathBuf>) -> Self {
        self.module_path = module_path;
        self
    }

    /// Replaces the extra `jlink` options.
    pub fn options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Kills `jlink` if it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn locate(&self) -> Result<PathBuf> {
        if let Some(path) = &self.jlink {
            return Ok(path.clone());
        }
        which::which("jlink").map_err(|_| {
            ConfigError::ToolNotFound {
                tool: "jlink".to_string(),
            }
            .into()
        })
    }

    fn arguments(&self, output: &Path) -> Result<Vec<String>> {
        let mut args = vec!["--output".to_string(), output.display().to_string()];
        if !self.module_path.is_empty() {
            let joined = std::env::join_paths(&self.module_path).map_err(|e| {
                ConfigError::InvalidOption {
                    option: "runtime.module_path".into(),
                    reason: e.to_string(),
                }
            })?;
            args.push("--module-path".to_string());
            args.push(joined.to_string_lossy().into_owned());
        }
        if !self.add_modules.is_empty() {
            args.push("--add-modules".to_string());
            args.push(self.add_modules.join(","));
        }
        args.extend(self.options.iter().cloned());
        Ok(args)
    }
}

impl RuntimeBuilder for JlinkRuntimeBuilder {
    fn create_runtime(&self, layout: &AppImageLayout) -> Result<()> {
        let jlink = self.locate()?;
        let output = layout.runtime_directory();
        let args = self.arguments(output)?;

        // jlink refuses to write into an existing directory
        if output.exists() {
            fs::remove_dir_all(output)?;
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }

        log::info!("Linking runtime into {}", output.display());
        let mut executor = Executor::new(&jlink).args(args);
        if let Some(timeout) = self.timeout {
            executor = executor.timeout(timeout);
        }
        executor.execute()?;
        Ok(())
    }
}

/// Copies a predefined runtime tree.
#[derive(Debug, Clone)]
pub struct CopyRuntimeBuilder {
    source: PathBuf,
}

impl CopyRuntimeBuilder {
    /// Creates a builder copying the runtime at `source`.
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
        }
    }

    /// Runtime directory copied by this builder.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl RuntimeBuilder for CopyRuntimeBuilder {
    fn create_runtime(&self, layout: &AppImageLayout) -> Result<()> {
        if !self.source.is_dir() {
            return Err(ConfigError::InvalidOption {
                option: "runtime".into(),
                reason: format!("{} is not a directory", self.source.display()),
            }
            .into());
        }
        log::info!(
            "Copying runtime {} into {}",
            self.source.display(),
            layout.runtime_directory().display()
        );
        fs::copy_dir(&self.source, layout.runtime_directory(), &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_jlink_arguments() {
        let builder = JlinkRuntimeBuilder::new(vec!["java.base".into(), "m".into()])
            .module_path(vec!["/mods".into()]);
        let args = builder.arguments(Path::new("/out")).unwrap();
        assert_eq!(
            args[..6],
            ["--output", "/out", "--module-path", "/mods", "--add-modules", "java.base,m"]
        );
        assert!(args.contains(&"--strip-debug".to_string()));
    }

    #[test]
    #[cfg(unix)]
    fn test_unjoinable_module_path_rejected() {
        let builder = JlinkRuntimeBuilder::new(vec!["m".into()])
            .module_path(vec!["/mods:more".into()]);
        let err = builder.arguments(Path::new("/out")).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidOption { ref option, .. }) if option == "runtime.module_path"
        ));
    }

    #[test]
    fn test_copy_runtime() {
        let tmp = tempfile::tempdir().unwrap();
        let jdk = tmp.path().join("jdk");
        fs::write_file(&jdk.join("bin/java"), "java").unwrap();
        fs::write_file(&jdk.join("release"), "JAVA_VERSION=\"21\"").unwrap();

        let layout = AppImageLayout::runtime_only("lib/runtime")
            .resolve_at(tmp.path().join("image"))
            .unwrap();
        CopyRuntimeBuilder::new(&jdk).create_runtime(&layout).unwrap();

        assert!(layout.runtime_directory().join("bin/java").is_file());
        assert!(layout.runtime_directory().join("release").is_file());
    }

    #[test]
    fn test_copy_runtime_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = AppImageLayout::runtime_only("rt").resolve_at(tmp.path()).unwrap();
        let err = CopyRuntimeBuilder::new(tmp.path().join("none"))
            .create_runtime(&layout)
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidOption { .. })));
    }

    #[test]
    fn test_explicit_jlink_path_is_used() {
        let builder = JlinkRuntimeBuilder::new(vec![]).jlink("/custom/jlink");
        assert_eq!(builder.locate().unwrap(), PathBuf::from("/custom/jlink"));
    }
}
