//! Launcher model.

use std::{collections::BTreeMap, path::PathBuf};

/// How a launcher locates the application entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartupEntry {
    /// Main class inside a named module.
    Module(String),
    /// Main class on the class path, optionally inside a main jar.
    ClassPath {
        /// Jar holding the main class, relative to the app directory
        main_jar: Option<PathBuf>,
    },
}

/// Startup information of a launcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LauncherStartupInfo {
    entry: StartupEntry,
    main_class: String,
    classpath: Vec<PathBuf>,
    java_options: Vec<String>,
    default_parameters: Vec<String>,
}

impl LauncherStartupInfo {
    /// Module-based startup: `module/main_class`.
    pub fn module(module: impl Into<String>, main_class: impl Into<String>) -> Self {
        Self {
            entry: StartupEntry::Module(module.into()),
            main_class: main_class.into(),
            classpath: Vec::new(),
            java_options: Vec::new(),
            default_parameters: Vec::new(),
        }
    }

    /// Class path based startup.
    pub fn class_path(main_class: impl Into<String>, main_jar: Option<PathBuf>) -> Self {
        Self {
            entry: StartupEntry::ClassPath { main_jar },
            main_class: main_class.into(),
            classpath: Vec::new(),
            java_options: Vec::new(),
            default_parameters: Vec::new(),
        }
    }

    /// Sets class path entries, relative to the app directory.
    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    /// Sets options passed to the runtime.
    pub fn with_java_options(mut self, options: Vec<String>) -> Self {
        self.java_options = options;
        self
    }

    /// Sets arguments passed to the main class when none are given.
    pub fn with_default_parameters(mut self, parameters: Vec<String>) -> Self {
        self.default_parameters = parameters;
        self
    }

    /// Entry point kind.
    pub fn entry(&self) -> &StartupEntry {
        &self.entry
    }

    /// Fully qualified main class name.
    pub fn qualified_class_name(&self) -> &str {
        &self.main_class
    }

    /// Main module, for module-based startup.
    pub fn module_name(&self) -> Option<&str> {
        match &self.entry {
            StartupEntry::Module(module) => Some(module),
            StartupEntry::ClassPath { .. } => None,
        }
    }

    /// Class path entries; for class path startup the main jar comes first.
    pub fn classpath(&self) -> Vec<PathBuf> {
        let mut entries = Vec::with_capacity(self.classpath.len() + 1);
        if let StartupEntry::ClassPath {
            main_jar: Some(jar),
        } = &self.entry
        {
            entries.push(jar.clone());
        }
        entries.extend(self.classpath.iter().cloned());
        entries
    }

    /// Runtime options.
    pub fn java_options(&self) -> &[String] {
        &self.java_options
    }

    /// Default application arguments.
    pub fn default_parameters(&self) -> &[String] {
        &self.default_parameters
    }
}

/// File type a launcher registers itself for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileAssociation {
    /// Human-readable description
    pub description: Option<String>,
    /// MIME types
    pub mime_types: Vec<String>,
    /// File extensions without the leading dot
    pub extensions: Vec<String>,
    /// Icon for associated files
    pub icon: Option<PathBuf>,
}

/// One named executable entry point into the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Launcher {
    name: String,
    startup_info: Option<LauncherStartupInfo>,
    file_associations: Vec<FileAssociation>,
    service: bool,
    description: String,
    icon: Option<PathBuf>,
    default_icon_resource_name: String,
    extra_app_image_file_data: BTreeMap<String, String>,
}

impl Launcher {
    /// Creates a launcher with no startup info.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            startup_info: None,
            file_associations: Vec::new(),
            service: false,
            icon: None,
            default_icon_resource_name: "JavaApp.png".to_string(),
            extra_app_image_file_data: BTreeMap::new(),
        }
    }

    /// Sets the startup info.
    pub fn with_startup_info(mut self, startup_info: LauncherStartupInfo) -> Self {
        self.startup_info = Some(startup_info);
        self
    }

    /// Sets file associations.
    pub fn with_file_associations(mut self, associations: Vec<FileAssociation>) -> Self {
        self.file_associations = associations;
        self
    }

    /// Marks the launcher as a background service.
    pub fn with_service(mut self, service: bool) -> Self {
        self.service = service;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets a custom icon.
    pub fn with_icon(mut self, icon: impl Into<PathBuf>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the name of the built-in icon used when no custom icon is set.
    pub fn with_default_icon_resource_name(mut self, name: impl Into<String>) -> Self {
        self.default_icon_resource_name = name.into();
        self
    }

    /// Adds a key/value pair stored in the app image file.
    pub fn with_extra_app_image_file_data(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.extra_app_image_file_data.insert(key.into(), value.into());
        self
    }

    /// Launcher name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Startup info, absent for launchers of predefined images.
    pub fn startup_info(&self) -> Option<&LauncherStartupInfo> {
        self.startup_info.as_ref()
    }

    /// File associations.
    pub fn file_associations(&self) -> &[FileAssociation] {
        &self.file_associations
    }

    /// Whether the launcher is installed as a service.
    pub fn is_service(&self) -> bool {
        self.service
    }

    /// Description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Custom icon, if any.
    pub fn icon(&self) -> Option<&PathBuf> {
        self.icon.as_ref()
    }

    /// Name of the built-in fallback icon.
    pub fn default_icon_resource_name(&self) -> &str {
        &self.default_icon_resource_name
    }

    /// Extra metadata round-tripped through the app image file.
    pub fn extra_app_image_file_data(&self) -> &BTreeMap<String, String> {
        &self.extra_app_image_file_data
    }

    /// File name of the executable on the current platform.
    pub fn executable_name(&self) -> String {
        crate::platform::OperatingSystem::current().executable_name(&self.name)
    }
}
