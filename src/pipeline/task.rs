//! Task identifiers, groups and actions.

use crate::{
    env::BuildEnv,
    error::Result,
    layout::{AppImageLayout, ApplicationLayout},
    model::{Application, Package},
};
use std::{fmt, path::Path, sync::Arc};

/// Identifier of a pipeline task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskId {
    /// Create the bundled runtime.
    Runtime,
    /// Write launcher `.cfg` files and executables.
    Launchers,
    /// Copy application files and content directories.
    Content,
    /// Write `.jpackage.xml`.
    AppImageFile,
    /// Copy a predefined app image into the staging directory.
    Copy,
    /// Sentinel: the application image is complete.
    BuildApplicationImage,
    /// Sentinel: the predefined app image is in place.
    CopyAppImage,
    /// Sentinel: installer configuration files are written.
    CreateConfigFiles,
    /// Write `.package`.
    WritePackageFile,
    /// Run the user's post-image script.
    RunPostImageUserScript,
    /// Sentinel: the installer file is created.
    CreatePackageFile,
    /// Sentinel: packaging is complete.
    Package,
    /// Task added by an extension.
    Custom(&'static str),
}

impl TaskId {
    /// Task name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            TaskId::Runtime => "runtime",
            TaskId::Launchers => "launchers",
            TaskId::Content => "content",
            TaskId::AppImageFile => "app-image-file",
            TaskId::Copy => "copy",
            TaskId::BuildApplicationImage => "build-application-image",
            TaskId::CopyAppImage => "copy-app-image",
            TaskId::CreateConfigFiles => "create-config-files",
            TaskId::WritePackageFile => "write-package-file",
            TaskId::RunPostImageUserScript => "run-post-image-user-script",
            TaskId::CreatePackageFile => "create-package-file",
            TaskId::Package => "package",
            TaskId::Custom(name) => name,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named insertion point for extension tasks.
///
/// A task added to a group runs before the group's sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskGroup {
    /// Part of building the application image.
    ApplicationImage,
    /// Part of copying a predefined app image.
    CopyAppImage,
    /// Writes installer configuration files.
    ConfigFiles,
    /// Produces the installer file.
    PackageFile,
}

impl TaskGroup {
    /// Sentinel task the group's members precede.
    pub fn sentinel(&self) -> TaskId {
        match self {
            TaskGroup::ApplicationImage => TaskId::BuildApplicationImage,
            TaskGroup::CopyAppImage => TaskId::CopyAppImage,
            TaskGroup::ConfigFiles => TaskId::CreateConfigFiles,
            TaskGroup::PackageFile => TaskId::CreatePackageFile,
        }
    }
}

/// Arguments of actions operating on an app image.
#[derive(Debug, Clone, Copy)]
pub struct AppImageBuildEnv<'a, L> {
    /// Build environment
    pub env: &'a BuildEnv,
    /// Application being built
    pub app: &'a Application,
    /// Resolved layout of the target image
    pub layout: &'a L,
}

/// Arguments of actions operating on a package.
#[derive(Debug, Clone, Copy)]
pub struct PackageBuildEnv<'a> {
    /// Build environment, with the package's app image layout
    pub env: &'a BuildEnv,
    /// Package being built
    pub pkg: &'a Package,
    /// Directory receiving the installer
    pub output_dir: &'a Path,
}

type ApplicationImageFn =
    dyn for<'a> Fn(&AppImageBuildEnv<'a, ApplicationLayout>) -> Result<()> + Send + Sync;
type AppImageFn = dyn for<'a> Fn(&AppImageBuildEnv<'a, AppImageLayout>) -> Result<()> + Send + Sync;
type CopyAppImageFn =
    dyn Fn(&Package, &AppImageLayout, &AppImageLayout) -> Result<()> + Send + Sync;
type PackageFn = dyn for<'a> Fn(&PackageBuildEnv<'a>) -> Result<()> + Send + Sync;
type NoArgFn = dyn Fn() -> Result<()> + Send + Sync;

/// What a task does, by the arguments it needs.
#[derive(Clone)]
pub enum TaskAction {
    /// Needs the application and its resolved application layout. Skipped
    /// for runtime-only applications.
    ApplicationImage(Arc<ApplicationImageFn>),
    /// Needs the application and the resolved image layout.
    AppImage(Arc<AppImageFn>),
    /// Needs the package, the source layout and the destination layout.
    CopyAppImage(Arc<CopyAppImageFn>),
    /// Needs the package, the environment and the output directory.
    Package(Arc<PackageFn>),
    /// Needs nothing.
    NoArg(Arc<NoArgFn>),
}

impl TaskAction {
    /// Wraps an application image action.
    pub fn application_image<F>(f: F) -> Self
    where
        F: for<'a> Fn(&AppImageBuildEnv<'a, ApplicationLayout>) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        TaskAction::ApplicationImage(Arc::new(f))
    }

    /// Wraps an app image action.
    pub fn app_image<F>(f: F) -> Self
    where
        F: for<'a> Fn(&AppImageBuildEnv<'a, AppImageLayout>) -> Result<()> + Send + Sync + 'static,
    {
        TaskAction::AppImage(Arc::new(f))
    }

    /// Wraps a copy action.
    pub fn copy_app_image<F>(f: F) -> Self
    where
        F: Fn(&Package, &AppImageLayout, &AppImageLayout) -> Result<()> + Send + Sync + 'static,
    {
        TaskAction::CopyAppImage(Arc::new(f))
    }

    /// Wraps a package action.
    pub fn package<F>(f: F) -> Self
    where
        F: for<'a> Fn(&PackageBuildEnv<'a>) -> Result<()> + Send + Sync + 'static,
    {
        TaskAction::Package(Arc::new(f))
    }

    /// Wraps an action without arguments.
    pub fn no_arg<F>(f: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        TaskAction::NoArg(Arc::new(f))
    }

    /// Kind name used in errors.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskAction::ApplicationImage(_) => "application image",
            TaskAction::AppImage(_) => "app image",
            TaskAction::CopyAppImage(_) => "copy app image",
            TaskAction::Package(_) => "package",
            TaskAction::NoArg(_) => "no-arg",
        }
    }
}

impl fmt::Debug for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskAction({})", self.kind())
    }
}

/// A task id paired with its optional action.
///
/// Tasks without an action are sentinels: they only order other tasks.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    id: TaskId,
    action: Option<TaskAction>,
}

impl TaskConfig {
    /// Creates a config.
    pub fn new(id: TaskId, action: Option<TaskAction>) -> Self {
        Self { id, action }
    }

    /// Task id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Action, if any.
    pub fn action(&self) -> Option<&TaskAction> {
        self.action.as_ref()
    }
}
