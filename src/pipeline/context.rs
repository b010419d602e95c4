//! Per-run task context: what the pipeline produces and how actions are
//! dispatched.

use super::{
    mode::PipelineMode,
    task::{AppImageBuildEnv, PackageBuildEnv, TaskAction, TaskId},
};
use crate::{
    env::BuildEnv,
    error::{InternalError, Result},
    layout::{AppImageLayout, ApplicationLayout},
    model::{Application, Package},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Packaging half of a run.
#[derive(Debug, Clone)]
pub struct PackageTarget {
    pkg: Arc<Package>,
    output_dir: PathBuf,
    source_layout: AppImageLayout,
}

/// Everything a pipeline run needs, decided before any task executes.
#[derive(Debug, Clone)]
pub struct StartupParameters {
    mode: PipelineMode,
    env: BuildEnv,
    app: Arc<Application>,
    package: Option<PackageTarget>,
}

impl StartupParameters {
    /// Parameters for building an application image only.
    pub fn image_only(env: BuildEnv, app: Arc<Application>) -> Self {
        Self {
            mode: PipelineMode::ImageOnly,
            env,
            app,
            package: None,
        }
    }

    pub(crate) fn packaging(
        mode: PipelineMode,
        env: BuildEnv,
        pkg: Arc<Package>,
        output_dir: PathBuf,
        source_layout: AppImageLayout,
    ) -> Self {
        Self {
            mode,
            env,
            app: pkg.app().clone(),
            package: Some(PackageTarget {
                pkg,
                output_dir,
                source_layout,
            }),
        }
    }

    /// Run mode.
    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    /// Environment the tasks see.
    pub fn env(&self) -> &BuildEnv {
        &self.env
    }

    /// Application being built or packaged.
    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }

    /// Package, for packaging runs.
    pub fn package(&self) -> Option<&Arc<Package>> {
        self.package.as_ref().map(|target| &target.pkg)
    }

    /// Installer output directory, for packaging runs.
    pub fn output_dir(&self) -> Option<&Path> {
        self.package
            .as_ref()
            .map(|target| target.output_dir.as_path())
    }

    /// Layout of the image packaged, for packaging runs. Equal to the
    /// environment's layout unless a predefined image is copied.
    pub fn source_layout(&self) -> Option<&AppImageLayout> {
        self.package.as_ref().map(|target| &target.source_layout)
    }

    /// Runs `action` of `task` with the arguments its kind needs.
    pub(crate) fn dispatch(&self, task: TaskId, action: &TaskAction) -> Result<()> {
        match action {
            TaskAction::ApplicationImage(f) => {
                if self.app.is_runtime() {
                    log::debug!("Skipping {task}: runtime images have no application layout");
                    return Ok(());
                }
                let layout = ApplicationLayout::from_layout(self.env.app_image_layout().clone())?;
                f(&AppImageBuildEnv {
                    env: &self.env,
                    app: &self.app,
                    layout: &layout,
                })
            }
            TaskAction::AppImage(f) => f(&AppImageBuildEnv {
                env: &self.env,
                app: &self.app,
                layout: self.env.app_image_layout(),
            }),
            TaskAction::CopyAppImage(f) => {
                let target = self.target(task, action)?;
                f(&target.pkg, &target.source_layout, self.env.app_image_layout())
            }
            TaskAction::Package(f) => {
                let target = self.target(task, action)?;
                f(&PackageBuildEnv {
                    env: &self.env,
                    pkg: &target.pkg,
                    output_dir: &target.output_dir,
                })
            }
            TaskAction::NoArg(f) => f(),
        }
    }

    fn target(&self, task: TaskId, action: &TaskAction) -> Result<&PackageTarget> {
        self.package.as_ref().ok_or_else(|| {
            InternalError::ActionContextMismatch {
                task: task.to_string(),
                kind: action.kind(),
                mode: self.mode.to_string(),
            }
            .into()
        })
    }
}
