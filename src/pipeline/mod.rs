//! The packaging pipeline.
//!
//! A pipeline is a graph of tasks. Building an application image, building a
//! package around a fresh image and packaging a predefined image all run the
//! same graph; the [`PipelineMode`] of a run decides which tasks apply,
//! through the phase each task belongs to (see [`TaskPhase`]).
//!
//! ```no_run
//! # async fn demo(env: app_packager::env::BuildEnv, app: std::sync::Arc<app_packager::model::Application>) -> app_packager::Result<()> {
//! use app_packager::pipeline::PackagingPipeline;
//!
//! let pipeline = PackagingPipeline::standard()?;
//! pipeline.execute_app_image(&env, app).await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod context;
mod executor;
mod mode;
mod task;

pub use builder::{PipelineBuilder, TaskBuilder};
pub use context::StartupParameters;
pub use mode::{PipelineMode, TaskPhase};
pub use task::{AppImageBuildEnv, PackageBuildEnv, TaskAction, TaskConfig, TaskGroup, TaskId};

use crate::{
    app_image_file::AppImageFile,
    env::BuildEnv,
    error::{ConfigError, Result},
    graph::FixedDag,
    layout::ApplicationLayout,
    model::{Application, Package},
};
use std::{collections::BTreeMap, path::Path, sync::Arc};

/// A validated task graph with its task actions.
#[derive(Debug, Clone)]
pub struct PackagingPipeline {
    dag: FixedDag<TaskId>,
    configs: BTreeMap<TaskId, TaskConfig>,
}

impl PackagingPipeline {
    pub(crate) fn new(dag: FixedDag<TaskId>, configs: BTreeMap<TaskId, TaskConfig>) -> Self {
        Self { dag, configs }
    }

    /// The standard pipeline.
    pub fn standard() -> Result<Self> {
        PipelineBuilder::standard().create()
    }

    /// Task graph.
    pub fn task_graph(&self) -> &FixedDag<TaskId> {
        &self.dag
    }

    /// Config of task `id`.
    pub fn task_config(&self, id: TaskId) -> Option<&TaskConfig> {
        self.configs.get(&id)
    }

    /// Phase of task `id`.
    pub fn phase_of(&self, id: TaskId) -> TaskPhase {
        TaskPhase::of(id, &self.dag)
    }

    fn has_action(&self, id: TaskId) -> bool {
        self.task_config(id)
            .is_some_and(|config| config.action().is_some())
    }

    /// Decides how a package of `pkg` will be built.
    ///
    /// With a runtime builder the image is built fresh at the package layout
    /// under the environment's app image directory. Otherwise the predefined
    /// image is validated and either copied into `<build_root>/image` (when
    /// the copy task has an action) or packaged in place.
    pub fn create_startup_parameters(
        &self,
        env: &BuildEnv,
        pkg: Arc<Package>,
        output_dir: impl AsRef<Path>,
    ) -> Result<StartupParameters> {
        let output_dir = output_dir.as_ref().to_path_buf();

        if pkg.app().is_fresh_image() {
            let layout = pkg.package_layout_at(env.app_image_dir())?;
            let env = env.with_app_image_layout(layout.clone());
            return Ok(StartupParameters::packaging(
                PipelineMode::PackageWithFreshImage,
                env,
                pkg,
                output_dir,
                layout,
            ));
        }

        let image_dir = pkg
            .predefined_app_image()
            .ok_or_else(|| ConfigError::InvalidOption {
                option: "predefined_app_image".into(),
                reason: "required when the application has no runtime builder".into(),
            })?;
        if !image_dir.is_dir() {
            return Err(ConfigError::InvalidOption {
                option: "predefined_app_image".into(),
                reason: format!("{} is not a directory", image_dir.display()),
            }
            .into());
        }

        let source_layout = pkg.app_layout_at(image_dir)?;
        if !pkg.is_runtime_installer() {
            AppImageFile::load(&ApplicationLayout::from_layout(source_layout.clone())?)?;
        }

        let env = if self.has_action(TaskId::Copy) {
            env.with_app_image_layout(pkg.package_layout_at(env.build_root().join("image"))?)
        } else {
            log::debug!("Packaging {} in place", image_dir.display());
            env.with_app_image_layout(source_layout.clone())
        };

        Ok(StartupParameters::packaging(
            PipelineMode::PackageFromExistingImage,
            env,
            pkg,
            output_dir,
            source_layout,
        ))
    }

    /// Builds the application image of `app` at the environment's app image
    /// directory.
    pub async fn execute_app_image(&self, env: &BuildEnv, app: Arc<Application>) -> Result<()> {
        if !app.is_runtime() {
            ApplicationLayout::from_layout(env.app_image_layout().clone())?;
        }
        self.execute(StartupParameters::image_only(env.clone(), app))
            .await
    }

    /// Builds a package of `pkg` into `output_dir`.
    pub async fn execute_package(
        &self,
        env: &BuildEnv,
        pkg: Arc<Package>,
        output_dir: impl AsRef<Path>,
    ) -> Result<()> {
        let params = self.create_startup_parameters(env, pkg, output_dir)?;
        self.execute(params).await
    }

    /// Runs the pipeline with precomputed parameters.
    pub async fn execute(&self, params: StartupParameters) -> Result<()> {
        log::info!(
            "Running packaging pipeline for {} in {} mode",
            params.app().name(),
            params.mode()
        );
        executor::run(&self.dag, &self.configs, Arc::new(params)).await
    }
}
