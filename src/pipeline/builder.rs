//! Pipeline assembly.

use super::{
    PackagingPipeline,
    task::{TaskAction, TaskConfig, TaskGroup, TaskId},
};
use crate::{
    error::Result,
    graph::{DagBuilder, FixedDag},
    image,
};
use std::collections::BTreeMap;

/// Collects tasks and their ordering.
///
/// The task graph is re-derived from the current edges by every
/// [`task_graph`](Self::task_graph) and [`create`](Self::create) call, so a
/// graph obtained before a later [`link`](Self::link) never leaks into the
/// pipeline.
#[derive(Debug, Default, Clone)]
pub struct PipelineBuilder {
    dag: DagBuilder<TaskId>,
    actions: BTreeMap<TaskId, Option<TaskAction>>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder holding the standard tasks.
    ///
    /// ```text
    /// runtime ─┐
    ///          ├─> content ─> app-image-file ─> build-application-image ─┐
    /// launchers┘                                                         │
    /// copy ─> copy-app-image ────────────────────────────────────────────┤
    ///                                                                    v
    ///     create-config-files, write-package-file ─> run-post-image-user-script
    ///                                  ─> create-package-file ─> package
    /// ```
    pub fn standard() -> Self {
        let mut builder = Self::new();
        builder
            .task(TaskId::Runtime)
            .action(TaskAction::app_image(image::create_runtime))
            .add_dependent(TaskId::Content)
            .add()
            .task(TaskId::Launchers)
            .action(TaskAction::application_image(image::write_launchers))
            .add_dependent(TaskId::Content)
            .add()
            .task(TaskId::Content)
            .action(TaskAction::application_image(image::copy_content))
            .add_dependent(TaskId::AppImageFile)
            .add()
            .task(TaskId::AppImageFile)
            .action(TaskAction::application_image(image::write_app_image_file))
            .in_group(TaskGroup::ApplicationImage)
            .add()
            .task(TaskId::Copy)
            .action(TaskAction::copy_app_image(image::copy_app_image))
            .in_group(TaskGroup::CopyAppImage)
            .add();

        for sentinel in [TaskId::BuildApplicationImage, TaskId::CopyAppImage] {
            builder
                .task(sentinel)
                .add_dependent(TaskId::CreateConfigFiles)
                .add_dependent(TaskId::WritePackageFile)
                .add_dependent(TaskId::RunPostImageUserScript)
                .add();
        }

        builder
            .task(TaskId::CreateConfigFiles)
            .add_dependent(TaskId::RunPostImageUserScript)
            .add()
            .task(TaskId::WritePackageFile)
            .action(TaskAction::package(image::write_package_file))
            .add_dependent(TaskId::RunPostImageUserScript)
            .add()
            .task(TaskId::RunPostImageUserScript)
            .action(TaskAction::package(image::run_post_image_script))
            .add_dependent(TaskId::CreatePackageFile)
            .add()
            .task(TaskId::CreatePackageFile)
            .add_dependent(TaskId::Package)
            .add()
            .task(TaskId::Package)
            .add();
        builder
    }

    /// Starts adding or changing the task `id`.
    pub fn task(&mut self, id: TaskId) -> TaskBuilder<'_> {
        TaskBuilder {
            pipeline: self,
            id,
            action: None,
            dependencies: Vec::new(),
            dependents: Vec::new(),
        }
    }

    /// Makes `head` wait for `tail`.
    pub fn link(&mut self, tail: TaskId, head: TaskId) -> &mut Self {
        self.dag.add_edge(tail, head);
        self
    }

    /// Removes the ordering between `tail` and `head`.
    pub fn unlink(&mut self, tail: TaskId, head: TaskId) -> &mut Self {
        self.dag.remove_edge(tail, head);
        self
    }

    /// Derives the task graph from the current edges.
    pub fn task_graph(&self) -> Result<FixedDag<TaskId>> {
        self.dag.build()
    }

    /// Config of task `id`, if the builder knows it.
    pub fn task_config(&self, id: TaskId) -> Option<TaskConfig> {
        if !self.dag.contains(id) {
            return None;
        }
        Some(TaskConfig::new(id, self.actions.get(&id).cloned().flatten()))
    }

    /// Validates the graph and creates the pipeline.
    pub fn create(self) -> Result<PackagingPipeline> {
        let dag = self.dag.build()?;
        let configs = dag
            .nodes()
            .map(|id| {
                let action = self.actions.get(&id).cloned().flatten();
                (id, TaskConfig::new(id, action))
            })
            .collect();
        Ok(PackagingPipeline::new(dag, configs))
    }
}

/// Adds or changes one task of a [`PipelineBuilder`].
///
/// Changes apply on [`add`](Self::add). An existing task keeps its action
/// unless [`action`](Self::action) or [`no_action`](Self::no_action) is called.
#[must_use = "changes apply only after `add`"]
pub struct TaskBuilder<'a> {
    pipeline: &'a mut PipelineBuilder,
    id: TaskId,
    action: Option<Option<TaskAction>>,
    dependencies: Vec<TaskId>,
    dependents: Vec<TaskId>,
}

impl<'a> TaskBuilder<'a> {
    /// Sets the action.
    pub fn action(mut self, action: TaskAction) -> Self {
        self.action = Some(Some(action));
        self
    }

    /// Removes the action, turning the task into a sentinel.
    pub fn no_action(mut self) -> Self {
        self.action = Some(None);
        self
    }

    /// Runs the task after `id`.
    pub fn add_dependency(mut self, id: TaskId) -> Self {
        self.dependencies.push(id);
        self
    }

    /// Runs the task before `id`.
    pub fn add_dependent(mut self, id: TaskId) -> Self {
        self.dependents.push(id);
        self
    }

    /// Runs the task before the sentinel of `group`.
    pub fn in_group(self, group: TaskGroup) -> Self {
        self.add_dependent(group.sentinel())
    }

    /// Applies the changes.
    pub fn add(self) -> &'a mut PipelineBuilder {
        let pipeline = self.pipeline;
        pipeline.dag.add_node(self.id);
        for tail in self.dependencies {
            pipeline.dag.add_edge(tail, self.id);
        }
        for head in self.dependents {
            pipeline.dag.add_edge(self.id, head);
        }
        match self.action {
            Some(action) => {
                pipeline.actions.insert(self.id, action);
            }
            None => {
                pipeline.actions.entry(self.id).or_insert(None);
            }
        }
        pipeline
    }
}
