//! Pipeline modes and the task skip table.

use super::task::TaskId;
use crate::graph::FixedDag;
use std::fmt;

/// What a pipeline run produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineMode {
    /// Build an application image and stop.
    ImageOnly,
    /// Build a fresh image as part of packaging.
    PackageWithFreshImage,
    /// Package a predefined image.
    PackageFromExistingImage,
}

impl PipelineMode {
    /// Whether tasks of `phase` run in this mode.
    ///
    /// | mode | app image | copy | shared | package | app image file |
    /// |------|-----------|------|--------|---------|----------------|
    /// | image only | run | skip | run | skip | run |
    /// | fresh image | run | skip | run | run | skip |
    /// | existing image | skip | run | run | run | skip |
    pub fn runs(self, phase: TaskPhase) -> bool {
        use PipelineMode::*;
        use TaskPhase::*;
        match (self, phase) {
            (_, Shared) => true,
            (ImageOnly, AppImage | AppImageFile) => true,
            (ImageOnly, CopyAppImage | Package) => false,
            (PackageWithFreshImage, AppImage | Package) => true,
            (PackageWithFreshImage, CopyAppImage | AppImageFile) => false,
            (PackageFromExistingImage, CopyAppImage | Package) => true,
            (PackageFromExistingImage, AppImage | AppImageFile) => false,
        }
    }

    /// Whether this mode produces a package.
    pub fn is_packaging(self) -> bool {
        !matches!(self, PipelineMode::ImageOnly)
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineMode::ImageOnly => "image-only",
            PipelineMode::PackageWithFreshImage => "package-with-fresh-image",
            PipelineMode::PackageFromExistingImage => "package-from-existing-image",
        })
    }
}

/// Which part of the pipeline a task belongs to, derived from the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskPhase {
    /// Only needed to build an application image.
    AppImage,
    /// Only needed to copy a predefined image.
    CopyAppImage,
    /// Needed by both image paths.
    Shared,
    /// Needed by neither image path: packaging proper.
    Package,
    /// Writes `.jpackage.xml`.
    AppImageFile,
}

impl TaskPhase {
    /// Phase of `task` in `dag`.
    ///
    /// Each sentinel counts as a dependency of itself.
    pub fn of(task: TaskId, dag: &FixedDag<TaskId>) -> Self {
        if task == TaskId::AppImageFile {
            return TaskPhase::AppImageFile;
        }
        let heads = dag.all_heads_of(task);
        let in_image = task == TaskId::BuildApplicationImage
            || heads.contains(&TaskId::BuildApplicationImage);
        let in_copy = task == TaskId::CopyAppImage || heads.contains(&TaskId::CopyAppImage);
        match (in_image, in_copy) {
            (true, true) => TaskPhase::Shared,
            (true, false) => TaskPhase::AppImage,
            (false, true) => TaskPhase::CopyAppImage,
            (false, false) => TaskPhase::Package,
        }
    }
}
