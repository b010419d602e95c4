//! Application image layout.

use super::{AppImageLayout, PathRole};
use crate::{
    error::{InternalError, Result},
    platform::OperatingSystem,
};
use std::path::{Path, PathBuf};

/// An [`AppImageLayout`] that defines every application role.
///
/// Lookups are total: construction rejects templates missing any of
/// [`PathRole::APPLICATION`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationLayout(AppImageLayout);

impl ApplicationLayout {
    /// Wraps a layout, failing if an application role is missing.
    pub fn from_layout(layout: AppImageLayout) -> Result<Self> {
        if let Some(role) = PathRole::APPLICATION
            .iter()
            .find(|role| layout.path(**role).is_none())
        {
            return Err(InternalError::MissingLayoutRole {
                role: role.to_string(),
            }
            .into());
        }
        Ok(Self(layout))
    }

    /// Builds a template from relative paths for every role.
    pub fn new(
        launchers: impl Into<PathBuf>,
        app: impl Into<PathBuf>,
        runtime: impl Into<PathBuf>,
        app_mods: impl Into<PathBuf>,
        desktop_integration: impl Into<PathBuf>,
        content: impl Into<PathBuf>,
    ) -> Result<Self> {
        let layout = AppImageLayout::new([
            (PathRole::Launchers, launchers.into()),
            (PathRole::App, app.into()),
            (PathRole::Runtime, runtime.into()),
            (PathRole::AppMods, app_mods.into()),
            (PathRole::DesktopIntegration, desktop_integration.into()),
            (PathRole::Content, content.into()),
        ])?;
        Ok(Self(layout))
    }

    /// Template for the given operating system.
    pub fn for_os(os: OperatingSystem) -> Self {
        let paths: [(PathRole, &str); 6] = match os {
            OperatingSystem::Linux => [
                (PathRole::Launchers, "bin"),
                (PathRole::App, "lib/app"),
                (PathRole::Runtime, "lib/runtime"),
                (PathRole::AppMods, "lib/app/mods"),
                (PathRole::DesktopIntegration, "lib"),
                (PathRole::Content, "lib"),
            ],
            OperatingSystem::Windows => [
                (PathRole::Launchers, ""),
                (PathRole::App, "app"),
                (PathRole::Runtime, "runtime"),
                (PathRole::AppMods, "app/mods"),
                (PathRole::DesktopIntegration, ""),
                (PathRole::Content, ""),
            ],
            OperatingSystem::MacOs => [
                (PathRole::Launchers, "Contents/MacOS"),
                (PathRole::App, "Contents/app"),
                (PathRole::Runtime, "Contents/runtime"),
                (PathRole::AppMods, "Contents/app/mods"),
                (PathRole::DesktopIntegration, "Contents/Resources"),
                (PathRole::Content, "Contents"),
            ],
        };
        Self(AppImageLayout {
            root: None,
            paths: paths
                .into_iter()
                .map(|(role, p)| (role, PathBuf::from(p)))
                .collect(),
        })
    }

    /// Template for the current operating system.
    pub fn platform_app_image() -> Self {
        Self::for_os(OperatingSystem::current())
    }

    /// The underlying generic layout.
    pub fn as_app_image_layout(&self) -> &AppImageLayout {
        &self.0
    }

    /// Unwraps the generic layout.
    pub fn into_inner(self) -> AppImageLayout {
        self.0
    }

    /// See [`AppImageLayout::resolve_at`].
    pub fn resolve_at(&self, root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self(self.0.resolve_at(root)?))
    }

    /// See [`AppImageLayout::unresolve`].
    pub fn unresolve(&self) -> Result<Self> {
        Ok(Self(self.0.unresolve()?))
    }

    /// See [`AppImageLayout::is_resolved`].
    pub fn is_resolved(&self) -> bool {
        self.0.is_resolved()
    }

    /// See [`AppImageLayout::root_directory`].
    pub fn root_directory(&self) -> &Path {
        self.0.root_directory()
    }

    fn get(&self, role: PathRole) -> &Path {
        &self.0.paths[&role]
    }

    /// Location of the bundled runtime.
    pub fn runtime_directory(&self) -> &Path {
        self.get(PathRole::Runtime)
    }

    /// Location of launcher executables.
    pub fn launchers_directory(&self) -> &Path {
        self.get(PathRole::Launchers)
    }

    /// Location of application files, `.cfg` files and `.jpackage.xml`.
    pub fn app_directory(&self) -> &Path {
        self.get(PathRole::App)
    }

    /// Location of application modules not linked into the runtime.
    pub fn app_mods_directory(&self) -> &Path {
        self.get(PathRole::AppMods)
    }

    /// Location of desktop integration files.
    pub fn desktop_integration_directory(&self) -> &Path {
        self.get(PathRole::DesktopIntegration)
    }

    /// Location of additional content directories.
    pub fn content_directory(&self) -> &Path {
        self.get(PathRole::Content)
    }
}

impl AsRef<AppImageLayout> for ApplicationLayout {
    fn as_ref(&self) -> &AppImageLayout {
        &self.0
    }
}

impl TryFrom<AppImageLayout> for ApplicationLayout {
    type Error = crate::error::Error;

    fn try_from(layout: AppImageLayout) -> Result<Self> {
        Self::from_layout(layout)
    }
}

impl From<ApplicationLayout> for AppImageLayout {
    fn from(layout: ApplicationLayout) -> Self {
        layout.0
    }
}
