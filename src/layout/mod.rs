//! App image layouts.
//!
//! A layout maps a fixed set of [`PathRole`]s to paths. Templates hold
//! relative paths; [`AppImageLayout::resolve_at`] produces a new instance
//! rooted at a concrete directory and [`AppImageLayout::unresolve`] recovers
//! the template. Layouts are never mutated: resolution always produces a
//! replacement value.
//!
//! # Platform templates
//!
//! | Role | Linux | Windows | macOS |
//! |------|-------|---------|-------|
//! | launchers | `bin` | `` | `Contents/MacOS` |
//! | app | `lib/app` | `app` | `Contents/app` |
//! | runtime | `lib/runtime` | `runtime` | `Contents/runtime` |
//! | app mods | `lib/app/mods` | `app/mods` | `Contents/app/mods` |
//! | desktop | `lib` | `` | `Contents/Resources` |
//! | content | `lib` | `` | `Contents` |

mod application;
mod path_group;

pub use application::ApplicationLayout;
pub use path_group::copy_layout;

use crate::{
    error::{InternalError, Result},
    platform::OperatingSystem,
};
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

/// Named location inside an app image.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum PathRole {
    /// Bundled runtime.
    Runtime,
    /// Launcher executables.
    Launchers,
    /// Application files and launcher `.cfg` files.
    App,
    /// Application modules that were not linked into the runtime.
    AppMods,
    /// Desktop integration files (icons, desktop entries).
    DesktopIntegration,
    /// Additional content directories.
    Content,
}

impl PathRole {
    /// Roles every application layout defines.
    pub const APPLICATION: [PathRole; 6] = [
        PathRole::Runtime,
        PathRole::Launchers,
        PathRole::App,
        PathRole::AppMods,
        PathRole::DesktopIntegration,
        PathRole::Content,
    ];

    /// Lowercase role name.
    pub fn name(&self) -> &'static str {
        match self {
            PathRole::Runtime => "runtime",
            PathRole::Launchers => "launchers",
            PathRole::App => "app",
            PathRole::AppMods => "app-mods",
            PathRole::DesktopIntegration => "desktop",
            PathRole::Content => "content",
        }
    }
}

impl fmt::Display for PathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role → path mapping describing where things live inside an app image.
///
/// Every layout defines [`PathRole::Runtime`]; runtime-only packages use a
/// layout with nothing else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppImageLayout {
    root: Option<PathBuf>,
    paths: BTreeMap<PathRole, PathBuf>,
}

impl AppImageLayout {
    /// Creates a template from relative paths.
    ///
    /// Fails if the runtime role is missing or a path is absolute.
    pub fn new<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = (PathRole, P)>,
        P: Into<PathBuf>,
    {
        let paths: BTreeMap<PathRole, PathBuf> =
            paths.into_iter().map(|(role, p)| (role, p.into())).collect();

        if !paths.contains_key(&PathRole::Runtime) {
            return Err(InternalError::MissingLayoutRole {
                role: PathRole::Runtime.to_string(),
            }
            .into());
        }
        if let Some((role, path)) = paths.iter().find(|(_, p)| p.has_root()) {
            return Err(InternalError::AbsoluteLayoutPath {
                role: role.to_string(),
                path: path.clone(),
            }
            .into());
        }

        Ok(Self { root: None, paths })
    }

    /// Template for a runtime-only image with the runtime at `runtime`.
    pub fn runtime_only(runtime: impl Into<PathBuf>) -> Self {
        Self {
            root: None,
            paths: BTreeMap::from([(PathRole::Runtime, runtime.into())]),
        }
    }

    /// Runtime-only template for the given operating system.
    pub fn runtime_for_os(os: OperatingSystem) -> Self {
        match os {
            OperatingSystem::MacOs => Self::runtime_only("Contents/Home"),
            OperatingSystem::Linux | OperatingSystem::Windows => Self::runtime_only(""),
        }
    }

    /// Runtime-only template for the current operating system.
    pub fn platform_runtime() -> Self {
        Self::runtime_for_os(OperatingSystem::current())
    }

    /// Whether [`resolve_at`](Self::resolve_at) produced this instance.
    pub fn is_resolved(&self) -> bool {
        self.root.is_some()
    }

    /// Root directory; empty for templates.
    pub fn root_directory(&self) -> &Path {
        self.root.as_deref().unwrap_or(Path::new(""))
    }

    /// Path of a role, if this layout defines it.
    pub fn path(&self, role: PathRole) -> Option<&Path> {
        self.paths.get(&role).map(PathBuf::as_path)
    }

    /// Location of the bundled runtime.
    pub fn runtime_directory(&self) -> &Path {
        &self.paths[&PathRole::Runtime]
    }

    /// Roles defined by this layout, in role order.
    pub fn roles(&self) -> impl Iterator<Item = PathRole> + '_ {
        self.paths.keys().copied()
    }

    /// Whether every application role is defined.
    pub fn is_application_layout(&self) -> bool {
        PathRole::APPLICATION
            .iter()
            .all(|role| self.paths.contains_key(role))
    }

    /// Returns a copy with every path prefixed by `root`.
    ///
    /// `root` may itself be relative (e.g., an install directory inside a
    /// package staging tree). Resolving an already resolved layout is an
    /// internal error; call [`unresolve`](Self::unresolve) first.
    pub fn resolve_at(&self, root: impl AsRef<Path>) -> Result<Self> {
        if let Some(current) = &self.root {
            return Err(InternalError::LayoutAlreadyResolved {
                root: current.clone(),
            }
            .into());
        }
        let root = root.as_ref();
        Ok(Self {
            root: Some(root.to_path_buf()),
            paths: self
                .paths
                .iter()
                .map(|(role, p)| (*role, root.join(p)))
                .collect(),
        })
    }

    /// Strips the root, recovering the template this layout was resolved from.
    pub fn unresolve(&self) -> Result<Self> {
        let root = self.root.as_ref().ok_or(InternalError::LayoutNotResolved)?;
        let mut paths = BTreeMap::new();
        for (role, p) in &self.paths {
            paths.insert(*role, p.strip_prefix(root)?.to_path_buf());
        }
        Ok(Self { root: None, paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_resolve_round_trip() {
        let templates = [
            ApplicationLayout::for_os(OperatingSystem::Linux).into_inner(),
            ApplicationLayout::for_os(OperatingSystem::Windows).into_inner(),
            ApplicationLayout::for_os(OperatingSystem::MacOs).into_inner(),
            AppImageLayout::runtime_for_os(OperatingSystem::Linux),
            AppImageLayout::runtime_for_os(OperatingSystem::MacOs),
        ];
        for template in templates {
            for root in ["/tmp/image", "relative/root", "/"] {
                let resolved = template.resolve_at(root).unwrap();
                assert!(resolved.is_resolved());
                assert_eq!(resolved.root_directory(), Path::new(root));
                assert_eq!(resolved.unresolve().unwrap(), template);
            }
        }
    }

    #[test]
    fn test_resolve_twice_is_rejected() {
        let layout = AppImageLayout::runtime_only("runtime")
            .resolve_at("/a")
            .unwrap();
        assert!(matches!(
            layout.resolve_at("/b"),
            Err(Error::Internal(InternalError::LayoutAlreadyResolved { .. }))
        ));
    }

    #[test]
    fn test_unresolve_template_is_rejected() {
        assert!(matches!(
            AppImageLayout::runtime_only("runtime").unresolve(),
            Err(Error::Internal(InternalError::LayoutNotResolved))
        ));
    }

    #[test]
    fn test_construction_validates_roles() {
        assert!(AppImageLayout::new([(PathRole::App, "app")]).is_err());
        assert!(AppImageLayout::new([(PathRole::Runtime, "/abs")]).is_err());
        let layout = AppImageLayout::new([(PathRole::Runtime, "rt")]).unwrap();
        assert_eq!(layout.runtime_directory(), Path::new("rt"));
        assert!(!layout.is_application_layout());
    }

    #[test]
    fn test_resolved_paths_are_prefixed() {
        let layout = ApplicationLayout::for_os(OperatingSystem::Linux)
            .resolve_at("/opt/foo")
            .unwrap();
        assert_eq!(layout.launchers_directory(), Path::new("/opt/foo/bin"));
        assert_eq!(layout.app_directory(), Path::new("/opt/foo/lib/app"));
        assert_eq!(layout.runtime_directory(), Path::new("/opt/foo/lib/runtime"));
    }
}
