//! Error types for packaging operations.
//!
//! Errors fall into three families:
//!
//! - [`ConfigError`]: the user can fix these by changing input (install
//!   directory, build root, foreign app image, missing tool). They carry
//!   remediation hints through [`Error::recovery_suggestions`].
//! - [`PackagingError`]: failures while the pipeline runs (I/O, external tool
//!   exit codes, task failures). Always fatal to the current build.
//! - [`InternalError`]: broken invariants such as a cycle in the task graph.
//!   Not expected with a correct configuration and never retried.
//!
//! The [`Context`] and [`ErrorExt`] traits and the [`bail!`](crate::bail)
//! macro mirror the way bundling code attaches context to failures.

use std::{
    fmt::Display,
    io,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the packager.
#[derive(Debug, DeriveError)]
pub enum Error {
    /// Invalid user input, detected before any task runs.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure while building the image or package.
    #[error("Packaging error: {0}")]
    Packaging(#[from] PackagingError),

    /// Broken internal invariant.
    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),

    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),
}

/// Errors the user resolves by changing the packaging input.
#[derive(Debug, DeriveError)]
pub enum ConfigError {
    /// The build root must be empty when the environment is created.
    #[error("build root {path} is not empty")]
    BuildRootNotEmpty {
        /// Offending build root
        path: PathBuf,
    },

    /// `BuildEnvBuilder::create` was called without an app image directory.
    #[error("app image directory not set for build root {build_root}")]
    AppImageDirNotSet {
        /// Build root of the environment being created
        build_root: PathBuf,
    },

    /// Install directory rejected for the package type.
    #[error("invalid install directory {path}: {reason}")]
    InvalidInstallDir {
        /// Configured install directory
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// Two launchers share a name.
    #[error("duplicate launcher name '{name}'")]
    DuplicateLauncher {
        /// Launcher name
        name: String,
    },

    /// A required option is missing or contradicts another one.
    #[error("invalid option '{option}': {reason}")]
    InvalidOption {
        /// Option or field name
        option: String,
        /// Why it was rejected
        reason: String,
    },

    /// The packaging descriptor could not be read or parsed.
    #[error("failed to load packaging descriptor {path}: {reason}")]
    Descriptor {
        /// Descriptor path
        path: PathBuf,
        /// Parse or read failure
        reason: String,
    },

    /// A required external tool is not available.
    #[error("tool '{tool}' not found")]
    ToolNotFound {
        /// Tool name
        tool: String,
    },

    /// A predefined app image is unusable.
    #[error(transparent)]
    AppImageFile(#[from] AppImageFileError),
}

/// Failures loading the `.jpackage.xml` file of an existing app image.
#[derive(Debug, DeriveError)]
pub enum AppImageFileError {
    /// No metadata file in the app image.
    #[error("app image file {path} not found")]
    Missing {
        /// Expected file path
        path: PathBuf,
    },

    /// The file is not well-formed XML.
    #[error("app image file {path} is malformed: {reason}")]
    Malformed {
        /// File path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Well-formed XML that does not match the expected document shape.
    #[error("app image file {path} is invalid: {reason}")]
    InvalidSchema {
        /// File path
        path: PathBuf,
        /// What is missing or unexpected
        reason: String,
    },

    /// Written by another platform or another creator version.
    #[error("app image file {path} was created by {found}, expected {expected}")]
    ForeignImage {
        /// File path
        path: PathBuf,
        /// `platform/version` of the current process
        expected: String,
        /// `platform/version` recorded in the file
        found: String,
    },
}

/// Failures while the pipeline executes.
#[derive(Debug, DeriveError)]
pub enum PackagingError {
    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Operation being performed (e.g., "copying file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Child process could not be started.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to start
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// External tool exited unsuccessfully.
    #[error("{tool} exited with {}:\n{output}", exit_label(.code))]
    ToolFailed {
        /// Tool name
        tool: String,
        /// Exit code, if any
        code: Option<i32>,
        /// Captured stdout and stderr
        output: String,
    },

    /// External tool did not finish in time.
    #[error("{tool} timed out after {seconds}s")]
    ToolTimedOut {
        /// Tool name
        tool: String,
        /// Timeout that expired
        seconds: u64,
    },

    /// A pipeline task failed; the first failure aborts the pipeline.
    #[error("task {task} failed: {source}")]
    TaskFailed {
        /// Task identifier
        task: String,
        /// Underlying failure
        source: Box<Error>,
    },

    /// A pipeline task panicked.
    #[error("task {task} panicked: {reason}")]
    TaskPanicked {
        /// Task identifier
        task: String,
        /// Panic or join failure description
        reason: String,
    },

    /// XML serialization failure.
    #[error("failed to write {path}: {reason}")]
    Xml {
        /// Target file
        path: PathBuf,
        /// Writer message
        reason: String,
    },

    /// Resource template substitution failure.
    #[error("failed to render resource {name}: {reason}")]
    Template {
        /// Resource name
        name: String,
        /// Renderer message
        reason: String,
    },

    /// Error walking a directory tree.
    #[error("{0}")]
    Walkdir(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripPrefix(#[from] path::StripPrefixError),

    /// Generic error with custom message.
    #[error("{0}")]
    Generic(String),
}

/// Broken invariants. These indicate a programming error.
#[derive(Debug, DeriveError)]
pub enum InternalError {
    /// The task graph contains a cycle.
    #[error("cycle detected in task graph at {node}")]
    CycleDetected {
        /// A node on the cycle
        node: String,
    },

    /// `resolve_at` called on an already resolved layout.
    #[error("layout is already resolved at {root}")]
    LayoutAlreadyResolved {
        /// Current root
        root: PathBuf,
    },

    /// `unresolve` called on a layout that was never resolved.
    #[error("layout is not resolved")]
    LayoutNotResolved,

    /// A layout template maps a role to an absolute path.
    #[error("layout path for role {role} must be relative, got {path}")]
    AbsoluteLayoutPath {
        /// Offending role
        role: String,
        /// Offending path
        path: PathBuf,
    },

    /// A layout template lacks a role its kind requires.
    #[error("layout has no path for role {role}")]
    MissingLayoutRole {
        /// Missing role
        role: String,
    },

    /// A task action kind cannot be dispatched in the current context.
    #[error("task {task} has a {kind} action that cannot run in {mode} mode")]
    ActionContextMismatch {
        /// Task identifier
        task: String,
        /// Action kind
        kind: &'static str,
        /// Pipeline mode
        mode: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

impl Error {
    /// Get actionable recovery suggestions for this error.
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            Error::Context(_, inner) => inner.recovery_suggestions(),
            Error::Packaging(PackagingError::TaskFailed { source, .. }) => {
                source.recovery_suggestions()
            }
            Error::Config(ConfigError::BuildRootNotEmpty { path }) => vec![
                format!("Remove the contents of {}", path.display()),
                "Point the build root at a fresh directory".to_string(),
            ],
            Error::Config(ConfigError::AppImageDirNotSet { .. }) => {
                vec!["Set the app image directory before creating the build environment".to_string()]
            }
            Error::Config(ConfigError::InvalidInstallDir { .. }) => vec![
                "Use an absolute install directory on Linux and macOS".to_string(),
                "Use a relative install directory on Windows".to_string(),
            ],
            Error::Config(ConfigError::DuplicateLauncher { name }) => {
                vec![format!("Rename one of the launchers called '{name}'")]
            }
            Error::Config(ConfigError::ToolNotFound { tool }) => vec![
                format!("Install {tool} and make sure it is on PATH"),
                format!("Configure an explicit path to {tool}"),
            ],
            Error::Config(ConfigError::AppImageFile(AppImageFileError::ForeignImage {
                ..
            })) => vec![
                "Rebuild the app image with this version of the packager".to_string(),
                "Package the app image on the platform it was created for".to_string(),
            ],
            Error::Config(ConfigError::AppImageFile(_)) => {
                vec!["Rebuild the app image; its metadata file is missing or damaged".to_string()]
            }
            Error::Packaging(PackagingError::ToolTimedOut { .. }) => {
                vec!["Raise APP_PACKAGER_TOOL_TIMEOUT".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Whether the user can fix this error by changing the input.
    pub fn is_config(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::Context(_, inner) => inner.is_config(),
            Error::Packaging(PackagingError::TaskFailed { source, .. }) => source.is_config(),
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        PackagingError::Generic(error.to_string()).into()
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        PackagingError::Walkdir(error).into()
    }
}

impl From<path::StripPrefixError> for Error {
    fn from(error: path::StripPrefixError) -> Self {
        PackagingError::StripPrefix(error).into()
    }
}

impl From<AppImageFileError> for Error {
    fn from(error: AppImageFileError) -> Self {
        ConfigError::AppImageFile(error).into()
    }
}

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with the packager's Error type.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| PackagingError::Generic(context.to_string()).into())
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| PackagingError::Generic(f().to_string()).into())
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying launcher".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| {
            PackagingError::Fs {
                context,
                path: path.into(),
                error,
            }
            .into()
        })
    }
}

/// Macro for early return with error.
///
/// Converts the message into a [`PackagingError::Generic`] and returns immediately.
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::error::Error::from($crate::error::PackagingError::Generic(format!($msg))))
    };
    ($err:expr $(,)?) => {
        return Err($crate::error::Error::from($crate::error::PackagingError::Generic($err.to_string())))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::from($crate::error::PackagingError::Generic(format!($fmt, $($arg)*))))
    };
}
