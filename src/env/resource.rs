//! Resources the user can override by dropping a file into the resource
//! directory.

use crate::{
    error::{ErrorExt, PackagingError, Result},
    utils::fs,
};
use handlebars::Handlebars;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Where a resource's contents come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    /// User-supplied file in the resource directory.
    Override(PathBuf),
    /// Built-in default file.
    DefaultPath(PathBuf),
    /// Built-in default contents.
    DefaultBytes,
}

/// A named resource with an optional built-in default.
///
/// Lookup order: `<resource_dir>/<name>`, then the default path or bytes.
/// Text resources may contain `{{KEY}}` placeholders which are substituted
/// without escaping.
#[derive(Debug, Clone)]
pub struct OverridableResource {
    name: String,
    category: String,
    resource_dir: Option<PathBuf>,
    default_path: Option<PathBuf>,
    default_bytes: Option<Vec<u8>>,
    substitutions: BTreeMap<String, String>,
}

impl OverridableResource {
    /// Creates a resource looked up in `resource_dir`.
    pub fn new(name: impl Into<String>, resource_dir: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            category: "resource".to_string(),
            resource_dir,
            default_path: None,
            default_bytes: None,
            substitutions: BTreeMap::new(),
        }
    }

    /// Sets a human-readable category used in log messages.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Uses the file at `path` when there is no override.
    pub fn with_default_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.default_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Uses `bytes` when there is no override.
    pub fn with_default_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.default_bytes = Some(bytes.into());
        self
    }

    /// Replaces `{{key}}` with `value` in the resource contents.
    pub fn with_substitution(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.substitutions.insert(key.into(), value.into());
        self
    }

    /// Resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the override file, if one exists.
    pub fn override_path(&self) -> Option<PathBuf> {
        let path = self.resource_dir.as_ref()?.join(&self.name);
        path.is_file().then_some(path)
    }

    /// Resolves where the contents would come from; `None` if nowhere.
    pub fn source(&self) -> Option<ResourceSource> {
        if let Some(path) = self.override_path() {
            return Some(ResourceSource::Override(path));
        }
        if let Some(path) = &self.default_path {
            return Some(ResourceSource::DefaultPath(path.clone()));
        }
        self.default_bytes
            .as_ref()
            .map(|_| ResourceSource::DefaultBytes)
    }

    /// Reads the resource with substitutions applied.
    pub fn read(&self) -> Result<Option<Vec<u8>>> {
        let bytes = match self.source() {
            None => return Ok(None),
            Some(ResourceSource::Override(path)) => {
                log::debug!("Using custom {} {}", self.category, path.display());
                std::fs::read(&path).fs_context("reading resource", &path)?
            }
            Some(ResourceSource::DefaultPath(path)) => {
                log::debug!("Using default {} {}", self.category, self.name);
                std::fs::read(&path).fs_context("reading resource", &path)?
            }
            Some(ResourceSource::DefaultBytes) => {
                log::debug!("Using default {} {}", self.category, self.name);
                self.default_bytes.clone().unwrap_or_default()
            }
        };

        if self.substitutions.is_empty() {
            return Ok(Some(bytes));
        }
        let text = String::from_utf8(bytes).map_err(|e| PackagingError::Template {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(self.render(&text)?.into_bytes()))
    }

    fn render(&self, text: &str) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .render_template(text, &self.substitutions)
            .map_err(|e| {
                PackagingError::Template {
                    name: self.name.clone(),
                    reason: e.to_string(),
                }
                .into()
            })
    }

    /// Writes the resource to `dest`. Returns `false` when the resource has
    /// neither an override nor a default.
    pub fn save_to_file(&self, dest: &Path) -> Result<bool> {
        match self.read()? {
            Some(bytes) => {
                fs::write_file(dest, bytes)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
