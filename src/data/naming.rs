//! Object names, paths and identifiers.

use crate::error::{ObjectError, Result};
use std::fmt;

/// Separator between path components.
pub const SEPARATOR: &str = "/";

/// Canonical `(name, path, full name)` triple of an object.
///
/// `path` starts and ends with the separator and is absent only for the root
/// and for names given without any path. `full_name` is always slash-rooted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    name: String,
    path: Option<String>,
    full_name: String,
}

impl ObjectName {
    /// Normalize a name and path given separately or as one combined path.
    ///
    /// Either argument may carry the full path: `new(None, Some("/a/b"))` and
    /// `new(Some("/a/b"), None)` both yield name `b` under path `/a/`.
    pub fn new(name: Option<&str>, path: Option<&str>) -> Self {
        let (name, path) = match (name, path) {
            (None, None) => (SEPARATOR.to_string(), None),
            (None, Some(p)) => split_full_path(p),
            (Some(n), None) if n.contains(SEPARATOR) => split_full_path(n),
            (Some(n), p) => (n.to_string(), p.map(str::to_string)),
        };
        let path = path.map(|p| normalize_path(&p));
        let full_name = join(&name, path.as_deref());
        Self {
            name,
            path,
            full_name,
        }
    }

    /// The root object.
    pub fn root() -> Self {
        Self::new(None, Some(SEPARATOR))
    }

    /// Object name (the last path component).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent path, ending with the separator.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Full path of the object.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Check if this is the root object.
    pub fn is_root(&self) -> bool {
        self.name == SEPARATOR && self.path.is_none()
    }

    /// Rename the object in place.
    ///
    /// A leading separator and one trailing separator are ignored. Renaming
    /// the root, renaming to the root, and names that still contain the
    /// separator are rejected.
    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        if self.is_root() {
            return Err(ObjectError::InvalidName("the root cannot be renamed".to_string()));
        }
        if new_name == SEPARATOR {
            return Err(ObjectError::InvalidName("the new name cannot be the root".to_string()));
        }
        let trimmed = new_name.strip_prefix(SEPARATOR).unwrap_or(new_name);
        let trimmed = trimmed.strip_suffix(SEPARATOR).unwrap_or(trimmed);
        if trimmed.contains(SEPARATOR) {
            return Err(ObjectError::InvalidName(format!(
                "'{}' contains the separator character {}",
                new_name, SEPARATOR
            )));
        }
        if trimmed.is_empty() {
            return Err(ObjectError::InvalidName("the new name is empty".to_string()));
        }
        self.name = trimmed.to_string();
        self.full_name = join(&self.name, self.path.as_deref());
        Ok(())
    }

    /// Move the object under a new parent path; `None` means the root group.
    pub fn set_path(&mut self, new_path: Option<&str>) {
        let path = normalize_path(new_path.unwrap_or(SEPARATOR));
        self.full_name = join(&self.name, Some(&path));
        self.path = Some(path);
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Split `/a/b/c` into (`c`, `/a/b`); the bare separator is the root.
fn split_full_path(full: &str) -> (String, Option<String>) {
    if full == SEPARATOR {
        return (SEPARATOR.to_string(), None);
    }
    let mut full = if full.starts_with(SEPARATOR) {
        full.to_string()
    } else {
        format!("{}{}", SEPARATOR, full)
    };
    if full.len() > 1 && full.ends_with(SEPARATOR) {
        full.pop();
    }
    match full.rfind(SEPARATOR) {
        Some(idx) => (full[idx + 1..].to_string(), Some(full[..idx].to_string())),
        None => (full, Some(SEPARATOR.to_string())),
    }
}

fn normalize_path(path: &str) -> String {
    let mut path = path.to_string();
    while path.contains("//") {
        path = path.replace("//", SEPARATOR);
    }
    if !path.starts_with(SEPARATOR) {
        path.insert_str(0, SEPARATOR);
    }
    if !path.ends_with(SEPARATOR) {
        path.push_str(SEPARATOR);
    }
    path
}

fn join(name: &str, path: Option<&str>) -> String {
    match path {
        Some(p) => format!("{}{}", p, name),
        None if name.starts_with(SEPARATOR) => name.to_string(),
        None => format!("{}{}", SEPARATOR, name),
    }
}

/// Backend-assigned identifier of a stored object.
///
/// Only used for equality: two ids match when they agree on every component
/// up to the shorter length. Empty ids never match.
#[derive(Debug, Clone, Default)]
pub struct ObjectId(Vec<u64>);

impl ObjectId {
    /// Wrap identifier components.
    pub fn new(components: impl Into<Vec<u64>>) -> Self {
        Self(components.into())
    }

    /// Identifier components.
    pub fn components(&self) -> &[u64] {
        &self.0
    }

    /// Check if both ids refer to the same stored object.
    pub fn same_object(&self, other: &ObjectId) -> bool {
        if self.0.is_empty() || other.0.is_empty() {
            return false;
        }
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a == b)
    }
}
