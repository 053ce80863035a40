//! Path arithmetic for the remote, slash-delimited namespace.
//!
//! Remote directories are always absolute: they start with `/` and carry no
//! trailing `/` unless they are the root itself.

use std::fmt;

use crate::error::{AppError, Result};

pub const ROOT: &str = "/";

/// Parent of `path`.
///
/// Trailing slashes are ignored. Anything whose last separator sits at
/// index 0 (or that has no separator at all) has `/` as its parent. The root
/// has no meaningful parent; callers check [`RemotePath::is_root`] first, and
/// `/` is returned if they don't.
pub fn parent_of(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        None | Some(0) => ROOT.to_string(),
        Some(idx) => trimmed[..idx].to_string(),
    }
}

/// Child `name` of `path`.
///
/// `name` is not validated; it must come from a listing entry. A name
/// containing `/` yields a malformed path.
pub fn child_of(path: &str, name: &str) -> String {
    if path == ROOT {
        format!("/{name}")
    } else {
        format!("{path}/{name}")
    }
}

/// Collapse repeated separators and strip the trailing one.
pub fn normalize(path: &str) -> String {
    let joined = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// An absolute remote directory path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    /// Parse user supplied input. Must be absolute; redundant slashes are
    /// dropped.
    pub fn new(path: &str) -> Result<Self> {
        if !path.starts_with('/') {
            return Err(AppError::ValidationError(format!(
                "Remote path must be absolute: '{path}'"
            )));
        }
        Ok(Self(normalize(path)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self(parent_of(&self.0)))
        }
    }

    pub fn child(&self, name: &str) -> Self {
        Self(child_of(&self.0, name))
    }

    /// Last path segment, empty for the root.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl Default for RemotePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
