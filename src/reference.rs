//! Slash-separated logical references
//!
//! [`Path`] is the reference type for document stores and realtime databases
//! addressed by path. Malformed paths fail at construction time, never later
//! inside an async state.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{BackendError, BackendResult};

/// A validated path such as `users/123` or `rooms/a/messages`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Parse a path, trimming surrounding slashes.
    ///
    /// Fails on an empty path or an empty segment (`a//b`).
    pub fn parse(raw: &str) -> BackendResult<Self> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(BackendError::InvalidReference(format!(
                "empty path: {raw:?}"
            )));
        }
        let segments = trimmed
            .split('/')
            .map(|segment| {
                if segment.is_empty() {
                    Err(BackendError::InvalidReference(format!(
                        "empty segment in path {raw:?}"
                    )))
                } else {
                    Ok(segment.to_string())
                }
            })
            .collect::<BackendResult<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// True for document paths (even number of segments)
    pub fn is_document(&self) -> bool {
        self.segments.len() % 2 == 0
    }

    /// True for collection paths (odd number of segments)
    pub fn is_collection(&self) -> bool {
        !self.is_document()
    }

    /// Append one or more segments
    pub fn child(&self, relative: &str) -> BackendResult<Self> {
        let relative = Path::parse(relative)?;
        let mut segments = self.segments.clone();
        segments.extend(relative.segments);
        Ok(Self { segments })
    }

    /// Path without its last segment, `None` at the root level
    pub fn parent(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for Path {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = BackendError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Path::parse(&value)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}
