//! Dotted target paths
//!
//! A target path such as `dialogRenderer.DrawNextArrow` names a member of the
//! program's root scope. Every segment but the last is an object, the last
//! segment names the function slot being patched.

use std::fmt;
use std::str::FromStr;

/// Validated dotted path naming a patchable function
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetPath {
    raw: String,
}

/// Error returned when a string is not a usable target path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTargetPath {
    /// The rejected input
    pub path: String,
    /// Why it was rejected
    pub reason: &'static str,
}

impl fmt::Display for InvalidTargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid target path '{}': {}", self.path, self.reason)
    }
}

impl std::error::Error for InvalidTargetPath {}

impl TargetPath {
    /// Parse and validate a dotted path
    pub fn parse(path: &str) -> Result<Self, InvalidTargetPath> {
        let reject = |reason| InvalidTargetPath {
            path: path.to_string(),
            reason,
        };

        if path.is_empty() {
            return Err(reject("path is empty"));
        }

        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(reject("path contains an empty segment"));
            }
            if segment.chars().any(char::is_whitespace) {
                return Err(reject("path segments cannot contain whitespace"));
            }
        }

        Ok(Self {
            raw: path.to_string(),
        })
    }

    /// The path as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Iterate over all segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('.')
    }

    /// Number of segments (always at least one)
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Segments leading to the owning object (everything but the last)
    pub fn parent_segments(&self) -> impl Iterator<Item = &str> {
        let depth = self.depth();
        self.segments().take(depth - 1)
    }

    /// The member name the function is stored under
    pub fn name(&self) -> &str {
        self.raw.rsplit('.').next().unwrap_or(&self.raw)
    }

    /// Path to the owning object, `None` for members of the root scope
    pub fn parent(&self) -> Option<TargetPath> {
        self.raw.rsplit_once('.').map(|(parent, _)| TargetPath {
            raw: parent.to_string(),
        })
    }

    /// Append a child segment
    pub fn child(&self, name: &str) -> Result<TargetPath, InvalidTargetPath> {
        TargetPath::parse(&format!("{}.{}", self.raw, name))
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for TargetPath {
    type Err = InvalidTargetPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetPath::parse(s)
    }
}

impl TryFrom<&str> for TargetPath {
    type Error = InvalidTargetPath;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        TargetPath::parse(value)
    }
}

impl TryFrom<String> for TargetPath {
    type Error = InvalidTargetPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TargetPath::parse(&value)
    }
}

impl TryFrom<&String> for TargetPath {
    type Error = InvalidTargetPath;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        TargetPath::parse(value)
    }
}

/// Conversion accepted by every API taking a target path
///
/// Lets callers pass either a string or an already parsed [`TargetPath`].
pub trait IntoTargetPath {
    fn into_target_path(self) -> Result<TargetPath, InvalidTargetPath>;
}

impl IntoTargetPath for TargetPath {
    fn into_target_path(self) -> Result<TargetPath, InvalidTargetPath> {
        Ok(self)
    }
}

impl IntoTargetPath for &TargetPath {
    fn into_target_path(self) -> Result<TargetPath, InvalidTargetPath> {
        Ok(self.clone())
    }
}

impl IntoTargetPath for &str {
    fn into_target_path(self) -> Result<TargetPath, InvalidTargetPath> {
        TargetPath::parse(self)
    }
}

impl IntoTargetPath for String {
    fn into_target_path(self) -> Result<TargetPath, InvalidTargetPath> {
        TargetPath::parse(&self)
    }
}

impl IntoTargetPath for &String {
    fn into_target_path(self) -> Result<TargetPath, InvalidTargetPath> {
        TargetPath::parse(self)
    }
}

impl AsRef<str> for TargetPath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
