use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::scalar::Scalar;

/// Structural problems found while parsing a path string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path '{path}' contains an empty segment")]
    EmptySegment { path: String },
    #[error("path segment '{segment}' is not a lower snake case key")]
    InvalidKey { segment: String },
    #[error("path segment '{segment}' has a malformed array index")]
    InvalidIndex { segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Segment {
    key: String,
    index: Option<usize>,
}

impl Segment {
    fn parse(raw: &str) -> Result<Self, PathError> {
        let (key, index) = match raw.find('[') {
            Some(open) => {
                let digits = raw[open + 1..]
                    .strip_suffix(']')
                    .filter(|digits| !digits.is_empty())
                    .ok_or_else(|| PathError::InvalidIndex {
                        segment: raw.to_string(),
                    })?;
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| PathError::InvalidIndex {
                        segment: raw.to_string(),
                    })?;
                (&raw[..open], Some(index))
            }
            None => (raw, None),
        };

        if !is_snake_case_key(key) {
            return Err(PathError::InvalidKey {
                segment: raw.to_string(),
            });
        }

        Ok(Self {
            key: key.to_string(),
            index,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.key, index),
            None => f.write_str(&self.key),
        }
    }
}

fn is_snake_case_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Immutable, dot-delimited address into an applicant document.
///
/// Any segment may carry an array index (`household_members[2].name`); the path is an
/// *array element* when its last segment does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The empty path addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let segments = trimmed
            .split('.')
            .map(|segment| {
                if segment.is_empty() {
                    Err(PathError::EmptySegment {
                        path: raw.to_string(),
                    })
                } else {
                    Segment::parse(segment)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a plain key segment.
    pub fn join(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment {
            key: key.to_string(),
            index: None,
        });
        Self { segments }
    }

    pub fn join_scalar(&self, scalar: Scalar) -> Self {
        self.join(scalar.key())
    }

    /// Resolve a path relative to this one.
    pub fn concat(&self, relative: &Path) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        Self { segments }
    }

    /// Drop the last segment. The root is its own parent.
    pub fn parent_path(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    pub fn is_array_element(&self) -> bool {
        self.array_index().is_some()
    }

    pub fn array_index(&self) -> Option<usize> {
        self.segments.last().and_then(|segment| segment.index)
    }

    /// Address element `index` of the list stored at this path.
    pub fn at_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            last.index = Some(index);
        }
        Self { segments }
    }

    /// Strip the array index from the last segment; schema lookups use this form.
    pub fn without_array_reference(&self) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            last.index = None;
        }
        Self { segments }
    }

    /// Last segment key without any index suffix; empty for the root.
    pub fn key_name(&self) -> &str {
        self.segments
            .last()
            .map(|segment| segment.key.as_str())
            .unwrap_or("")
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Iterate `(key, index)` pairs from the root down.
    pub fn segments(&self) -> impl Iterator<Item = (&str, Option<usize>)> {
        self.segments
            .iter()
            .map(|segment| (segment.key.as_str(), segment.index))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Path> for String {
    fn from(value: Path) -> Self {
        value.to_string()
    }
}

impl Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Path::parse(&raw).map_err(serde::de::Error::custom)
    }
}
