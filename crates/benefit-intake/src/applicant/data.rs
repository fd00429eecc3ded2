use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::locale::Locale;
use super::path::Path;

/// Top-level namespace every applicant answer lives under.
pub const APPLICANT_KEY: &str = "applicant";

/// `applicant`, the context path for non-repeated questions.
pub fn applicant_path() -> Path {
    Path::root().join(APPLICANT_KEY)
}

/// Structural write failures. Reads never fail; they return `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("path '{0}' is outside the applicant namespace")]
    OutsideNamespace(Path),
    #[error("path '{path}' runs into an existing {found} value")]
    ShapeMismatch { path: Path, found: &'static str },
    #[error("index {index} at '{path}' would leave a gap after {len} element(s)")]
    SparseIndex {
        path: Path,
        index: usize,
        len: usize,
    },
    #[error("list at '{path}' holds {existing} values, cannot store {attempted}")]
    ListTypeMismatch {
        path: Path,
        existing: &'static str,
        attempted: &'static str,
    },
}

/// One node of the answer tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Node {
    Long(i64),
    String(String),
    Array(Vec<Node>),
    Branch(BTreeMap<String, Node>),
}

impl Node {
    const fn kind(&self) -> &'static str {
        match self {
            Node::Long(_) => "long",
            Node::String(_) => "string",
            Node::Array(_) => "list",
            Node::Branch(_) => "object",
        }
    }

    const fn is_leaf(&self) -> bool {
        matches!(self, Node::Long(_) | Node::String(_))
    }
}

/// Per-applicant answer document addressed by [`Path`].
///
/// Equality is structural so two documents holding the same answers compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preferred_locale: Option<Locale>,
    #[serde(default)]
    applicant: BTreeMap<String, Node>,
}

impl ApplicantData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(locale: Locale) -> Self {
        Self {
            preferred_locale: Some(locale),
            applicant: BTreeMap::new(),
        }
    }

    /// The applicant's chosen locale, or the system default.
    pub fn preferred_locale(&self) -> Locale {
        self.preferred_locale.clone().unwrap_or_default()
    }

    pub fn has_preferred_locale(&self) -> bool {
        self.preferred_locale.is_some()
    }

    pub fn set_preferred_locale(&mut self, locale: Locale) {
        self.preferred_locale = Some(locale);
    }

    pub fn put_string(&mut self, path: &Path, value: impl Into<String>) -> Result<(), DocumentError> {
        self.write(path, Node::String(value.into()))
    }

    pub fn put_long(&mut self, path: &Path, value: i64) -> Result<(), DocumentError> {
        self.write(path, Node::Long(value))
    }

    /// Replace the list stored at `path` wholesale.
    pub fn put_string_list(&mut self, path: &Path, values: Vec<String>) -> Result<(), DocumentError> {
        self.write_list(path, values.into_iter().map(Node::String).collect())
    }

    /// Replace the list stored at `path` wholesale.
    pub fn put_long_list(&mut self, path: &Path, values: Vec<i64>) -> Result<(), DocumentError> {
        self.write_list(path, values.into_iter().map(Node::Long).collect())
    }

    pub fn read_string(&self, path: &Path) -> Option<String> {
        match self.node(path)? {
            Node::String(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn read_long(&self, path: &Path) -> Option<i64> {
        match self.node(path)? {
            Node::Long(value) => Some(*value),
            _ => None,
        }
    }

    pub fn read_string_list(&self, path: &Path) -> Option<Vec<String>> {
        match self.node(path)? {
            Node::Array(items) => items
                .iter()
                .map(|item| match item {
                    Node::String(value) => Some(value.clone()),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    pub fn read_long_list(&self, path: &Path) -> Option<Vec<i64>> {
        match self.node(path)? {
            Node::Array(items) => items
                .iter()
                .map(|item| match item {
                    Node::Long(value) => Some(*value),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// True when a leaf or container exists at exactly this path.
    pub fn has_path(&self, path: &Path) -> bool {
        if path == &applicant_path() {
            return !self.applicant.is_empty();
        }
        self.node(path).is_some()
    }

    /// Number of elements stored in the list at `path`; zero when absent.
    pub fn array_len(&self, path: &Path) -> usize {
        match self.node(path) {
            Some(Node::Array(items)) => items.len(),
            _ => 0,
        }
    }

    /// Drop the elements of the list at `path` whose positions are in `indices`.
    ///
    /// Later elements shift down so the list stays dense. Positions past the end are ignored.
    pub fn remove_array_elements(
        &mut self,
        path: &Path,
        indices: &BTreeSet<usize>,
    ) -> Result<(), DocumentError> {
        match self.node_mut(path) {
            Some(Node::Array(items)) => {
                let mut position = 0;
                items.retain(|_| {
                    let keep = !indices.contains(&position);
                    position += 1;
                    keep
                });
                Ok(())
            }
            Some(other) => Err(DocumentError::ShapeMismatch {
                path: path.clone(),
                found: other.kind(),
            }),
            None => Ok(()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn node(&self, path: &Path) -> Option<&Node> {
        let mut segments = path.segments();
        match segments.next() {
            Some((APPLICANT_KEY, None)) => {}
            _ => return None,
        }

        let mut container = &self.applicant;
        let mut current: Option<&Node> = None;
        for (key, index) in segments {
            if let Some(node) = current {
                container = match node {
                    Node::Branch(children) => children,
                    _ => return None,
                };
            }
            let node = container.get(key)?;
            current = Some(match index {
                Some(index) => match node {
                    Node::Array(items) => items.get(index)?,
                    _ => return None,
                },
                None => node,
            });
        }
        current
    }

    fn node_mut(&mut self, path: &Path) -> Option<&mut Node> {
        let mut segments = path.segments();
        match segments.next() {
            Some((APPLICANT_KEY, None)) => {}
            _ => return None,
        }

        let mut container = &mut self.applicant;
        let mut segments = segments.peekable();
        loop {
            let (key, index) = segments.next()?;
            let node = container.get_mut(key)?;
            let node = match index {
                Some(index) => match node {
                    Node::Array(items) => items.get_mut(index)?,
                    _ => return None,
                },
                None => node,
            };
            if segments.peek().is_none() {
                return Some(node);
            }
            container = match node {
                Node::Branch(children) => children,
                _ => return None,
            };
        }
    }

    fn namespace_segments<'a>(
        &self,
        path: &'a Path,
    ) -> Result<Vec<(&'a str, Option<usize>)>, DocumentError> {
        let mut segments = path.segments();
        match segments.next() {
            Some((APPLICANT_KEY, None)) => {}
            _ => return Err(DocumentError::OutsideNamespace(path.clone())),
        }
        let rest: Vec<_> = segments.collect();
        if rest.is_empty() {
            return Err(DocumentError::OutsideNamespace(path.clone()));
        }
        Ok(rest)
    }

    fn write(&mut self, path: &Path, value: Node) -> Result<(), DocumentError> {
        let segments = self.namespace_segments(path)?;
        write_into(&mut self.applicant, &segments, value, path)
    }

    fn write_list(&mut self, path: &Path, items: Vec<Node>) -> Result<(), DocumentError> {
        if path.is_array_element() {
            return Err(DocumentError::ShapeMismatch {
                path: path.clone(),
                found: "list element",
            });
        }
        let segments = self.namespace_segments(path)?;
        write_into(&mut self.applicant, &segments, Node::Array(items), path)
    }
}

fn write_into(
    container: &mut BTreeMap<String, Node>,
    segments: &[(&str, Option<usize>)],
    value: Node,
    path: &Path,
) -> Result<(), DocumentError> {
    let Some(((key, index), rest)) = segments.split_first() else {
        return Ok(());
    };

    if rest.is_empty() {
        return match index {
            None => write_leaf(container, key, value, path),
            Some(index) => write_element(container, key, *index, value, path),
        };
    }

    let child = match index {
        None => container
            .entry((*key).to_string())
            .or_insert_with(|| Node::Branch(BTreeMap::new())),
        Some(index) => {
            let list = container
                .entry((*key).to_string())
                .or_insert_with(|| Node::Array(Vec::new()));
            let items = match list {
                Node::Array(items) => items,
                other => {
                    return Err(DocumentError::ShapeMismatch {
                        path: path.clone(),
                        found: other.kind(),
                    })
                }
            };
            if *index > items.len() {
                return Err(DocumentError::SparseIndex {
                    path: path.clone(),
                    index: *index,
                    len: items.len(),
                });
            }
            if *index == items.len() {
                items.push(Node::Branch(BTreeMap::new()));
            }
            &mut items[*index]
        }
    };

    match child {
        Node::Branch(children) => write_into(children, rest, value, path),
        other => Err(DocumentError::ShapeMismatch {
            path: path.clone(),
            found: other.kind(),
        }),
    }
}

fn write_leaf(
    container: &mut BTreeMap<String, Node>,
    key: &str,
    value: Node,
    path: &Path,
) -> Result<(), DocumentError> {
    if let Some(existing) = container.get(key) {
        let compatible = match (&value, existing) {
            (Node::Array(_), Node::Array(_)) => true,
            (new, old) => new.is_leaf() && old.is_leaf(),
        };
        if !compatible {
            return Err(DocumentError::ShapeMismatch {
                path: path.clone(),
                found: existing.kind(),
            });
        }
    }
    container.insert(key.to_string(), value);
    Ok(())
}

fn write_element(
    container: &mut BTreeMap<String, Node>,
    key: &str,
    index: usize,
    value: Node,
    path: &Path,
) -> Result<(), DocumentError> {
    let list = container
        .entry(key.to_string())
        .or_insert_with(|| Node::Array(Vec::new()));
    let items = match list {
        Node::Array(items) => items,
        other => {
            return Err(DocumentError::ShapeMismatch {
                path: path.clone(),
                found: other.kind(),
            })
        }
    };

    if let Some(existing) = items.iter().find(|item| item.kind() != value.kind()) {
        return Err(DocumentError::ListTypeMismatch {
            path: path.clone(),
            existing: existing.kind(),
            attempted: value.kind(),
        });
    }

    match index.cmp(&items.len()) {
        std::cmp::Ordering::Less => items[index] = value,
        std::cmp::Ordering::Equal => items.push(value),
        std::cmp::Ordering::Greater => {
            return Err(DocumentError::SparseIndex {
                path: path.clone(),
                index,
                len: items.len(),
            })
        }
    }
    Ok(())
}
