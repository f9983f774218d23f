//! Location of a node inside a compared object graph

use crate::error::PathError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator between field names in dotted paths
pub const FIELD_SEPARATOR: char = '.';

/// One step from a node to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named field of an object
    Field(String),
    /// Position in an array or ordered collection
    Index(usize),
    /// Key of a map entry, in textual form
    Key(String),
    /// Position of an element inside an unordered collection
    Position(usize),
}

impl PathSegment {
    /// Whether this segment names a field or key (as opposed to an element)
    pub fn is_named(&self) -> bool {
        matches!(self, PathSegment::Field(_) | PathSegment::Key(_))
    }
}

/// Ordered sequence of segments from the comparison root to a node
///
/// Paths are immutable: [`ComparisonPath::child`] and its shorthands return
/// a new path. Two renderings exist:
///
/// - the display form (`friends[1].name`) locates a node for reporting
/// - the rule key (`friends.name`) drops element segments so that
///   configuration rules apply to every element of a collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComparisonPath {
    segments: Vec<PathSegment>,
}

impl ComparisonPath {
    /// The root path (empty)
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted field path such as `home.address.street`
    pub fn parse(dotted: &str) -> Result<Self, PathError> {
        if dotted.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for part in dotted.split(FIELD_SEPARATOR) {
            if part.is_empty() {
                return Err(PathError::EmptySegment {
                    path: dotted.to_string(),
                });
            }
            segments.push(PathSegment::Field(part.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Create the path of a child node
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    pub fn field(&self, name: impl Into<String>) -> Self {
        self.child(PathSegment::Field(name.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    pub fn position(&self, position: usize) -> Self {
        self.child(PathSegment::Position(position))
    }

    /// Name of the last field or key on this path, if any
    pub fn last_name(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Field(name) | PathSegment::Key(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Dotted key used to look up configuration rules
    ///
    /// Element segments are dropped: `friends[2].name` becomes `friends.name`.
    pub fn rule_key(&self) -> String {
        let mut key = String::new();
        for segment in &self.segments {
            if let PathSegment::Field(name) | PathSegment::Key(name) = segment {
                if !key.is_empty() {
                    key.push(FIELD_SEPARATOR);
                }
                key.push_str(name);
            }
        }
        key
    }

    /// Rule keys of this path and all its named ancestors, longest first
    ///
    /// The root contributes nothing, so the result is empty for the root.
    pub fn rule_hierarchy(&self) -> Vec<String> {
        let mut hierarchy = Vec::new();
        let mut current = self.rule_key();
        while !current.is_empty() {
            let parent = match current.rfind(FIELD_SEPARATOR) {
                Some(idx) => current[..idx].to_string(),
                None => String::new(),
            };
            hierarchy.push(current);
            current = parent;
        }
        hierarchy
    }

    /// Whether `rule` names this path or one of its ancestors
    ///
    /// `home` matches `home.address.street` but never `homes`.
    pub fn is_within(&self, rule: &str) -> bool {
        let key = self.rule_key();
        is_same_or_descendant(&key, rule)
    }
}

/// Whether `key` equals `ancestor` or lies underneath it
pub(crate) fn is_same_or_descendant(key: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return false;
    }
    match key.strip_prefix(ancestor) {
        Some("") => true,
        Some(rest) => rest.starts_with(FIELD_SEPARATOR),
        None => false,
    }
}

impl FromStr for ComparisonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ComparisonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) | PathSegment::Key(name) => {
                    if i > 0 {
                        write!(f, "{}", FIELD_SEPARATOR)?;
                    }
                    f.write_str(name)?;
                }
                PathSegment::Index(idx) | PathSegment::Position(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl Serialize for ComparisonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
