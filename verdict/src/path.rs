//! Structural paths used to group failures and address values.

use std::fmt;

use serde::{Serialize, Serializer};

/// One step in a [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named key in a map-like value.
    Key(String),
    /// A position in a sequence.
    Index(usize),
    /// Any position in a sequence.
    Wildcard,
}

/// Immutable structural location within the validated data.
///
/// A path is a sequence of segments; the empty sequence is the
/// distinguished root path. Two paths are equal iff their segment
/// sequences are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    /// The root path (whole-object scope).
    pub fn root() -> Self {
        KeyPath {
            segments: Vec::new(),
        }
    }

    /// Path consisting of a single named key.
    pub fn key(name: impl Into<String>) -> Self {
        KeyPath {
            segments: vec![Segment::Key(name.into())],
        }
    }

    /// Path built from an explicit segment sequence.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        KeyPath { segments }
    }

    /// Parse a dotted name into a path: `items.0.*` becomes
    /// `[Key("items"), Index(0), Wildcard]`. The empty string is root.
    pub fn parse(spec: &str) -> Self {
        if spec.is_empty() {
            return KeyPath::root();
        }
        let segments = spec
            .split('.')
            .map(|part| {
                if part == "*" {
                    Segment::Wildcard
                } else if let Ok(index) = part.parse::<usize>() {
                    Segment::Index(index)
                } else {
                    Segment::Key(part.to_string())
                }
            })
            .collect();
        KeyPath { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                write!(f, ".")?;
            }
            match segment {
                Segment::Key(name) => write!(f, "{name}")?,
                Segment::Index(index) => write!(f, "{index}")?,
                Segment::Wildcard => write!(f, "*")?,
            }
        }
        Ok(())
    }
}

// Records serialize their path as the dotted rendering; the wire shape of
// full failure messages is owned by the downstream renderer.
impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&str> for KeyPath {
    fn from(spec: &str) -> Self {
        KeyPath::parse(spec)
    }
}

impl From<String> for KeyPath {
    fn from(spec: String) -> Self {
        KeyPath::parse(&spec)
    }
}

impl From<usize> for KeyPath {
    fn from(index: usize) -> Self {
        KeyPath::from_segments(vec![Segment::Index(index)])
    }
}

impl From<Vec<Segment>> for KeyPath {
    fn from(segments: Vec<Segment>) -> Self {
        KeyPath::from_segments(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Equality is defined by the segment sequence, regardless of how the
    /// path was constructed.
    #[test]
    fn equality_by_segments() {
        assert_eq!(KeyPath::key("age"), KeyPath::parse("age"));
        assert_eq!(KeyPath::parse(""), KeyPath::root());
        assert_ne!(KeyPath::key("age"), KeyPath::key("name"));
    }

    #[test]
    fn parse_handles_indices_and_wildcards() {
        let path = KeyPath::parse("items.0.*");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("items".to_string()),
                Segment::Index(0),
                Segment::Wildcard
            ]
        );
    }

    #[test]
    fn display_round_trips_dotted_names() {
        let path = KeyPath::parse("address.street");
        assert_eq!(path.to_string(), "address.street");
        assert_eq!(KeyPath::root().to_string(), "");
    }

    #[test]
    fn root_is_the_empty_sequence() {
        assert!(KeyPath::root().is_root());
        assert!(!KeyPath::key("age").is_root());
    }
}
