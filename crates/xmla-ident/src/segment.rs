//! Identifier data model: segments, identifiers and tuples.

use std::fmt;

use crate::format::{quote_name, write_name};

// =============================================================================
// Name segments
// =============================================================================

/// How a name segment was written in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Quoting {
    /// Enclosed in square brackets: `[Time]`
    Quoted,
    /// Bare text: `1997`
    Unquoted,
}

/// A display name, together with the way it was quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NameSegment {
    /// The name with bracket escapes removed.
    pub name: String,
    /// Whether the name was bracketed.
    pub quoting: Quoting,
}

impl NameSegment {
    /// Creates a bracket-quoted name segment.
    pub fn quoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoting: Quoting::Quoted,
        }
    }

    /// Creates a bare name segment.
    pub fn unquoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoting: Quoting::Unquoted,
        }
    }
}

impl fmt::Display for NameSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_name(f, &self.name, self.quoting)
    }
}

// =============================================================================
// Segments
// =============================================================================

/// One step of a member path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Segment {
    /// A display name: `[Q3]`, `1997`.
    Name(NameSegment),
    /// A compound business key introduced by `&`: `&[SF]&CA&USA`.
    ///
    /// Always holds at least one part.
    Key(Vec<NameSegment>),
}

impl Segment {
    /// Creates a quoted name segment.
    pub fn quoted(name: impl Into<String>) -> Self {
        Segment::Name(NameSegment::quoted(name))
    }

    /// Creates an unquoted name segment.
    pub fn unquoted(name: impl Into<String>) -> Self {
        Segment::Name(NameSegment::unquoted(name))
    }

    /// Returns true if this is a key segment.
    pub fn is_key(&self) -> bool {
        matches!(self, Segment::Key(_))
    }

    /// Returns the name of a name segment.
    pub fn name(&self) -> Option<&str> {
        match self {
            Segment::Name(n) => Some(&n.name),
            Segment::Key(_) => None,
        }
    }

    /// Returns the parts of a key segment.
    pub fn key_parts(&self) -> Option<&[NameSegment]> {
        match self {
            Segment::Name(_) => None,
            Segment::Key(parts) => Some(parts),
        }
    }

    /// Text used when a single label is needed: the name, or the key parts
    /// joined with `&`.
    pub fn label(&self) -> String {
        match self {
            Segment::Name(n) => n.name.clone(),
            Segment::Key(parts) => parts
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join("&"),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(n) => write!(f, "{}", n),
            Segment::Key(parts) => {
                for part in parts {
                    write!(f, "&{}", part)?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Identifiers and tuples
// =============================================================================

/// A hierarchical member path, e.g. `[Time].[1997].[Q3]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier {
    /// The segments, outermost first.
    pub segments: Vec<Segment>,
}

impl Identifier {
    /// Creates an identifier from segments.
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Creates an identifier whose segments are all bracket-quoted names.
    pub fn of_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: names.into_iter().map(Segment::quoted).collect(),
        }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if there are no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, which names the member itself.
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Canonical form: every name bracket-quoted, keys kept as keys.
    ///
    /// `[Time].1997.[Q3]` becomes `[Time].[1997].[Q3]`.
    pub fn unique_name(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match segment {
                Segment::Name(n) => out.push_str(&quote_name(&n.name)),
                Segment::Key(parts) => {
                    for part in parts {
                        out.push('&');
                        out.push_str(&quote_name(&part.name));
                    }
                }
            }
        }
        out
    }
}

impl fmt::Display for Identifier {
    /// Re-serializes with the original quoting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<Vec<Segment>> for Identifier {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

/// One coordinate on a query axis: one identifier per crossed hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tuple {
    /// Members, one per hierarchy.
    pub members: Vec<Identifier>,
}

impl Tuple {
    /// Creates a tuple.
    pub fn new(members: Vec<Identifier>) -> Self {
        Self { members }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the tuple has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", member)?;
        }
        f.write_str(")")
    }
}

impl From<Identifier> for Tuple {
    fn from(member: Identifier) -> Self {
        Self {
            members: vec![member],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_quoting() {
        let id = Identifier::new(vec![
            Segment::quoted("Time"),
            Segment::unquoted("1997"),
            Segment::quoted("Q3"),
        ]);
        assert_eq!(id.to_string(), "[Time].1997.[Q3]");
        assert_eq!(id.unique_name(), "[Time].[1997].[Q3]");
    }

    #[test]
    fn test_display_escapes_brackets() {
        let id = Identifier::new(vec![Segment::quoted("a]b")]);
        assert_eq!(id.to_string(), "[a]]b]");
    }

    #[test]
    fn test_display_keys() {
        let id = Identifier::new(vec![
            Segment::quoted("Customers"),
            Segment::Key(vec![
                NameSegment::quoted("SF"),
                NameSegment::unquoted("CA"),
            ]),
            Segment::Key(vec![NameSegment::quoted("cust1234")]),
        ]);
        assert_eq!(id.to_string(), "[Customers].&[SF]&CA.&[cust1234]");
        assert_eq!(id.unique_name(), "[Customers].&[SF]&[CA].&[cust1234]");
    }

    #[test]
    fn test_segment_accessors() {
        let name = Segment::unquoted("1997");
        assert_eq!(name.name(), Some("1997"));
        assert!(name.key_parts().is_none());
        assert!(!name.is_key());

        let key = Segment::Key(vec![NameSegment::quoted("SF"), NameSegment::quoted("CA")]);
        assert!(key.is_key());
        assert_eq!(key.key_parts().map(|p| p.len()), Some(2));
        assert_eq!(key.label(), "SF&CA");
    }

    #[test]
    fn test_tuple_display() {
        let tuple = Tuple::new(vec![
            Identifier::of_names(["Time", "1997"]),
            Identifier::of_names(["Measures", "Unit Sales"]),
        ]);
        assert_eq!(tuple.to_string(), "([Time].[1997], [Measures].[Unit Sales])");
    }

    #[test]
    fn test_identifier_last() {
        let id = Identifier::of_names(["Store", "USA", "CA"]);
        assert_eq!(id.last().and_then(|s| s.name()), Some("CA"));
        assert_eq!(id.len(), 3);
        assert!(Identifier::default().is_empty());
    }
}
