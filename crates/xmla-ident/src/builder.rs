//! Builder callbacks driven by the lexer, and the stock assembler.

use crate::segment::{Identifier, Segment, Tuple};

/// Receives parse events from the lexer, in input order.
///
/// The lexer reports each finished segment, then `member_complete` at the
/// end of every identifier, then `tuple_complete` at the closing `)` of a
/// tuple. Key parts are already grouped into a single [`Segment::Key`].
///
/// # Example
///
/// ```rust
/// use xmla_ident::{parse_with, IdentifierBuilder, ParseMode, Segment};
///
/// #[derive(Default)]
/// struct SegmentCounter {
///     segments: usize,
///     members: usize,
/// }
///
/// impl IdentifierBuilder for SegmentCounter {
///     fn segment_complete(&mut self, _segment: Segment) {
///         self.segments += 1;
///     }
///     fn member_complete(&mut self) {
///         self.members += 1;
///     }
///     fn tuple_complete(&mut self) {}
/// }
///
/// let mut counter = SegmentCounter::default();
/// parse_with("{[a].[b], c}", ParseMode::MemberList, &mut counter).unwrap();
/// assert_eq!(counter.segments, 3);
/// assert_eq!(counter.members, 2);
/// ```
pub trait IdentifierBuilder {
    /// A segment of the current identifier is finished.
    fn segment_complete(&mut self, segment: Segment);

    /// The current identifier is finished.
    fn member_complete(&mut self);

    /// The current tuple is finished.
    fn tuple_complete(&mut self);
}

/// Assembles parse events into identifiers and tuples.
#[derive(Debug, Default)]
pub struct Assembler {
    segments: Vec<Segment>,
    members: Vec<Identifier>,
    tuples: Vec<Tuple>,
}

impl Assembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers completed outside any tuple.
    pub fn into_identifiers(self) -> Vec<Identifier> {
        self.members
    }

    /// Tuples completed so far.
    pub fn into_tuples(self) -> Vec<Tuple> {
        self.tuples
    }
}

impl IdentifierBuilder for Assembler {
    fn segment_complete(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    fn member_complete(&mut self) {
        let segments = std::mem::take(&mut self.segments);
        self.members.push(Identifier::new(segments));
    }

    fn tuple_complete(&mut self) {
        let members = std::mem::take(&mut self.members);
        self.tuples.push(Tuple::new(members));
    }
}
