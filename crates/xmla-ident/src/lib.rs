//! # xmla-ident
//!
//! Lexer for the identifier syntax used by OLAP servers in MDX text and in
//! XML for Analysis responses: member paths, compound keys, tuples and
//! lists of either.
//!
//! ## Usage
//!
//! ```rust
//! use xmla_ident::{parse_identifier, parse_tuple_list, NameSegment, Segment};
//!
//! // A member path with mixed quoting
//! let id = parse_identifier("[Time].1997.[Q3]").unwrap();
//! assert_eq!(id.len(), 3);
//! assert_eq!(id.to_string(), "[Time].1997.[Q3]");
//!
//! // Compound keys are grouped into one segment
//! let id = parse_identifier("[Customers].[City].&[SF]&CA&USA").unwrap();
//! assert_eq!(
//!     id.segments[2],
//!     Segment::Key(vec![
//!         NameSegment::quoted("SF"),
//!         NameSegment::unquoted("CA"),
//!         NameSegment::unquoted("USA"),
//!     ])
//! );
//!
//! // Tuple lists
//! let tuples = parse_tuple_list("{([Time].[1997], [Store].[USA])}").unwrap();
//! assert_eq!(tuples[0].len(), 2);
//! ```
//!
//! ## Syntax Quick Reference
//!
//! | Form | Meaning | Example |
//! |------|---------|---------|
//! | `[...]` | Quoted name, `]]` escapes `]` | `[Profit ]]%]` |
//! | bare text | Unquoted name, edges trimmed | `1997` |
//! | `.` | Segment separator | `[Time].[1997]` |
//! | `&` | Key part | `&[SF]&CA` |
//! | `( , )` | Tuple | `([Time].[1997], [Store].[USA])` |
//! | `{ , }` | List (braces optional) | `{[a], [b]}` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod builder;
mod error;
mod format;
mod lexer;
mod segment;

pub use builder::{Assembler, IdentifierBuilder};
pub use error::{IdentError, IdentResult};
pub use format::{format_member_list, format_tuple_list, quote_name};
pub use lexer::{
    parse_identifier, parse_member_list, parse_tuple, parse_tuple_list, parse_with, ParseMode,
};
pub use segment::{Identifier, NameSegment, Quoting, Segment, Tuple};
