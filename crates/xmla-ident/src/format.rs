//! Serialization of identifiers back to MDX text.

use std::fmt;

use crate::segment::{Identifier, Quoting, Tuple};

/// Bracket-quotes a name, doubling any `]`.
///
/// ```rust
/// use xmla_ident::quote_name;
///
/// assert_eq!(quote_name("Unit Sales"), "[Unit Sales]");
/// assert_eq!(quote_name("a]b"), "[a]]b]");
/// ```
pub fn quote_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('[');
    for ch in name.chars() {
        if ch == ']' {
            out.push(']');
        }
        out.push(ch);
    }
    out.push(']');
    out
}

pub(crate) fn write_name(f: &mut fmt::Formatter<'_>, name: &str, quoting: Quoting) -> fmt::Result {
    match quoting {
        Quoting::Quoted => f.write_str(&quote_name(name)),
        Quoting::Unquoted => f.write_str(name),
    }
}

/// Formats a member list as `{a, b, c}`.
pub fn format_member_list(members: &[Identifier]) -> String {
    let inner = members
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", inner)
}

/// Formats a tuple list as `{(a, b), (c, d)}`.
///
/// Single-member tuples are written as the bare member.
pub fn format_tuple_list(tuples: &[Tuple]) -> String {
    let inner = tuples
        .iter()
        .map(|t| match t.members.as_slice() {
            [single] => single.to_string(),
            _ => t.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;

    #[test]
    fn test_quote_name_plain() {
        assert_eq!(quote_name("Time"), "[Time]");
        assert_eq!(quote_name(""), "[]");
    }

    #[test]
    fn test_quote_name_escapes() {
        assert_eq!(quote_name("]"), "[]]]");
        assert_eq!(quote_name("x]]y"), "[x]]]]y]");
    }

    #[test]
    fn test_format_member_list() {
        let members = vec![
            Identifier::of_names(["Time", "1997"]),
            Identifier::new(vec![Segment::unquoted("foo")]),
        ];
        assert_eq!(format_member_list(&members), "{[Time].[1997], foo}");
        assert_eq!(format_member_list(&[]), "{}");
    }

    #[test]
    fn test_format_tuple_list() {
        let tuples = vec![
            Tuple::new(vec![
                Identifier::of_names(["Time", "1997"]),
                Identifier::of_names(["Store", "USA"]),
            ]),
            Tuple::from(Identifier::of_names(["Time", "1998"])),
        ];
        assert_eq!(
            format_tuple_list(&tuples),
            "{([Time].[1997], [Store].[USA]), [Time].[1998]}"
        );
    }
}
