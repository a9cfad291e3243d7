//! Query input: raw MDX text or a structured `SELECT`.

use std::fmt;

use xmla_ident::{format_member_list, format_tuple_list, Identifier, Tuple};

use crate::cellset::AxisOrdinal;

/// Anything that can be rendered to MDX statement text.
pub trait MdxQuery {
    /// The statement text sent to the server.
    fn to_mdx(&self) -> String;
}

impl MdxQuery for str {
    fn to_mdx(&self) -> String {
        self.to_string()
    }
}

impl MdxQuery for &str {
    fn to_mdx(&self) -> String {
        (*self).to_string()
    }
}

impl MdxQuery for String {
    fn to_mdx(&self) -> String {
        self.clone()
    }
}

/// The set placed on one query axis.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisSet {
    /// An explicit member list: `{[a], [b]}`.
    Members(Vec<Identifier>),
    /// An explicit tuple list: `{([a], [x]), ([b], [y])}`.
    Tuples(Vec<Tuple>),
    /// Any set expression, written verbatim: `[Store].Children`.
    Expression(String),
}

impl fmt::Display for AxisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisSet::Members(members) => f.write_str(&format_member_list(members)),
            AxisSet::Tuples(tuples) => f.write_str(&format_tuple_list(tuples)),
            AxisSet::Expression(expression) => f.write_str(expression),
        }
    }
}

/// One axis specification of a [`SelectQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryAxis {
    /// Set placed on the axis.
    pub set: AxisSet,
    /// Whether empty positions are removed (`NON EMPTY`).
    pub non_empty: bool,
}

/// A structured `SELECT ... FROM ... WHERE ...` statement.
///
/// # Example
///
/// ```rust
/// use xmla_executor::{AxisSet, MdxQuery, SelectQuery};
/// use xmla_ident::{Identifier, Tuple};
///
/// let query = SelectQuery::new("Sales")
///     .on_axis(AxisSet::Members(vec![Identifier::of_names(["Measures", "Unit Sales"])]))
///     .on_axis_non_empty(AxisSet::Expression("[Store].Children".to_string()))
///     .with_slicer(Tuple::from(Identifier::of_names(["Time", "1997"])));
///
/// assert_eq!(
///     query.to_mdx(),
///     "SELECT {[Measures].[Unit Sales]} ON COLUMNS, NON EMPTY [Store].Children ON ROWS \
///      FROM [Sales] WHERE ([Time].[1997])"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectQuery {
    /// Cube to query.
    pub cube: Identifier,
    /// Axes, COLUMNS first.
    pub axes: Vec<QueryAxis>,
    /// Slicer tuple for the `WHERE` clause.
    pub slicer: Option<Tuple>,
}

impl SelectQuery {
    /// Starts a query against the named cube.
    pub fn new(cube: impl Into<String>) -> Self {
        Self {
            cube: Identifier::of_names([cube.into()]),
            axes: Vec::new(),
            slicer: None,
        }
    }

    /// Appends an axis.
    pub fn on_axis(mut self, set: AxisSet) -> Self {
        self.axes.push(QueryAxis {
            set,
            non_empty: false,
        });
        self
    }

    /// Appends a `NON EMPTY` axis.
    pub fn on_axis_non_empty(mut self, set: AxisSet) -> Self {
        self.axes.push(QueryAxis {
            set,
            non_empty: true,
        });
        self
    }

    /// Sets the slicer.
    pub fn with_slicer(mut self, slicer: Tuple) -> Self {
        self.slicer = Some(slicer);
        self
    }
}

impl MdxQuery for SelectQuery {
    fn to_mdx(&self) -> String {
        let axes = self
            .axes
            .iter()
            .enumerate()
            .map(|(i, axis)| {
                format!(
                    "{}{} ON {}",
                    if axis.non_empty { "NON EMPTY " } else { "" },
                    axis.set,
                    AxisOrdinal::Index(i)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut mdx = String::from("SELECT");
        if !axes.is_empty() {
            mdx.push(' ');
            mdx.push_str(&axes);
        }
        mdx.push_str(" FROM ");
        mdx.push_str(&self.cube.unique_name());
        if let Some(slicer) = &self.slicer {
            mdx.push_str(" WHERE ");
            mdx.push_str(&slicer.to_string());
        }
        mdx
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_mdx())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmla_ident::parse_identifier;

    #[test]
    fn test_str_is_passed_through() {
        assert_eq!("SELECT FROM [Sales]".to_mdx(), "SELECT FROM [Sales]");
        assert_eq!(String::from("x").to_mdx(), "x");
    }

    #[test]
    fn test_select_without_axes() {
        assert_eq!(SelectQuery::new("Sales").to_mdx(), "SELECT FROM [Sales]");
    }

    #[test]
    fn test_tuple_axis_and_keys() {
        let store = parse_identifier("[Store].[Store State].&[CA]").unwrap();
        let query = SelectQuery::new("Sales").on_axis(AxisSet::Tuples(vec![Tuple::new(vec![
            store,
            Identifier::of_names(["Time", "1997"]),
        ])]));
        assert_eq!(
            query.to_string(),
            "SELECT {([Store].[Store State].&[CA], [Time].[1997])} ON COLUMNS FROM [Sales]"
        );
    }

    #[test]
    fn test_axis_names_follow_position() {
        let set = || AxisSet::Expression("{}".to_string());
        let query = SelectQuery::new("C")
            .on_axis(set())
            .on_axis(set())
            .on_axis(set());
        assert_eq!(
            query.to_mdx(),
            "SELECT {} ON COLUMNS, {} ON ROWS, {} ON PAGES FROM [C]"
        );
    }

    #[test]
    fn test_cube_name_is_quoted() {
        assert_eq!(SelectQuery::new("Sales ]Q[").to_mdx(), "SELECT FROM [Sales ]]Q[]");
    }
}
