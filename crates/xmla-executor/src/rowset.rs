//! Tabular results: a column list and rows of optional values.

use crate::error::{XmlaError, XmlaResult};
use crate::response::decode_xml_name;
use crate::result::ExecutionStats;
use crate::xml::Element;

/// One column of a rowset, taken from the inline schema.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    /// Element name used inside `row`.
    pub name: String,
    /// Display label: `sql:field` when present, else the decoded name.
    pub label: String,
    /// Declared XSD type, e.g. `xsd:string`.
    pub data_type: Option<String>,
}

/// Flat result of a tabular execution or a discover request.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowSet {
    columns: Vec<Column>,
    rows: Vec<Vec<Option<String>>>,
    stats: ExecutionStats,
}

impl RowSet {
    /// Columns in schema order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows; each has one entry per column, `None` where the field was absent.
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column with the given label or element name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.label == name || c.name == name)
    }

    /// Value of `column` in row `row`.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// Execution statistics.
    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    pub(crate) fn with_stats(mut self, stats: ExecutionStats) -> Self {
        self.stats = stats;
        self
    }
}

/// Builds a rowset from a response `root`.
pub(crate) fn parse_rowset(root: &Element) -> XmlaResult<RowSet> {
    let columns = match schema_row_type(root) {
        Some(row_type) => row_type
            .descendant("sequence")
            .map(|seq| seq.children_named("element").filter_map(column).collect())
            .unwrap_or_default(),
        None => infer_columns(root),
    };

    let mut rows = Vec::new();
    for row in root.children_named("row") {
        let mut values = vec![None; columns.len()];
        for field in &row.children {
            match columns.iter().position(|c: &Column| c.name == field.name) {
                Some(index) => values[index] = Some(field.text.clone()),
                None => {
                    return Err(XmlaError::InvalidResponse(format!(
                        "row field '{}' is not declared in the schema",
                        field.name
                    )))
                }
            }
        }
        rows.push(values);
    }

    Ok(RowSet {
        columns,
        rows,
        stats: ExecutionStats::default(),
    })
}

fn schema_row_type(root: &Element) -> Option<&Element> {
    let schema = root.child("schema")?;
    schema
        .children_named("complexType")
        .find(|t| t.attr("name") == Some("row"))
}

fn column(element: &Element) -> Option<Column> {
    let name = element.attr("name")?.to_string();
    let label = element
        .attr("field")
        .map(str::to_string)
        .unwrap_or_else(|| decode_xml_name(&name));
    Some(Column {
        name,
        label,
        data_type: element.attr("type").map(str::to_string),
    })
}

/// Without a schema, columns are the distinct field names in row order.
fn infer_columns(root: &Element) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    for row in root.children_named("row") {
        for field in &row.children {
            if !columns.iter().any(|c| c.name == field.name) {
                columns.push(Column {
                    name: field.name.clone(),
                    label: decode_xml_name(&field.name),
                    data_type: None,
                });
            }
        }
    }
    columns
}
