//! Multidimensional results.
//!
//! A [`CellSet`] owns its axes, the filter (slicer) axis and a sparse map of
//! cells. Cells are addressed by ordinal or by one coordinate per axis, with
//! axis 0 varying fastest (see [`ordinal_to_coordinates`]).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use xmla_ident::Identifier;

use crate::coordinates::{cell_count, coordinates_to_ordinal, ordinal_to_coordinates};
use crate::error::{XmlaError, XmlaResult};
use crate::result::ExecutionStats;

// =============================================================================
// Axes
// =============================================================================

/// Identifies an axis of a cell set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisOrdinal {
    /// The slicer axis.
    Filter,
    /// A result axis, 0 = COLUMNS.
    Index(usize),
}

impl AxisOrdinal {
    /// MDX name of the axis: `COLUMNS`, `ROWS`, ... then `AXIS(n)`.
    pub fn name(&self) -> String {
        match self {
            AxisOrdinal::Filter => "FILTER".to_string(),
            AxisOrdinal::Index(0) => "COLUMNS".to_string(),
            AxisOrdinal::Index(1) => "ROWS".to_string(),
            AxisOrdinal::Index(2) => "PAGES".to_string(),
            AxisOrdinal::Index(3) => "CHAPTERS".to_string(),
            AxisOrdinal::Index(4) => "SECTIONS".to_string(),
            AxisOrdinal::Index(n) => format!("AXIS({})", n),
        }
    }
}

impl fmt::Display for AxisOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A resolved hierarchy member.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Member {
    /// Unique name as sent by the server.
    pub unique_name: String,
    /// The unique name parsed into segments.
    pub identifier: Identifier,
    /// Display caption.
    pub caption: String,
    /// Hierarchy this member belongs to.
    pub hierarchy: String,
    /// Unique name of the member's level.
    pub level_unique_name: Option<String>,
    /// Depth of the level, 0 = root.
    pub level_depth: Option<u32>,
    /// Unique name of the parent member.
    pub parent_unique_name: Option<String>,
    /// Server display flags (child count, drilled-down bits).
    pub display_info: Option<i64>,
    /// Any other member properties returned, by element name.
    pub properties: BTreeMap<String, String>,
}

/// One coordinate along an axis: one member per hierarchy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Index of this position on its axis.
    pub ordinal: usize,
    /// Members, in axis hierarchy order.
    pub members: Vec<Member>,
}

/// An axis of a cell set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Axis {
    /// Which axis this is.
    pub ordinal: AxisOrdinal,
    /// Hierarchies crossed on this axis.
    pub hierarchies: Vec<String>,
    /// Positions in axis order.
    pub positions: Vec<Position>,
}

impl Axis {
    /// Creates an axis without positions.
    pub fn empty(ordinal: AxisOrdinal) -> Self {
        Self {
            ordinal,
            hierarchies: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the axis has no positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// =============================================================================
// Cells
// =============================================================================

/// Typed cell value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Empty cell.
    #[default]
    Null,
    /// Integral value.
    Integer(i64),
    /// Floating point value.
    Double(f64),
    /// Boolean value.
    Boolean(bool),
    /// Anything else, as text.
    String(String),
}

impl CellValue {
    /// Returns true for [`CellValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Double(d) => Some(*d),
            _ => None,
        }
    }
}

/// Cell payload as received; coordinates are derived on access.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct CellData {
    pub value: CellValue,
    pub formatted_value: Option<String>,
    pub properties: BTreeMap<String, String>,
}

/// A cell at the intersection of one position per axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    /// Absolute ordinal.
    pub ordinal: usize,
    /// One position index per axis.
    pub coordinates: Vec<usize>,
    /// Typed value.
    pub value: CellValue,
    /// Server-formatted value.
    pub formatted_value: Option<String>,
    /// Other cell properties (`FormatString`, colors, ...).
    pub properties: BTreeMap<String, String>,
}

impl Cell {
    /// Returns true if the server sent no value for this cell.
    pub fn is_empty(&self) -> bool {
        self.value.is_null() && self.formatted_value.is_none()
    }
}

// =============================================================================
// CellSet
// =============================================================================

/// Navigable multidimensional result.
///
/// Closing a cell set (directly, or by executing another query on the same
/// statement) makes every accessor fail with [`XmlaError::Closed`].
///
/// # Example
///
/// ```ignore
/// let cell_set = statement.execute_olap_query("SELECT ... FROM [Sales]")?;
///
/// for position in &cell_set.axis(0)?.positions {
///     println!("{}", position.members[0].caption);
/// }
///
/// let cell = cell_set.cell_at(&[1, 0])?;
/// println!("{:?}", cell.value);
/// ```
#[derive(Debug)]
pub struct CellSet {
    cube_name: Option<String>,
    axes: Vec<Axis>,
    filter_axis: Axis,
    axis_lengths: Vec<usize>,
    cells: BTreeMap<usize, CellData>,
    stats: ExecutionStats,
    closed: Arc<AtomicBool>,
}

impl CellSet {
    pub(crate) fn new(
        cube_name: Option<String>,
        axes: Vec<Axis>,
        filter_axis: Axis,
        cells: BTreeMap<usize, CellData>,
    ) -> XmlaResult<Self> {
        let axis_lengths: Vec<usize> = axes.iter().map(Axis::len).collect();
        let total = cell_count(&axis_lengths)?;
        if let Some((&ordinal, _)) = cells.range(total..).next() {
            return Err(XmlaError::InvalidResponse(format!(
                "cell ordinal {} outside {} cells",
                ordinal, total
            )));
        }
        Ok(Self {
            cube_name,
            axes,
            filter_axis,
            axis_lengths,
            cells,
            stats: ExecutionStats::default(),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub(crate) fn with_stats(mut self, stats: ExecutionStats) -> Self {
        self.stats = stats;
        self
    }

    /// Shared flag the owning statement uses to close this cell set.
    pub(crate) fn close_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    fn check_open(&self) -> XmlaResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(XmlaError::Closed("cell set"))
        } else {
            Ok(())
        }
    }

    /// Name of the queried cube, if the server reported it.
    pub fn cube_name(&self) -> Option<&str> {
        self.cube_name.as_deref()
    }

    /// Result axes, COLUMNS first.
    pub fn axes(&self) -> XmlaResult<&[Axis]> {
        self.check_open()?;
        Ok(&self.axes)
    }

    /// A single result axis.
    pub fn axis(&self, index: usize) -> XmlaResult<&Axis> {
        self.check_open()?;
        self.axes.get(index).ok_or_else(|| {
            XmlaError::InvalidCoordinate(format!(
                "axis {} out of range, cell set has {} axes",
                index,
                self.axes.len()
            ))
        })
    }

    /// The slicer axis.
    pub fn filter_axis(&self) -> XmlaResult<&Axis> {
        self.check_open()?;
        Ok(&self.filter_axis)
    }

    /// Number of positions on each axis.
    pub fn axis_lengths(&self) -> &[usize] {
        &self.axis_lengths
    }

    /// Number of addressable cells.
    pub fn cell_count(&self) -> usize {
        self.axis_lengths.iter().product()
    }

    /// The cell at `ordinal`; absent cells come back empty.
    pub fn cell(&self, ordinal: usize) -> XmlaResult<Cell> {
        self.check_open()?;
        let coordinates = ordinal_to_coordinates(ordinal, &self.axis_lengths)?;
        Ok(self.build_cell(ordinal, coordinates))
    }

    /// The cell at one position index per axis.
    pub fn cell_at(&self, coordinates: &[usize]) -> XmlaResult<Cell> {
        self.check_open()?;
        let ordinal = coordinates_to_ordinal(coordinates, &self.axis_lengths)?;
        Ok(self.build_cell(ordinal, coordinates.to_vec()))
    }

    /// Every cell in ordinal order, empty ones included.
    pub fn cells(&self) -> XmlaResult<impl Iterator<Item = Cell> + '_> {
        self.check_open()?;
        Ok((0..self.cell_count()).filter_map(move |ordinal| {
            ordinal_to_coordinates(ordinal, &self.axis_lengths)
                .ok()
                .map(|coordinates| self.build_cell(ordinal, coordinates))
        }))
    }

    fn build_cell(&self, ordinal: usize, coordinates: Vec<usize>) -> Cell {
        let data = self.cells.get(&ordinal).cloned().unwrap_or_default();
        Cell {
            ordinal,
            coordinates,
            value: data.value,
            formatted_value: data.formatted_value,
            properties: data.properties,
        }
    }

    /// Execution statistics.
    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// Closes the cell set. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Returns true once closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
