//! Builds a [`CellSet`] from a multidimensional (`mddataset`) response.

use std::collections::BTreeMap;

use xmla_ident::parse_identifier;

use crate::cellset::{Axis, AxisOrdinal, CellData, CellSet, CellValue, Member, Position};
use crate::error::{XmlaError, XmlaResult};
use crate::xml::Element;

/// Member children with a dedicated field on [`Member`].
const MEMBER_FIELDS: &[&str] = &[
    "UName",
    "Caption",
    "LName",
    "LNum",
    "DisplayInfo",
    "PARENT_UNIQUE_NAME",
];

fn invalid(message: impl Into<String>) -> XmlaError {
    XmlaError::InvalidResponse(message.into())
}

/// `Axis0` -> `Index(0)`, `SlicerAxis` -> `Filter`.
fn axis_ordinal(name: &str) -> XmlaResult<AxisOrdinal> {
    if name == "SlicerAxis" {
        return Ok(AxisOrdinal::Filter);
    }
    name.strip_prefix("Axis")
        .and_then(|n| n.parse::<usize>().ok())
        .map(AxisOrdinal::Index)
        .ok_or_else(|| invalid(format!("unknown axis name '{}'", name)))
}

pub(crate) fn parse_cell_set(root: &Element) -> XmlaResult<CellSet> {
    let olap_info = root.child("OlapInfo");

    let cube_name = olap_info
        .and_then(|info| info.child("CubeInfo"))
        .and_then(|cube_info| cube_info.child("Cube"))
        .and_then(|cube| cube.child_text("CubeName"))
        .map(|name| name.trim().to_string());

    // Hierarchies per axis, from OlapInfo/AxesInfo.
    let mut hierarchies: BTreeMap<AxisOrdinal, Vec<String>> = BTreeMap::new();
    if let Some(axes_info) = olap_info.and_then(|info| info.child("AxesInfo")) {
        for axis_info in axes_info.children_named("AxisInfo") {
            let ordinal = axis_ordinal(axis_info.attr("name").unwrap_or_default())?;
            let names = axis_info
                .children_named("HierarchyInfo")
                .filter_map(|h| h.attr("name").map(str::to_string))
                .collect();
            hierarchies.insert(ordinal, names);
        }
    }

    let mut axes: BTreeMap<AxisOrdinal, Axis> = BTreeMap::new();
    for (&ordinal, names) in &hierarchies {
        let mut axis = Axis::empty(ordinal);
        axis.hierarchies = names.clone();
        axes.insert(ordinal, axis);
    }
    if let Some(axes_element) = root.child("Axes") {
        for axis_element in axes_element.children_named("Axis") {
            let ordinal = axis_ordinal(axis_element.attr("name").unwrap_or_default())?;
            let axis = axes.entry(ordinal).or_insert_with(|| Axis::empty(ordinal));
            axis.positions = parse_positions(axis_element)?;
        }
    }

    let filter_axis = axes
        .remove(&AxisOrdinal::Filter)
        .unwrap_or_else(|| Axis::empty(AxisOrdinal::Filter));
    let axes: Vec<Axis> = axes.into_values().collect();
    for (expected, axis) in axes.iter().enumerate() {
        if axis.ordinal != AxisOrdinal::Index(expected) {
            return Err(invalid(format!(
                "axes are not contiguous: expected Axis{}, found {}",
                expected, axis.ordinal
            )));
        }
    }

    let cells = match root.child("CellData") {
        Some(cell_data) => parse_cells(cell_data)?,
        None => BTreeMap::new(),
    };

    CellSet::new(cube_name, axes, filter_axis, cells)
}

fn parse_positions(axis: &Element) -> XmlaResult<Vec<Position>> {
    if axis.child("CrossProduct").is_some() {
        return Err(XmlaError::UnsupportedOperation(
            "ClusterFormat axes (CrossProduct) are not supported, request TupleFormat".to_string(),
        ));
    }
    let Some(tuples) = axis.child("Tuples") else {
        return Ok(Vec::new());
    };
    tuples
        .children_named("Tuple")
        .enumerate()
        .map(|(ordinal, tuple)| {
            let members = tuple
                .children_named("Member")
                .map(parse_member)
                .collect::<XmlaResult<Vec<_>>>()?;
            Ok(Position { ordinal, members })
        })
        .collect()
}

fn parse_member(element: &Element) -> XmlaResult<Member> {
    let unique_name = element
        .child_text("UName")
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| invalid("member without UName"))?
        .to_string();
    let identifier = parse_identifier(&unique_name)?;
    let caption = element
        .child_text("Caption")
        .map(str::to_string)
        .unwrap_or_else(|| identifier.last().map(|s| s.label()).unwrap_or_default());

    let level_depth = element
        .child_text("LNum")
        .map(|n| {
            n.trim()
                .parse::<u32>()
                .map_err(|_| invalid(format!("bad LNum '{}' on {}", n, unique_name)))
        })
        .transpose()?;
    let display_info = element
        .child_text("DisplayInfo")
        .map(|n| {
            n.trim()
                .parse::<i64>()
                .map_err(|_| invalid(format!("bad DisplayInfo '{}' on {}", n, unique_name)))
        })
        .transpose()?;

    let properties = element
        .children
        .iter()
        .filter(|c| !MEMBER_FIELDS.contains(&c.name.as_str()))
        .map(|c| (c.name.clone(), c.text.clone()))
        .collect();

    Ok(Member {
        unique_name,
        identifier,
        caption,
        hierarchy: element.attr("Hierarchy").unwrap_or_default().to_string(),
        level_unique_name: element.child_text("LName").map(str::to_string),
        level_depth,
        parent_unique_name: element.child_text("PARENT_UNIQUE_NAME").map(str::to_string),
        display_info,
        properties,
    })
}

fn parse_cells(cell_data: &Element) -> XmlaResult<BTreeMap<usize, CellData>> {
    let mut cells = BTreeMap::new();
    for cell in cell_data.children_named("Cell") {
        let ordinal = cell
            .attr("CellOrdinal")
            .and_then(|o| o.trim().parse::<usize>().ok())
            .ok_or_else(|| invalid("cell without a valid CellOrdinal"))?;
        let value = match cell.child("Value") {
            Some(value) => typed_value(value)?,
            None => CellValue::Null,
        };
        let properties = cell
            .children
            .iter()
            .filter(|c| c.name != "Value" && c.name != "FmtValue")
            .map(|c| (c.name.clone(), c.text.clone()))
            .collect();
        cells.insert(
            ordinal,
            CellData {
                value,
                formatted_value: cell.child_text("FmtValue").map(str::to_string),
                properties,
            },
        );
    }
    Ok(cells)
}

/// Converts a `Value` element according to its `xsi:type`.
fn typed_value(value: &Element) -> XmlaResult<CellValue> {
    if value.attr("nil") == Some("true") {
        return Ok(CellValue::Null);
    }
    let text = value.text.trim();
    let bad = |kind: &str| invalid(format!("'{}' is not a valid {}", text, kind));
    let xsd_type = value
        .attr("type")
        .map(|t| t.rsplit_once(':').map_or(t, |(_, local)| local));
    match xsd_type {
        Some("int" | "integer" | "long" | "short" | "byte" | "unsignedInt" | "unsignedShort"
        | "unsignedByte") => text.parse().map(CellValue::Integer).map_err(|_| bad("integer")),
        Some("double" | "float" | "decimal") => parse_double(text)
            .map(CellValue::Double)
            .ok_or_else(|| bad("double")),
        Some("boolean") => match text {
            "true" | "1" => Ok(CellValue::Boolean(true)),
            "false" | "0" => Ok(CellValue::Boolean(false)),
            _ => Err(bad("boolean")),
        },
        _ => Ok(CellValue::String(value.text.clone())),
    }
}

/// XSD spells infinities `INF` / `-INF`.
fn parse_double(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        _ => text.parse().ok(),
    }
}
