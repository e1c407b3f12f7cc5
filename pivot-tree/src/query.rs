//! FILENAME: pivot-tree/src/query.rs
//! Query Descriptor - What the query layer tells the tree engine about a pivot.
//!
//! Only the parts the engine needs are modeled: which panel (jaql index) is
//! active at each depth of each axis, and the ordered list of measures.
//! The JAQL expressions themselves stay opaque.

use serde::{Deserialize, Serialize};
use crate::node::MeasurePath;

// ============================================================================
// AXES AND PANELS
// ============================================================================

/// One of the two pivot hierarchies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Rows,
    Columns,
}

/// Area a panel is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelAxis {
    Rows,
    Columns,
    Measures,
}

impl From<AxisType> for PanelAxis {
    fn from(axis: AxisType) -> Self {
        match axis {
            AxisType::Rows => PanelAxis::Rows,
            AxisType::Columns => PanelAxis::Columns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sorting applied to a measure, optionally restricted to one column path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortDetails {
    pub direction: SortDirection,

    /// Column member path the sort is anchored on. `None` sorts by the
    /// measure across all columns.
    #[serde(default)]
    pub measure_path: Option<MeasurePath>,
}

fn default_true() -> bool {
    true
}

/// A query element: a dimension on an axis or a measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub axis: PanelAxis,

    /// Position of this element in the flat value axis of the result.
    pub jaql_index: usize,

    /// Display title (used as the label of measure nodes).
    #[serde(default)]
    pub title: String,

    /// Whether nodes of this dimension get subtotals.
    #[serde(default = "default_true")]
    pub subtotals: bool,

    #[serde(default)]
    pub sort: Option<SortDetails>,
}

impl Panel {
    pub fn new(axis: PanelAxis, jaql_index: usize, title: impl Into<String>) -> Self {
        Panel {
            axis,
            jaql_index,
            title: title.into(),
            subtotals: true,
            sort: None,
        }
    }
}

// ============================================================================
// QUERY
// ============================================================================

/// The originating query of a pivot result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotQuery {
    /// Panels in query order. Per axis, the n-th panel applies at depth n.
    pub panels: Vec<Panel>,
}

impl PivotQuery {
    pub fn new(panels: Vec<Panel>) -> Self {
        PivotQuery { panels }
    }

    /// Panels of `axis`, one per tree depth.
    pub fn metadata_panels(&self, axis: AxisType) -> Vec<&Panel> {
        let axis = PanelAxis::from(axis);
        self.panels.iter().filter(|p| p.axis == axis).collect()
    }

    /// Panel active at `depth` of `axis`.
    pub fn panel_at(&self, axis: AxisType, depth: usize) -> Option<&Panel> {
        let axis = PanelAxis::from(axis);
        self.panels.iter().filter(|p| p.axis == axis).nth(depth)
    }

    pub fn measures(&self) -> Vec<&Panel> {
        self.panels
            .iter()
            .filter(|p| p.axis == PanelAxis::Measures)
            .collect()
    }

    pub fn measure_count(&self) -> usize {
        self.panels
            .iter()
            .filter(|p| p.axis == PanelAxis::Measures)
            .count()
    }

    pub fn panel_by_jaql_index(&self, jaql_index: usize) -> Option<&Panel> {
        self.panels.iter().find(|p| p.jaql_index == jaql_index)
    }
}
