//! FILENAME: pivot-tree/src/node.rs
//! Tree Node - The unit stored in a `Tree` arena.
//!
//! A node carries the member label, its ordered children (as arena ids),
//! the paging markers used by the merge engine, and the pivot attributes
//! filled in by the transform pipeline.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label of the synthetic root that wraps a forest into a single tree.
pub const ROOT_VALUE: &str = "__pivot_root__";

/// Ancestor jaql index -> ancestor member value, accumulated root to node.
pub type MeasurePath = BTreeMap<usize, String>;

/// Index of a node inside its `Tree` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// PIVOT ATTRIBUTES
// ============================================================================

/// Role of a node in the decorated pivot tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    /// A member returned by the query.
    #[default]
    Ordinary,
    /// Summarizes the sibling group of its `master`.
    SubTotal,
    /// One per measure, summarizing the whole axis.
    GrandTotal,
    /// Single-measure wrapper placed above the whole column tree.
    MeasureTop,
    /// One per measure, grafted under each column leaf.
    MeasureBottom,
}

/// Attributes added by the pivot transform pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotAttrs {
    /// Value-axis index of the panel active at this node's depth.
    /// `None` means the node is not addressable as a dimension or measure.
    pub jaql_index: Option<usize>,

    pub measure_path: MeasurePath,

    pub user_type: UserType,

    /// For SUB_TOTAL nodes: the node whose children it summarizes.
    /// Not an ownership edge; traversal and lengths never follow it.
    #[serde(skip)]
    pub master: Option<NodeId>,

    /// Value-axis index of the measure this node's column shows.
    pub measure_jaql_index: Option<usize>,

    /// Set by the finalize pass, used only for lookups.
    #[serde(skip)]
    pub parent: Option<NodeId>,

    /// Sort marker for leaf measure nodes.
    pub sort: Option<crate::query::SortDirection>,

    /// Odd/even banding marker.
    pub alternate: bool,
}

// ============================================================================
// TREE NODE
// ============================================================================

/// A node of a row or column hierarchy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeNode {
    /// Display label / member key. Absent for synthetic roots of raw pages.
    pub value: Option<String>,

    /// Ordered children. Never `Some(empty)`: no children means `None`.
    pub(crate) children: Option<Vec<NodeId>>,

    /// Opaque payload, e.g. a reference into the row's value cells.
    pub data: Option<Value>,

    /// Offset into the flat column/value axis.
    pub index: Option<usize>,

    /// Depth from the axis root, rewritten during merge.
    pub level: Option<usize>,

    /// Page boundary marker set by the query layer.
    pub is_part: bool,

    /// Merge bookkeeping: the node's children were already spliced.
    pub is_handled: bool,

    /// Most measure nodes this column leaf may receive on the current page.
    pub max_childs: Option<usize>,

    pub pivot: PivotAttrs,
}

impl TreeNode {
    pub fn new(value: impl Into<String>) -> Self {
        TreeNode {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Creates the synthetic root sentinel.
    pub fn root() -> Self {
        TreeNode::new(ROOT_VALUE)
    }

    pub fn is_root(&self) -> bool {
        self.value.as_deref() == Some(ROOT_VALUE)
    }

    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn has_children(&self) -> bool {
        self.children.as_ref().map_or(false, |c| !c.is_empty())
    }

    pub fn user_type(&self) -> UserType {
        self.pivot.user_type
    }

    pub fn is_grand_total(&self) -> bool {
        self.pivot.user_type == UserType::GrandTotal
    }
}
