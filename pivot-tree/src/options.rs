//! FILENAME: pivot-tree/src/options.rs
//! Behavior switches for the tree operations.
//!
//! All option structs deserialize from the camelCase JSON the host passes
//! through, and every field defaults so callers only name what they change.

use serde::{Deserialize, Serialize};
use crate::node::MeasurePath;

/// Options for `Tree::child_length` / `Tree::deep_length`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LengthOptions {
    /// Ignore cached lengths and recompute the whole subtree, refreshing the cache.
    pub clear_cache: bool,
}

impl LengthOptions {
    pub fn fresh() -> Self {
        LengthOptions { clear_cache: true }
    }
}

/// Options for `get_last_level_nodes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LastLevelOptions {
    /// Leave grand total leaves out of the collected set.
    pub skip_grand_totals: bool,
}

/// Options for `pre_process_tree`.
///
/// A page that starts below the axis root (a continuation branch) can be
/// pre-processed with the depth and measure path of its attachment point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreProcessOptions {
    /// Depth of the first level of `items` below the axis root.
    pub depth: usize,
    /// Measure path inherited from the ancestors of `items`.
    pub measure_path: MeasurePath,
}

/// Options for `modify_tree`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModifyOptions {
    /// Run the odd/even pass marking every second leaf as `alternate`.
    pub mark_alternation: bool,
    /// Insert subtotals even under nodes that have a single child.
    pub subtotals_for_single_row: bool,
}

/// Options for `post_process_tree`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostProcessOptions {
    /// Do not call `PostProcessHooks::emit`.
    pub skip_format_event: bool,
    /// Only call `PostProcessHooks::emit`; skip structural post-processing.
    pub only_format_events: bool,
}
