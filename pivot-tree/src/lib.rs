//! FILENAME: pivot-tree/src/lib.rs
//! Pivot result tree engine.
//!
//! The row and column hierarchies of a pivot table arrive from the query layer
//! as paginated per-axis trees. This crate keeps them in an index-addressed
//! arena and provides the operations the renderer needs on top of it.
//!
//! Layers:
//! - `node` / `tree`: Node shape and arena primitives (lengths, caching, traversal)
//! - `window`: Leaf-count windowing for virtualized rendering
//! - `merge`: Stitching consecutive pages together along their cut paths
//! - `query` / `raw`: What arrives from the query layer
//! - `transform`: Subtotal, grand total and measure node synthesis
//! - `accumulator`: Per-axis page accumulation feeding the transform pipeline

#[macro_use]
mod logging;

pub mod accumulator;
pub mod error;
pub mod merge;
pub mod node;
pub mod options;
pub mod query;
pub mod raw;
pub mod transform;
pub mod tree;
pub mod window;

pub use accumulator::{AxisAccumulator, FinalizedAxis};
pub use error::{Result, TreeError};
pub use merge::{deep_merge, find_first_cut, find_last_cut, MergeOutcome};
pub use node::{MeasurePath, NodeId, PivotAttrs, TreeNode, UserType, ROOT_VALUE};
pub use options::{
    LastLevelOptions, LengthOptions, ModifyOptions, PostProcessOptions, PreProcessOptions,
};
pub use query::{AxisType, Panel, PanelAxis, PivotQuery, SortDetails, SortDirection};
pub use raw::RawNode;
pub use transform::{
    insert_grand_totals, insert_measure_nodes, insert_sub_totals, modify_tree,
    post_process_tree, pre_process_root, pre_process_tree, FormatEvent, PostProcessHooks,
};
pub use tree::Tree;
pub use window::{
    get_cut_nodes_by_child_count, get_cut_nodes_by_child_count_with, get_last_level_nodes,
    get_nodes_by_child_count, NodeWindow,
};
