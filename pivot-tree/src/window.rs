//! FILENAME: pivot-tree/src/window.rs
//! Tree Windowing - Leaf-count addressed slices of a forest.
//!
//! The renderer addresses rows and columns by their position in the flattened
//! leaf sequence. A window `[from, to)` over that sequence selects the
//! top-level nodes overlapping it (`get_nodes_by_child_count`) or produces
//! trimmed copies whose leaves are exactly the window
//! (`get_cut_nodes_by_child_count`).

use serde::{Deserialize, Serialize};
use crate::error::{Result, TreeError};
use crate::node::NodeId;
use crate::options::{LastLevelOptions, LengthOptions};
use crate::tree::Tree;

/// Top-level nodes overlapping a requested window, and the leaf range they
/// actually span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeWindow {
    pub nodes: Vec<NodeId>,
    /// First leaf position covered by `nodes`.
    pub start: usize,
    /// One past the last leaf position covered by `nodes`.
    pub stop: usize,
}

impl NodeWindow {
    /// Whether the selected nodes cover all of `[from, to)`.
    /// An open-ended request is satisfied by any window reaching `from`,
    /// including the empty window at the very end of the leaves.
    pub fn is_satisfied(&self, from: usize, to: Option<usize>) -> bool {
        let end = to.unwrap_or(from);
        self.start <= from && end <= self.stop
    }
}

fn check_range(from: usize, to: Option<usize>) -> Result<()> {
    match to {
        Some(to) if from > to => Err(TreeError::InvalidRange { from, to }),
        _ => Ok(()),
    }
}

/// Selects the top-level nodes whose leaf ranges overlap `[from, to)`.
///
/// Only whole nodes are selected, so `[start, stop)` can be wider than the
/// request. When nothing overlaps, `start == stop` and both equal `from`
/// clamped to the total leaf count.
pub fn get_nodes_by_child_count(
    tree: &mut Tree,
    nodes: &[NodeId],
    from: usize,
    to: Option<usize>,
) -> Result<NodeWindow> {
    check_range(from, to)?;

    let opts = LengthOptions::default();
    let mut window = NodeWindow::default();
    let mut offset = 0;
    let mut first_start = None;

    for &id in nodes {
        let length = tree.child_length(&[id], &opts);
        let node_start = offset;
        let node_stop = offset + length;
        offset = node_stop;

        if let Some(to) = to {
            if node_start >= to {
                break;
            }
        }
        if node_stop <= from || length == 0 {
            continue;
        }
        first_start.get_or_insert(node_start);
        window.nodes.push(id);
        window.stop = node_stop;
    }

    match first_start {
        Some(start) => window.start = start,
        None => {
            let empty_at = from.min(offset);
            window.start = empty_at;
            window.stop = empty_at;
        }
    }
    log_trace!(
        "WINDOW",
        "window from={} to={:?} -> {} nodes [{}, {})",
        from,
        to,
        window.nodes.len(),
        window.start,
        window.stop
    );
    Ok(window)
}

/// Returns nodes whose leaves are exactly the leaves at `[from, to)`.
///
/// Nodes straddling a boundary are replaced by clones holding only their
/// in-range children; the other nodes are cloned with `Tree::shallow_clone`.
/// When the request covers whole nodes the original ids are returned.
///
/// Clones are allocated in `tree`. Callers that window the same tree
/// repeatedly take a `Tree::mark` once and `Tree::truncate` back to it before
/// each call (see `FinalizedAxis::window`).
pub fn get_cut_nodes_by_child_count(
    tree: &mut Tree,
    nodes: &[NodeId],
    from: usize,
    to: Option<usize>,
) -> Result<Vec<NodeId>> {
    get_cut_nodes_by_child_count_with(tree, nodes, from, to, &mut Tree::shallow_clone)
}

/// `get_cut_nodes_by_child_count` with a caller supplied clone function.
pub fn get_cut_nodes_by_child_count_with<F>(
    tree: &mut Tree,
    nodes: &[NodeId],
    from: usize,
    to: Option<usize>,
    clone: &mut F,
) -> Result<Vec<NodeId>>
where
    F: FnMut(&mut Tree, NodeId) -> NodeId,
{
    let window = get_nodes_by_child_count(tree, nodes, from, to)?;
    if window.nodes.is_empty() {
        return Ok(Vec::new());
    }
    let to = to.map_or(window.stop, |to| to.min(window.stop));
    if window.start == from && window.stop == to {
        return Ok(window.nodes);
    }

    let opts = LengthOptions::default();
    let mut result = Vec::with_capacity(window.nodes.len());
    let mut offset = window.start;
    for id in window.nodes {
        let length = tree.child_length(&[id], &opts);
        let local_from = from.max(offset) - offset;
        let local_to = to.min(offset + length) - offset;
        offset += length;

        if local_from == 0 && local_to == length {
            result.push(clone(tree, id));
            continue;
        }
        let children = tree.children(id).to_vec();
        let cut_children =
            get_cut_nodes_by_child_count_with(tree, &children, local_from, Some(local_to), clone)?;
        let cut = clone(tree, id);
        tree.set_children(cut, cut_children);
        result.push(cut);
    }
    Ok(result)
}

/// Collects the leaves under `nodes` into `acc` in leaf order and returns the
/// deepest level seen, counting the level of `nodes` as `level`.
pub fn get_last_level_nodes(
    tree: &Tree,
    nodes: &[NodeId],
    acc: &mut Vec<NodeId>,
    level: usize,
    options: &LastLevelOptions,
) -> usize {
    let mut max_level = level;
    for &id in nodes {
        let Some(node) = tree.get(id) else {
            continue;
        };
        if node.has_children() {
            let deepest = get_last_level_nodes(tree, node.children(), acc, level + 1, options);
            max_level = max_level.max(deepest);
        } else if !(options.skip_grand_totals && node.is_grand_total()) {
            acc.push(id);
        }
    }
    max_level
}
