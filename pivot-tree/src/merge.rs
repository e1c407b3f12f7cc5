//! FILENAME: pivot-tree/src/merge.rs
//! Tree Merge Engine - Stitches consecutive result pages into one tree.
//!
//! The query layer marks the nodes at a page boundary with `is_part`: the
//! right edge of the previous page and the left edge of the next page name the
//! same member path. Merging splices the next page's nodes under that shared
//! path instead of duplicating it:
//!
//! 1. `find_last_cut` walks the target's right edge while nodes are `is_part`.
//! 2. `find_first_cut` walks the source's left edge down to the same level and
//!    matches on `(value, level)`.
//! 3. The matched source node's children are appended to the target cut node,
//!    and the source node is marked `is_handled`.
//! 4. A lockstep pass from both roots appends the source's remaining siblings
//!    at every level above the cut, stopping at the handled node.
//!
//! Malformed cut paths are not an error: splicing stops at the first mismatch
//! and the result reports how far it got.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use crate::node::NodeId;
use crate::tree::Tree;

type CutPath = SmallVec<[NodeId; 8]>;

/// How much of the source page `deep_merge` managed to splice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeOutcome {
    /// Every source node was placed in the target.
    Spliced,
    /// Splicing started but stopped at a mismatched cut marker; some source
    /// nodes are missing from the target.
    Partial,
    /// No shared cut path; the target was not changed. Callers fall back to
    /// `Tree::merge` or treat the page as a fresh tree.
    NoCut,
}

impl MergeOutcome {
    pub fn is_fully_merged(self) -> bool {
        self == MergeOutcome::Spliced
    }
}

/// Right edge of `root` made of `is_part` nodes, recording each node's level.
fn last_cut_path(tree: &mut Tree, root: NodeId) -> CutPath {
    let mut path = CutPath::new();
    let mut node = root;
    let mut level = 0;
    while let Some(last) = tree.last_child(node) {
        let Some(last_node) = tree.get_mut(last) else {
            break;
        };
        if !last_node.is_part {
            break;
        }
        last_node.level = Some(level);
        path.push(last);
        node = last;
        level += 1;
    }
    path
}

/// Deepest node of the `is_part` right edge of `root`, with `level` set on
/// every node of that edge.
pub fn find_last_cut(tree: &mut Tree, root: NodeId) -> Option<NodeId> {
    last_cut_path(tree, root).last().copied()
}

/// Node on the left edge of `root` at the level of `target_cut`, if its value
/// matches the target cut's value.
pub fn find_first_cut(tree: &mut Tree, root: NodeId, target_cut: NodeId) -> Option<NodeId> {
    let target = tree.get(target_cut)?;
    let level = target.level?;
    let value = target.value.clone();

    let mut node = tree.first_child(root)?;
    for _ in 0..level {
        node = tree.first_child(node)?;
    }
    let candidate = tree.get_mut(node)?;
    candidate.level = Some(level);
    (candidate.value == value).then_some(node)
}

fn continues(tree: &Tree, target_last: NodeId, source_first: NodeId) -> bool {
    match (tree.get(target_last), tree.get(source_first)) {
        (Some(t), Some(s)) => t.is_part && s.is_part && t.value == s.value,
        _ => false,
    }
}

/// Splices `source` into `target` along their shared cut path.
///
/// Both trees must live in `tree`. Bare nodes are wrapped in a root first;
/// the returned id is the (possibly new) root of the merged target. The
/// source page is consumed: its nodes become children of the target.
pub fn deep_merge(tree: &mut Tree, target: NodeId, source: NodeId) -> (NodeId, MergeOutcome) {
    let target = tree.wrap_in_root_node(&[target]);
    let source = tree.wrap_in_root_node(&[source]);

    let mut touched: CutPath = smallvec![target];
    let cut_path = last_cut_path(tree, target);
    touched.extend_from_slice(&cut_path);

    let mut spliced = false;
    let target_cut = cut_path.last().copied();
    let source_cut = target_cut.and_then(|cut| find_first_cut(tree, source, cut));
    if let (Some(t_cut), Some(s_cut)) = (target_cut, source_cut) {
        log_debug!(
            "MERGE",
            "cut node {:?} at level {:?}",
            tree.value(t_cut),
            tree.get(t_cut).and_then(|n| n.level)
        );
        if tree.has_children(s_cut) {
            let spliced_children = tree.children(s_cut).to_vec();
            tree.push_children(t_cut, spliced_children);
            if let Some(node) = tree.get_mut(s_cut) {
                node.is_handled = true;
            }
            spliced = true;
        }
    }

    let (mut t, mut s) = (target, source);
    let mut depth = 0;
    let outcome = loop {
        let matched_any = spliced || depth > 0;
        let (Some(s_first), Some(t_last)) = (tree.first_child(s), tree.last_child(t)) else {
            if !tree.has_children(s) {
                break MergeOutcome::Spliced;
            }
            break if matched_any { MergeOutcome::Partial } else { MergeOutcome::NoCut };
        };
        if !continues(tree, t_last, s_first) {
            break if matched_any { MergeOutcome::Partial } else { MergeOutcome::NoCut };
        }

        let rest = tree.children(s)[1..].to_vec();
        if !rest.is_empty() {
            tree.push_children(t, rest);
        }
        if tree.get(s_first).map_or(false, |n| n.is_handled) {
            break MergeOutcome::Spliced;
        }
        t = t_last;
        s = s_first;
        touched.push(t);
        depth += 1;
    };

    for id in touched {
        tree.invalidate(id);
    }
    match outcome {
        MergeOutcome::Partial => {
            log_warn!("MERGE", "partial merge: cut paths diverge at depth {}", depth)
        }
        _ => log_debug!("MERGE", "merge finished: {:?} at depth {}", outcome, depth),
    }
    (target, outcome)
}
