//! FILENAME: pivot-tree/src/accumulator.rs
//! Axis Accumulator - Collects the pages of one axis and finalizes them.
//!
//! Pages are pre-processed and merged into a running, undecorated tree.
//! Decoration happens on a copy, so later pages can still be spliced along
//! the original cut path. Callers serialize page arrivals; a query change
//! calls `reset` and starts over.

use crate::error::Result;
use crate::merge::{deep_merge, MergeOutcome};
use crate::node::NodeId;
use crate::options::{ModifyOptions, PostProcessOptions};
use crate::query::{AxisType, PivotQuery};
use crate::raw::RawNode;
use crate::transform::{modify_tree, post_process_tree, pre_process_root, PostProcessHooks};
use crate::tree::Tree;
use crate::window::get_cut_nodes_by_child_count;

/// A decorated axis ready for rendering.
#[derive(Debug, Clone)]
pub struct FinalizedAxis {
    pub tree: Tree,
    pub root: NodeId,
    /// Top-level nodes in display order.
    pub nodes: Vec<NodeId>,
    /// Arena size right after decoration; window copies live above it.
    base: usize,
}

impl FinalizedAxis {
    /// Nodes whose leaves are exactly `[from, to)`.
    ///
    /// Copies made for the previous window are released first, so ids
    /// returned by an earlier call are invalid afterwards.
    pub fn window(&mut self, from: usize, to: Option<usize>) -> Result<Vec<NodeId>> {
        self.tree.truncate(self.base);
        get_cut_nodes_by_child_count(&mut self.tree, &self.nodes, from, to)
    }
}

/// Running state of one axis across result pages.
#[derive(Debug, Clone)]
pub struct AxisAccumulator {
    axis: AxisType,
    tree: Tree,
    root: Option<NodeId>,
    pages: usize,
}

impl AxisAccumulator {
    pub fn new(axis: AxisType) -> Self {
        AxisAccumulator {
            axis,
            tree: Tree::new(),
            root: None,
            pages: 0,
        }
    }

    pub fn axis(&self) -> AxisType {
        self.axis
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// The running undecorated tree and its root, if any page arrived.
    pub fn current(&self) -> Option<(&Tree, NodeId)> {
        self.root.map(|root| (&self.tree, root))
    }

    /// Leaves of the running tree.
    pub fn leaf_count(&mut self) -> usize {
        match self.root {
            Some(root) => self.tree.child_length(&[root], &Default::default()),
            None => 0,
        }
    }

    /// Merges one page. Pages without a shared cut path are appended flat.
    pub fn push_page(&mut self, page: &RawNode, query: &PivotQuery) -> MergeOutcome {
        let incoming = pre_process_root(&mut self.tree, page, self.axis, query);
        self.pages += 1;

        let Some(current) = self.root else {
            self.root = Some(incoming);
            return MergeOutcome::Spliced;
        };
        let (merged, outcome) = deep_merge(&mut self.tree, current, incoming);
        let merged = match outcome {
            MergeOutcome::NoCut => {
                let flat = self.tree.merge(Some(merged), Some(incoming));
                // The grand total slot travels with the first page's root.
                let index = self.tree.get(merged).and_then(|n| n.index);
                if let Some(node) = self.tree.get_mut(flat) {
                    node.index = index;
                }
                flat
            }
            _ => merged,
        };
        self.root = Some(merged);
        log_debug!(
            "PIVOT",
            "{:?} page {} merged: {:?}",
            self.axis,
            self.pages,
            outcome
        );
        outcome
    }

    /// Decorates a copy of the running tree.
    pub fn finalize<H: PostProcessHooks>(
        &self,
        query: &PivotQuery,
        modify: &ModifyOptions,
        post: &PostProcessOptions,
        hooks: &mut H,
    ) -> Option<FinalizedAxis> {
        let source_root = self.root?;
        let mut tree = Tree::new();
        let root = tree.copy_from(&self.tree, source_root)?;
        let nodes = modify_tree(&mut tree, root, self.axis, query, modify);
        post_process_tree(&mut tree, &nodes, self.axis, query, post, hooks);
        let base = tree.mark();
        Some(FinalizedAxis {
            tree,
            root,
            nodes,
            base,
        })
    }

    /// Drops all pages, e.g. after the query parameters changed.
    pub fn reset(&mut self) {
        self.tree = Tree::new();
        self.root = None;
        self.pages = 0;
    }
}
