//! FILENAME: pivot-tree/src/tree.rs
//! Tree arena and node primitives.
//!
//! Nodes live in a flat `Vec` and refer to each other by `NodeId`. Leaf counts
//! and depths are memoized in side tables keyed by `NodeId`; any structural
//! mutation of a node removes that node's entries, so a stale cache is always
//! the result of mutating a descendant without calling `invalidate`.
//!
//! Every primitive is tolerant: an id that does not belong to the arena
//! behaves like an absent node (no children, length 0) instead of panicking.

use rustc_hash::FxHashMap;
use serde_json::Value;
use crate::node::{NodeId, TreeNode};
use crate::options::LengthOptions;

/// Arena holding one or more trees.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<TreeNode>,

    /// Cached leaf counts per node.
    child_count: FxHashMap<NodeId, usize>,

    /// Cached depths per node.
    child_deep: FxHashMap<NodeId, usize>,
}

impl Tree {
    pub fn new() -> Self {
        Tree::default()
    }

    /// Number of nodes allocated in the arena (including detached ones).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Adds a node to the arena. An explicit empty child list is dropped.
    ///
    /// # Panics
    /// When the arena already holds `u32::MAX` nodes.
    pub fn insert(&mut self, mut node: TreeNode) -> NodeId {
        if node.children.as_ref().map_or(false, |c| c.is_empty()) {
            node.children = None;
        }
        let Ok(raw) = u32::try_from(self.nodes.len()) else {
            panic!("tree arena is full ({} nodes)", self.nodes.len());
        };
        let id = NodeId(raw);
        self.nodes.push(node);
        id
    }

    /// Builds a node from its parts, leaving absent fields unset.
    pub fn create(
        &mut self,
        value: Option<String>,
        children: Vec<NodeId>,
        data: Option<Value>,
        index: Option<usize>,
    ) -> NodeId {
        self.insert(TreeNode {
            value,
            children: Some(children),
            data,
            index,
            ..Default::default()
        })
    }

    pub fn leaf(&mut self, value: impl Into<String>) -> NodeId {
        self.insert(TreeNode::new(value))
    }

    pub fn branch(&mut self, value: impl Into<String>, children: Vec<NodeId>) -> NodeId {
        self.create(Some(value.into()), children, None, None)
    }

    /// Adds a copy of `id` that shares its children.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        match self.get(id) {
            Some(node) => {
                let node = node.clone();
                self.insert(node)
            }
            None => id,
        }
    }

    /// Deep-copies the subtree at `id` of `other` into this arena.
    /// `master`/`parent` links are remapped when their target was copied too.
    pub fn copy_from(&mut self, other: &Tree, id: NodeId) -> Option<NodeId> {
        let mut remap: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let copied = self.copy_node(other, id, &mut remap)?;
        for &new_id in remap.values() {
            if let Some(node) = self.nodes.get_mut(new_id.index()) {
                node.pivot.master = node.pivot.master.and_then(|m| remap.get(&m).copied());
                node.pivot.parent = node.pivot.parent.and_then(|p| remap.get(&p).copied());
            }
        }
        Some(copied)
    }

    fn copy_node(
        &mut self,
        other: &Tree,
        id: NodeId,
        remap: &mut FxHashMap<NodeId, NodeId>,
    ) -> Option<NodeId> {
        let source = other.get(id)?;
        let children: Vec<NodeId> = source
            .children()
            .iter()
            .filter_map(|&child| self.copy_node(other, child, remap))
            .collect();
        let mut node = source.clone();
        node.children = Some(children);
        let new_id = self.insert(node);
        remap.insert(id, new_id);
        Some(new_id)
    }

    /// Current arena size, to be handed back to `truncate`.
    pub fn mark(&self) -> usize {
        self.nodes.len()
    }

    /// Releases every node allocated since `mark` together with its cached
    /// lengths. Nodes older than `mark` must not refer to the released ones.
    pub fn truncate(&mut self, mark: usize) {
        if mark >= self.nodes.len() {
            return;
        }
        self.nodes.truncate(mark);
        self.child_count.retain(|id, _| id.index() < mark);
        self.child_deep.retain(|id, _| id.index() < mark);
    }

    // ========================================================================
    // ACCESS
    // ========================================================================

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    /// Mutable access to a node's scalar fields. Children can only be changed
    /// through `set_children`/`push_children` so the caches stay honest.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| n.value.as_deref())
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.get(id).map_or(false, TreeNode::has_children)
    }

    /// Children of `id`, or an empty slice.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], TreeNode::children)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.get(id).map_or(false, TreeNode::is_root)
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Replaces the children of `id`. An empty list removes the children key.
    /// Unknown ids are ignored.
    pub fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        let Some(node) = self.nodes.get_mut(id.index()) else {
            return;
        };
        node.children = if children.is_empty() { None } else { Some(children) };
        self.invalidate(id);
    }

    /// Appends to the children of `id`.
    pub fn push_children(&mut self, id: NodeId, extra: impl IntoIterator<Item = NodeId>) {
        let Some(node) = self.nodes.get_mut(id.index()) else {
            return;
        };
        let mut children = node.children.take().unwrap_or_default();
        children.extend(extra);
        node.children = if children.is_empty() { None } else { Some(children) };
        self.invalidate(id);
    }

    // ========================================================================
    // CACHED LENGTHS
    // ========================================================================

    /// Drops the cached lengths of one node.
    pub fn invalidate(&mut self, id: NodeId) {
        self.child_count.remove(&id);
        self.child_deep.remove(&id);
    }

    pub fn invalidate_all(&mut self) {
        self.child_count.clear();
        self.child_deep.clear();
    }

    /// Whether `id` currently has a cached leaf count.
    pub fn is_cached(&self, id: NodeId) -> bool {
        self.child_count.contains_key(&id)
    }

    /// Total number of leaves under `nodes`. A node without children counts
    /// as one leaf; a root sentinel counts only its children.
    pub fn child_length(&mut self, nodes: &[NodeId], options: &LengthOptions) -> usize {
        nodes
            .iter()
            .map(|&id| self.node_child_length(id, options.clear_cache))
            .sum()
    }

    fn node_child_length(&mut self, id: NodeId, clear_cache: bool) -> usize {
        let Some(node) = self.get(id) else {
            return 0;
        };
        let is_root = node.is_root();
        if !clear_cache && !is_root {
            if let Some(&cached) = self.child_count.get(&id) {
                return cached;
            }
        }
        let length = if node.has_children() {
            let children = node.children().to_vec();
            children
                .into_iter()
                .map(|child| self.node_child_length(child, clear_cache))
                .sum()
        } else if is_root {
            0
        } else {
            1
        };
        if !is_root {
            self.child_count.insert(id, length);
        }
        length
    }

    /// Number of levels below and including the deepest path under `nodes`.
    /// A root sentinel is not a level of its own.
    pub fn deep_length(&mut self, nodes: &[NodeId], options: &LengthOptions) -> usize {
        nodes
            .iter()
            .map(|&id| self.node_deep_length(id, options.clear_cache))
            .max()
            .unwrap_or(0)
    }

    fn node_deep_length(&mut self, id: NodeId, clear_cache: bool) -> usize {
        let Some(node) = self.get(id) else {
            return 0;
        };
        let is_root = node.is_root();
        if !clear_cache && !is_root {
            if let Some(&cached) = self.child_deep.get(&id) {
                return cached;
            }
        }
        let children = node.children().to_vec();
        let below = children
            .into_iter()
            .map(|child| self.node_deep_length(child, clear_cache))
            .max()
            .unwrap_or(0);
        if is_root {
            return below;
        }
        let depth = below + 1;
        self.child_deep.insert(id, depth);
        depth
    }

    // ========================================================================
    // TRAVERSAL
    // ========================================================================

    /// Depth-first pre-order walk calling `callback(tree, node, parent)`.
    /// The callback may mutate node fields; children are read after the
    /// callback returns.
    pub fn iterate_through_tree<F>(&mut self, nodes: &[NodeId], parent: Option<NodeId>, callback: &mut F)
    where
        F: FnMut(&mut Tree, NodeId, Option<NodeId>),
    {
        for &id in nodes {
            if self.get(id).is_none() {
                continue;
            }
            callback(self, id, parent);
            let children = self.children(id).to_vec();
            self.iterate_through_tree(&children, Some(id), callback);
        }
    }

    /// Leaves under `nodes` in left-to-right depth-first order.
    pub fn leaves(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        let mut acc = Vec::new();
        self.collect_leaves(nodes, &mut acc);
        acc
    }

    fn collect_leaves(&self, nodes: &[NodeId], acc: &mut Vec<NodeId>) {
        for &id in nodes {
            match self.get(id) {
                Some(node) if node.has_children() => self.collect_leaves(node.children(), acc),
                Some(node) if node.is_root() => {}
                Some(_) => acc.push(id),
                None => {}
            }
        }
    }

    // ========================================================================
    // ROOTS AND SHALLOW MERGE
    // ========================================================================

    /// Normalizes a bare node or a forest into a single-rooted tree.
    /// A single node that already is a root sentinel is returned unchanged.
    pub fn wrap_in_root_node(&mut self, nodes: &[NodeId]) -> NodeId {
        if let [single] = nodes {
            if self.is_root(*single) {
                return *single;
            }
        }
        let root = self.insert(TreeNode::root());
        self.set_children(root, nodes.to_vec());
        root
    }

    /// Concatenates the top-level children of both trees under a new root.
    /// No stitching happens below the top level; see `merge::deep_merge`.
    pub fn merge(&mut self, first: Option<NodeId>, second: Option<NodeId>) -> NodeId {
        let mut children = Vec::new();
        for side in [first, second].into_iter().flatten() {
            if self.get(side).is_none() {
                continue;
            }
            let wrapped = self.wrap_in_root_node(&[side]);
            children.extend_from_slice(self.children(wrapped));
        }
        let root = self.insert(TreeNode::root());
        self.set_children(root, children);
        root
    }
}
