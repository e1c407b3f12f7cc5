//! FILENAME: pivot-tree/src/transform.rs
//! Pivot Transform Pipeline - From raw page trees to decorated pivot axes.
//!
//! Steps, per axis:
//! 1. `pre_process_tree`: copy the raw tree into the arena, tagging every node
//!    with the jaql index of its depth's panel and its measure path.
//! 2. `insert_sub_totals`: add a SUB_TOTAL sibling after each summarized group.
//! 3. `insert_grand_totals`: columns only, one GRAND_TOTAL per measure.
//! 4. `insert_measure_nodes`: columns only, MEASURE_BOTTOM leaves or a single
//!    MEASURE_TOP wrapper.
//! 5. `post_process_tree`: fill measure paths and sort markers of synthetic
//!    nodes and emit per-node format events.
//!
//! `modify_tree` runs steps 2-4 in that order (grand total and measure index
//! arithmetic assumes subtotals are already in place) and sets parent links.

use crate::node::{MeasurePath, NodeId, TreeNode, UserType};
use crate::options::{LastLevelOptions, ModifyOptions, PostProcessOptions, PreProcessOptions};
use crate::query::{AxisType, Panel, PivotQuery};
use crate::raw::RawNode;
use crate::tree::Tree;
use crate::window::get_last_level_nodes;

// ============================================================================
// HOOKS
// ============================================================================

/// Per-node notification handed to the cell-styling layer.
pub struct FormatEvent<'a> {
    pub tree: &'a Tree,
    pub node: NodeId,
    /// Panel the node belongs to, if its jaql index resolves to one.
    pub panel: Option<&'a Panel>,
    pub query: &'a PivotQuery,
}

/// Callbacks invoked by `post_process_tree` for every node.
pub trait PostProcessHooks {
    /// Called after structural post-processing of `node`.
    fn iterate(&mut self, _tree: &mut Tree, _node: NodeId) {}

    /// Called once per node unless format events are skipped.
    fn emit(&mut self, _event: FormatEvent<'_>) {}
}

impl PostProcessHooks for () {}

// ============================================================================
// PRE-PROCESSING
// ============================================================================

/// Copies raw `items` into `tree`, tagging jaql indexes and measure paths.
/// Nodes deeper than the axis has panels keep `jaql_index == None`.
pub fn pre_process_tree(
    tree: &mut Tree,
    items: &[RawNode],
    axis: AxisType,
    query: &PivotQuery,
    options: &PreProcessOptions,
) -> Vec<NodeId> {
    items
        .iter()
        .map(|raw| pre_process_node(tree, raw, axis, query, options.depth, &options.measure_path))
        .collect()
}

fn pre_process_node(
    tree: &mut Tree,
    raw: &RawNode,
    axis: AxisType,
    query: &PivotQuery,
    depth: usize,
    inherited: &MeasurePath,
) -> NodeId {
    let mut node = raw.to_node();
    node.level = Some(depth);
    node.pivot.jaql_index = query.panel_at(axis, depth).map(|p| p.jaql_index);

    let mut path = inherited.clone();
    if let (Some(jaql_index), Some(value)) = (node.pivot.jaql_index, &node.value) {
        path.insert(jaql_index, value.clone());
    }
    node.pivot.measure_path = path.clone();

    let children: Vec<NodeId> = raw
        .children()
        .iter()
        .map(|child| pre_process_node(tree, child, axis, query, depth + 1, &path))
        .collect();
    let id = tree.insert(node);
    tree.set_children(id, children);
    id
}

/// Pre-processes a whole raw page. The returned root sentinel keeps the raw
/// root's `index` (the grand total slot, when the server provides one).
pub fn pre_process_root(
    tree: &mut Tree,
    raw_root: &RawNode,
    axis: AxisType,
    query: &PivotQuery,
) -> NodeId {
    let items = pre_process_tree(tree, raw_root.children(), axis, query, &PreProcessOptions::default());
    let mut root = TreeNode::root();
    root.index = raw_root.index;
    let root = tree.insert(root);
    tree.set_children(root, items);
    root
}

// ============================================================================
// SUBTOTALS
// ============================================================================

fn warrants_sub_total(
    node: &TreeNode,
    child_count: usize,
    axis: AxisType,
    query: &PivotQuery,
    subtotals_for_single_row: bool,
) -> bool {
    if node.user_type() != UserType::Ordinary {
        return false;
    }
    let enabled = node
        .pivot
        .jaql_index
        .and_then(|j| query.panel_by_jaql_index(j))
        .map_or(true, |panel| panel.subtotals);
    if !enabled {
        return false;
    }
    let grouped = child_count > 1
        || (axis == AxisType::Columns && node.is_part)
        || subtotals_for_single_row;
    let addressable = match axis {
        AxisType::Columns => node.index.is_some(),
        AxisType::Rows => node.data.is_some(),
    };
    grouped && addressable
}

fn create_sub_total(tree: &mut Tree, master: NodeId, axis: AxisType) -> Option<NodeId> {
    let source = tree.get(master)?;
    let mut node = TreeNode {
        value: source.value.clone(),
        level: source.level,
        ..Default::default()
    };
    match axis {
        AxisType::Columns => node.index = source.index,
        AxisType::Rows => node.data = source.data.clone(),
    }
    node.pivot.jaql_index = source.pivot.jaql_index;
    node.pivot.user_type = UserType::SubTotal;
    node.pivot.master = Some(master);
    Some(tree.insert(node))
}

/// Returns `items` with a SUB_TOTAL node placed after every node whose
/// children warrant one. Children are processed first, bottom-up.
///
/// A node warrants a subtotal when it has several children, when it is a
/// column node continued on the next page (`is_part`), or when
/// `subtotals_for_single_row` is set; and when it carries an `index`
/// (columns) or `data` (rows) to address the subtotal cells.
pub fn insert_sub_totals(
    tree: &mut Tree,
    items: &[NodeId],
    axis: AxisType,
    query: &PivotQuery,
    subtotals_for_single_row: bool,
) -> Vec<NodeId> {
    let mut result = Vec::with_capacity(items.len());
    for &id in items {
        result.push(id);
        if !tree.has_children(id) {
            continue;
        }
        let children = tree.children(id).to_vec();
        let processed = insert_sub_totals(tree, &children, axis, query, subtotals_for_single_row);
        tree.set_children(id, processed);

        let warranted = tree.get(id).map_or(false, |node| {
            warrants_sub_total(node, children.len(), axis, query, subtotals_for_single_row)
        });
        if warranted {
            if let Some(sub_total) = create_sub_total(tree, id, axis) {
                result.push(sub_total);
            }
        }
    }
    result
}

// ============================================================================
// GRAND TOTALS
// ============================================================================

/// Columns only: appends one GRAND_TOTAL node per measure when the original
/// root carries an `index`. Node `n` gets `index = root index + n`.
pub fn insert_grand_totals(
    tree: &mut Tree,
    items: &[NodeId],
    original_root: NodeId,
    axis: AxisType,
    query: &PivotQuery,
) -> Vec<NodeId> {
    let mut result = items.to_vec();
    if axis != AxisType::Columns {
        return result;
    }
    let Some(root_index) = tree.get(original_root).and_then(|n| n.index) else {
        return result;
    };
    for (position, measure) in query.measures().into_iter().enumerate() {
        let mut node = TreeNode::new(measure.title.clone());
        node.index = Some(root_index + position);
        node.level = Some(0);
        node.pivot.user_type = UserType::GrandTotal;
        node.pivot.jaql_index = Some(measure.jaql_index);
        node.pivot.measure_jaql_index = Some(measure.jaql_index);
        result.push(tree.insert(node));
    }
    result
}

// ============================================================================
// MEASURE NODES
// ============================================================================

/// Columns only.
///
/// With several measures, grafts one MEASURE_BOTTOM node per measure under
/// every leaf except grand totals, at most `max_childs` of them when the leaf
/// sets it; node `n` gets `index = leaf index + n`.
///
/// With exactly one measure, every leaf gets that measure's jaql index and the
/// whole forest is wrapped in a single MEASURE_TOP node, which is returned as
/// the only item.
pub fn insert_measure_nodes(
    tree: &mut Tree,
    items: &[NodeId],
    axis: AxisType,
    query: &PivotQuery,
) -> Vec<NodeId> {
    if axis != AxisType::Columns {
        return items.to_vec();
    }
    let measures = query.measures();
    match measures.as_slice() {
        [] => items.to_vec(),
        [measure] => {
            let mut leaves = Vec::new();
            get_last_level_nodes(tree, items, &mut leaves, 0, &LastLevelOptions::default());
            for leaf in leaves {
                if let Some(node) = tree.get_mut(leaf) {
                    node.pivot.measure_jaql_index = Some(measure.jaql_index);
                }
            }
            let mut top = TreeNode::new(measure.title.clone());
            top.pivot.user_type = UserType::MeasureTop;
            top.pivot.jaql_index = Some(measure.jaql_index);
            top.pivot.measure_jaql_index = Some(measure.jaql_index);
            let top = tree.insert(top);
            tree.set_children(top, items.to_vec());
            vec![top]
        }
        measures => {
            let mut leaves = Vec::new();
            let options = LastLevelOptions { skip_grand_totals: true };
            get_last_level_nodes(tree, items, &mut leaves, 0, &options);
            for leaf in leaves {
                let Some(node) = tree.get(leaf) else {
                    continue;
                };
                let limit = node.max_childs.unwrap_or(measures.len()).min(measures.len());
                let base_index = node.index;
                let level = node.level.map(|l| l + 1);
                let bottoms: Vec<NodeId> = measures[..limit]
                    .iter()
                    .enumerate()
                    .map(|(position, measure)| {
                        let mut bottom = TreeNode::new(measure.title.clone());
                        bottom.index = base_index.map(|i| i + position);
                        bottom.level = level;
                        bottom.pivot.user_type = UserType::MeasureBottom;
                        bottom.pivot.jaql_index = Some(measure.jaql_index);
                        bottom.pivot.measure_jaql_index = Some(measure.jaql_index);
                        tree.insert(bottom)
                    })
                    .collect();
                tree.push_children(leaf, bottoms);
            }
            // Every leaf grew, so every ancestor's cached length is stale.
            tree.invalidate_all();
            items.to_vec()
        }
    }
}

// ============================================================================
// POST-PROCESSING
// ============================================================================

/// Gives a SUB_TOTAL node its master's measure path.
pub fn post_process_sub_total(tree: &mut Tree, id: NodeId) {
    let master_path = tree
        .get(id)
        .and_then(|n| n.pivot.master)
        .and_then(|m| tree.get(m))
        .map(|m| m.pivot.measure_path.clone());
    if let (Some(path), Some(node)) = (master_path, tree.get_mut(id)) {
        node.pivot.measure_path = path;
    }
}

/// A grand total is not under any member. Row grand totals are also detached
/// from their parent and addressed at jaql index 0.
pub fn post_process_grand_total(tree: &mut Tree, id: NodeId, axis: AxisType) {
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    node.pivot.measure_path.clear();
    if axis == AxisType::Rows {
        node.pivot.parent = None;
        node.pivot.jaql_index = Some(0);
    }
}

/// Fills the measure path of MEASURE_BOTTOM nodes from their column leaf and
/// marks leaf measure nodes matching their measure's sort.
pub fn post_process_measure_node(
    tree: &mut Tree,
    id: NodeId,
    parent: Option<NodeId>,
    query: &PivotQuery,
) {
    let Some(node) = tree.get(id) else {
        return;
    };
    if node.user_type() == UserType::MeasureBottom {
        let parent_path = parent
            .and_then(|p| tree.get(p))
            .map(|p| p.pivot.measure_path.clone())
            .unwrap_or_default();
        if let Some(node) = tree.get_mut(id) {
            node.pivot.measure_path = parent_path;
        }
    }

    let Some(node) = tree.get(id) else {
        return;
    };
    if node.has_children() {
        return;
    }
    let sort = node
        .pivot
        .measure_jaql_index
        .and_then(|j| query.panel_by_jaql_index(j))
        .and_then(|panel| panel.sort.as_ref())
        .filter(|sort| {
            sort.measure_path
                .as_ref()
                .map_or(true, |path| *path == node.pivot.measure_path)
        })
        .map(|sort| sort.direction);
    if let Some(node) = tree.get_mut(id) {
        node.pivot.sort = sort;
    }
}

/// Second traversal over a decorated axis.
///
/// Structural post-processing and `hooks.iterate` are skipped with
/// `only_format_events`; `hooks.emit` is skipped with `skip_format_event`.
pub fn post_process_tree<H: PostProcessHooks>(
    tree: &mut Tree,
    items: &[NodeId],
    axis: AxisType,
    query: &PivotQuery,
    options: &PostProcessOptions,
    hooks: &mut H,
) {
    tree.iterate_through_tree(items, None, &mut |tree, id, parent| {
        if !options.only_format_events {
            match tree.get(id).map(TreeNode::user_type) {
                Some(UserType::SubTotal) => post_process_sub_total(tree, id),
                Some(UserType::GrandTotal) => post_process_grand_total(tree, id, axis),
                _ => {}
            }
            post_process_measure_node(tree, id, parent, query);
            hooks.iterate(tree, id);
        }
        if !options.skip_format_event {
            let panel = tree
                .get(id)
                .and_then(|n| n.pivot.measure_jaql_index.or(n.pivot.jaql_index))
                .and_then(|j| query.panel_by_jaql_index(j));
            hooks.emit(FormatEvent { tree, node: id, panel, query });
        }
    });
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

fn mark_alternation(tree: &mut Tree, items: &[NodeId]) {
    for (position, leaf) in tree.leaves(items).into_iter().enumerate() {
        if let Some(node) = tree.get_mut(leaf) {
            node.pivot.alternate = position % 2 == 1;
        }
    }
}

/// Decorates the pre-processed axis under `root` with subtotals, grand totals
/// and measure nodes, then sets parent links. The decorated forest becomes
/// the children of `root` and is returned.
pub fn modify_tree(
    tree: &mut Tree,
    root: NodeId,
    axis: AxisType,
    query: &PivotQuery,
    options: &ModifyOptions,
) -> Vec<NodeId> {
    let items = tree.children(root).to_vec();
    if options.mark_alternation {
        mark_alternation(tree, &items);
    }

    let items = insert_sub_totals(tree, &items, axis, query, options.subtotals_for_single_row);
    let items = insert_grand_totals(tree, &items, root, axis, query);
    let items = insert_measure_nodes(tree, &items, axis, query);

    tree.iterate_through_tree(&items, None, &mut |tree, id, parent| {
        if let Some(node) = tree.get_mut(id) {
            node.pivot.parent = parent;
        }
    });
    tree.set_children(root, items.clone());
    log_debug!("PIVOT", "modified {:?} axis: {} top-level nodes", axis, items.len());
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LengthOptions;
    use crate::query::{Panel, PanelAxis, SortDetails, SortDirection};
    use serde_json::json;

    fn query_with_measures(count: usize) -> PivotQuery {
        let mut panels = vec![
            Panel::new(PanelAxis::Rows, 0, "Region"),
            Panel::new(PanelAxis::Columns, 1, "Year"),
            Panel::new(PanelAxis::Columns, 2, "Quarter"),
        ];
        for n in 0..count {
            panels.push(Panel::new(PanelAxis::Measures, 3 + n, format!("M{n}")));
        }
        PivotQuery::new(panels)
    }

    fn values(tree: &Tree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| tree.value(id).unwrap_or_default().to_string())
            .collect()
    }

    fn user_type(tree: &Tree, id: NodeId) -> UserType {
        tree.get(id).unwrap().user_type()
    }

    /// 2020(index 2) -> [Q1(0), Q2(1)], 2021(index 5) -> [Q1(3), Q2(4)]; root index 6
    fn columns_page() -> RawNode {
        RawNode::default().with_index(6).with_children(vec![
            RawNode::new("2020").with_index(2).with_children(vec![
                RawNode::new("Q1").with_index(0),
                RawNode::new("Q2").with_index(1),
            ]),
            RawNode::new("2021").with_index(5).with_children(vec![
                RawNode::new("Q1").with_index(3),
                RawNode::new("Q2").with_index(4),
            ]),
        ])
    }

    #[test]
    fn test_pre_process_tags_jaql_index_and_path() {
        let query = query_with_measures(1);
        let mut tree = Tree::new();
        let root = pre_process_root(&mut tree, &columns_page(), AxisType::Columns, &query);
        assert!(tree.is_root(root));
        assert_eq!(tree.get(root).unwrap().index, Some(6));

        let y2021 = tree.children(root)[1];
        let q2 = tree.children(y2021)[1];
        let node = tree.get(q2).unwrap();
        assert_eq!(node.pivot.jaql_index, Some(2));
        assert_eq!(node.level, Some(1));
        let expected: MeasurePath =
            [(1, "2021".to_string()), (2, "Q2".to_string())].into_iter().collect();
        assert_eq!(node.pivot.measure_path, expected);
    }

    #[test]
    fn test_pre_process_missing_panel_leaves_jaql_index_unset() {
        let query = query_with_measures(1);
        let raw = vec![RawNode::new("North").with_children(vec![RawNode::new("Apples")])];
        let mut tree = Tree::new();
        let items = pre_process_tree(&mut tree, &raw, AxisType::Rows, &query, &PreProcessOptions::default());
        let apples = tree.children(items[0])[0];
        let node = tree.get(apples).unwrap();
        assert_eq!(node.pivot.jaql_index, None);
        assert_eq!(node.pivot.measure_path.len(), 1);
    }

    #[test]
    fn test_pre_process_with_inherited_path() {
        let query = query_with_measures(1);
        let raw = vec![RawNode::new("Q3")];
        let options = PreProcessOptions {
            depth: 1,
            measure_path: [(1, "2021".to_string())].into_iter().collect(),
        };
        let mut tree = Tree::new();
        let items = pre_process_tree(&mut tree, &raw, AxisType::Columns, &query, &options);
        let node = tree.get(items[0]).unwrap();
        assert_eq!(node.pivot.jaql_index, Some(2));
        assert_eq!(node.pivot.measure_path.get(&1).map(String::as_str), Some("2021"));
    }

    #[test]
    fn test_sub_total_for_column_group() {
        let query = query_with_measures(2);
        let mut tree = Tree::new();
        let root = pre_process_root(&mut tree, &columns_page(), AxisType::Columns, &query);
        let items = tree.children(root).to_vec();
        let result = insert_sub_totals(&mut tree, &items, AxisType::Columns, &query, false);

        assert_eq!(values(&tree, &result), vec!["2020", "2020", "2021", "2021"]);
        let sub_total = tree.get(result[1]).unwrap();
        assert_eq!(sub_total.user_type(), UserType::SubTotal);
        assert_eq!(sub_total.pivot.master, Some(items[0]));
        assert_eq!(sub_total.pivot.jaql_index, Some(1));
        assert_eq!(sub_total.index, Some(2));
        // Leaves get no subtotal of their own.
        assert_eq!(tree.children(items[0]).len(), 2);
    }

    #[test]
    fn test_sub_total_rules() {
        let query = query_with_measures(1);
        let raw = vec![
            // Single child, not continued: no subtotal.
            RawNode::new("2020").with_index(1).with_children(vec![RawNode::new("Q1").with_index(0)]),
            // Single child but continued on the next page.
            RawNode::new("2021")
                .with_index(3)
                .part()
                .with_children(vec![RawNode::new("Q1").with_index(2).part()]),
            // Several children but no index to address the subtotal.
            RawNode::new("2022").with_children(vec![RawNode::new("Q1"), RawNode::new("Q2")]),
        ];
        let mut tree = Tree::new();
        let items = pre_process_tree(&mut tree, &raw, AxisType::Columns, &query, &PreProcessOptions::default());
        let result = insert_sub_totals(&mut tree, &items, AxisType::Columns, &query, false);
        let types: Vec<UserType> = result.iter().map(|&id| user_type(&tree, id)).collect();
        assert_eq!(
            types,
            vec![UserType::Ordinary, UserType::Ordinary, UserType::SubTotal, UserType::Ordinary]
        );

        let result = insert_sub_totals(&mut tree, &items[..1], AxisType::Columns, &query, true);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_row_sub_totals_need_data_and_enabled_panel() {
        let mut query = query_with_measures(1);
        let raw = vec![RawNode::new("North")
            .with_data(json!({"row": 0}))
            .with_children(vec![RawNode::new("Apples"), RawNode::new("Pears")])];
        let mut tree = Tree::new();
        let items = pre_process_tree(&mut tree, &raw, AxisType::Rows, &query, &PreProcessOptions::default());
        let result = insert_sub_totals(&mut tree, &items, AxisType::Rows, &query, false);
        assert_eq!(result.len(), 2);
        assert_eq!(tree.get(result[1]).unwrap().data, Some(json!({"row": 0})));

        query.panels[0].subtotals = false;
        let mut tree = Tree::new();
        let items = pre_process_tree(&mut tree, &raw, AxisType::Rows, &query, &PreProcessOptions::default());
        let result = insert_sub_totals(&mut tree, &items, AxisType::Rows, &query, false);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_grand_total_index_offset() {
        let query = query_with_measures(2);
        let mut tree = Tree::new();
        let root = tree.insert(TreeNode {
            index: Some(5),
            ..TreeNode::root()
        });
        let a = tree.leaf("A");
        let result = insert_grand_totals(&mut tree, &[a], root, AxisType::Columns, &query);
        assert_eq!(result.len(), 3);
        let indices: Vec<Option<usize>> = result[1..].iter().map(|&id| tree.get(id).unwrap().index).collect();
        assert_eq!(indices, vec![Some(5), Some(6)]);
        assert!(result[1..].iter().all(|&id| user_type(&tree, id) == UserType::GrandTotal));

        // Rows never get grand totals here, nor roots without an index.
        assert_eq!(insert_grand_totals(&mut tree, &[a], root, AxisType::Rows, &query), vec![a]);
        let bare = tree.insert(TreeNode::root());
        assert_eq!(insert_grand_totals(&mut tree, &[a], bare, AxisType::Columns, &query), vec![a]);
    }

    #[test]
    fn test_single_measure_collapse() {
        let query = query_with_measures(1);
        let mut tree = Tree::new();
        let root = pre_process_root(&mut tree, &columns_page(), AxisType::Columns, &query);
        let items = tree.children(root).to_vec();
        let leaves = tree.leaves(&items);

        let result = insert_measure_nodes(&mut tree, &items, AxisType::Columns, &query);
        assert_eq!(result.len(), 1);
        let top = tree.get(result[0]).unwrap();
        assert_eq!(top.user_type(), UserType::MeasureTop);
        assert_eq!(tree.children(result[0]), items.as_slice());
        for leaf in leaves {
            assert_eq!(tree.get(leaf).unwrap().pivot.measure_jaql_index, Some(3));
        }
    }

    #[test]
    fn test_measure_bottom_nodes() {
        let query = query_with_measures(3);
        let raw = vec![
            RawNode::new("2020").with_index(0),
            RawNode {
                max_childs: Some(2),
                ..RawNode::new("2021").with_index(3)
            },
        ];
        let mut tree = Tree::new();
        let items = pre_process_tree(&mut tree, &raw, AxisType::Columns, &query, &PreProcessOptions::default());
        assert_eq!(tree.child_length(&items, &LengthOptions::default()), 2);

        let result = insert_measure_nodes(&mut tree, &items, AxisType::Columns, &query);
        assert_eq!(result, items);
        assert_eq!(values(&tree, tree.children(items[0])), vec!["M0", "M1", "M2"]);
        let bottoms = tree.children(items[1]).to_vec();
        assert_eq!(bottoms.len(), 2);
        let indices: Vec<Option<usize>> = bottoms.iter().map(|&id| tree.get(id).unwrap().index).collect();
        assert_eq!(indices, vec![Some(3), Some(4)]);
        assert_eq!(user_type(&tree, bottoms[1]), UserType::MeasureBottom);
        assert_eq!(tree.get(bottoms[1]).unwrap().pivot.measure_jaql_index, Some(4));
        assert_eq!(tree.child_length(&items, &LengthOptions::default()), 5);
    }

    #[test]
    fn test_modify_tree_columns_end_to_end() {
        let query = query_with_measures(2);
        let mut tree = Tree::new();
        let root = pre_process_root(&mut tree, &columns_page(), AxisType::Columns, &query);
        let items = modify_tree(&mut tree, root, AxisType::Columns, &query, &ModifyOptions::default());

        // 2020, ST(2020), 2021, ST(2021), GT(M0), GT(M1)
        let types: Vec<UserType> = items.iter().map(|&id| user_type(&tree, id)).collect();
        assert_eq!(
            types,
            vec![
                UserType::Ordinary,
                UserType::SubTotal,
                UserType::Ordinary,
                UserType::SubTotal,
                UserType::GrandTotal,
                UserType::GrandTotal,
            ]
        );
        // Subtotals receive measure nodes, grand totals do not.
        let sub_total_measures = tree.children(items[1]).to_vec();
        let indices: Vec<Option<usize>> =
            sub_total_measures.iter().map(|&id| tree.get(id).unwrap().index).collect();
        assert_eq!(indices, vec![Some(2), Some(3)]);
        assert!(!tree.has_children(items[4]));
        assert_eq!(tree.get(items[5]).unwrap().index, Some(7));

        // 4 quarters x 2 + 2 subtotals x 2 + 2 grand totals
        assert_eq!(tree.child_length(&[root], &LengthOptions::default()), 14);

        let q1 = tree.children(items[0])[0];
        assert_eq!(tree.get(q1).unwrap().pivot.parent, Some(items[0]));
        assert_eq!(tree.get(items[0]).unwrap().pivot.parent, None);
    }

    #[test]
    fn test_mark_alternation() {
        let query = query_with_measures(0);
        let raw = RawNode::default().with_children(vec![
            RawNode::new("A"),
            RawNode::new("B"),
            RawNode::new("C"),
        ]);
        let mut tree = Tree::new();
        let root = pre_process_root(&mut tree, &raw, AxisType::Rows, &query);
        let options = ModifyOptions {
            mark_alternation: true,
            ..Default::default()
        };
        let items = modify_tree(&mut tree, root, AxisType::Rows, &query, &options);
        let flags: Vec<bool> = items.iter().map(|&id| tree.get(id).unwrap().pivot.alternate).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[derive(Default)]
    struct RecordingHooks {
        iterated: usize,
        emitted: Vec<(String, Option<usize>)>,
    }

    impl PostProcessHooks for RecordingHooks {
        fn iterate(&mut self, _tree: &mut Tree, _node: NodeId) {
            self.iterated += 1;
        }

        fn emit(&mut self, event: FormatEvent<'_>) {
            let value = event.tree.value(event.node).unwrap_or_default().to_string();
            self.emitted.push((value, event.panel.map(|p| p.jaql_index)));
        }
    }

    #[test]
    fn test_post_process_fills_paths_and_sort() {
        let mut query = query_with_measures(2);
        query.panels[4].sort = Some(SortDetails {
            direction: SortDirection::Desc,
            measure_path: Some([(1, "2021".to_string()), (2, "Q1".to_string())].into_iter().collect()),
        });
        let mut tree = Tree::new();
        let root = pre_process_root(&mut tree, &columns_page(), AxisType::Columns, &query);
        let items = modify_tree(&mut tree, root, AxisType::Columns, &query, &ModifyOptions::default());
        post_process_tree(&mut tree, &items, AxisType::Columns, &query, &PostProcessOptions::default(), &mut ());

        let sub_total = tree.get(items[3]).unwrap();
        assert_eq!(sub_total.pivot.measure_path.get(&1).map(String::as_str), Some("2021"));

        let y2021 = items[2];
        let q1 = tree.children(y2021)[0];
        let bottoms = tree.children(q1).to_vec();
        assert_eq!(tree.get(bottoms[0]).unwrap().pivot.sort, None);
        assert_eq!(tree.get(bottoms[1]).unwrap().pivot.sort, Some(SortDirection::Desc));
        assert_eq!(tree.get(bottoms[1]).unwrap().pivot.measure_path.len(), 2);

        let grand_total = tree.get(items[4]).unwrap();
        assert!(grand_total.pivot.measure_path.is_empty());
    }

    #[test]
    fn test_post_process_row_grand_total() {
        let query = query_with_measures(1);
        let raw = RawNode::default().with_children(vec![
            RawNode::new("North").with_children(vec![RawNode::new("Apples")]),
            RawNode {
                user_type: UserType::GrandTotal,
                ..RawNode::new("Grand Total")
            },
        ]);
        let mut tree = Tree::new();
        let root = pre_process_root(&mut tree, &raw, AxisType::Rows, &query);
        let items = modify_tree(&mut tree, root, AxisType::Rows, &query, &ModifyOptions::default());
        tree.get_mut(items[1]).unwrap().pivot.parent = Some(items[0]);

        post_process_tree(&mut tree, &items, AxisType::Rows, &query, &PostProcessOptions::default(), &mut ());
        let grand_total = tree.get(items[1]).unwrap();
        assert_eq!(grand_total.pivot.parent, None);
        assert_eq!(grand_total.pivot.jaql_index, Some(0));
        assert!(grand_total.pivot.measure_path.is_empty());
    }

    #[test]
    fn test_post_process_hook_gating() {
        let query = query_with_measures(1);
        let mut tree = Tree::new();
        let root = pre_process_root(&mut tree, &columns_page(), AxisType::Columns, &query);
        let items = modify_tree(&mut tree, root, AxisType::Columns, &query, &ModifyOptions::default());
        let total_nodes = {
            let mut count = 0;
            tree.iterate_through_tree(&items, None, &mut |_, _, _| count += 1);
            count
        };

        let mut hooks = RecordingHooks::default();
        post_process_tree(&mut tree, &items, AxisType::Columns, &query, &PostProcessOptions::default(), &mut hooks);
        assert_eq!(hooks.iterated, total_nodes);
        assert_eq!(hooks.emitted.len(), total_nodes);
        // The measure wrapper resolves to the measure panel.
        assert_eq!(hooks.emitted[0], ("M0".to_string(), Some(3)));

        let mut hooks = RecordingHooks::default();
        let options = PostProcessOptions {
            only_format_events: true,
            ..Default::default()
        };
        post_process_tree(&mut tree, &items, AxisType::Columns, &query, &options, &mut hooks);
        assert_eq!(hooks.iterated, 0);
        assert_eq!(hooks.emitted.len(), total_nodes);

        let mut hooks = RecordingHooks::default();
        let options = PostProcessOptions {
            skip_format_event: true,
            ..Default::default()
        };
        post_process_tree(&mut tree, &items, AxisType::Columns, &query, &options, &mut hooks);
        assert_eq!(hooks.iterated, total_nodes);
        assert!(hooks.emitted.is_empty());
    }
}
