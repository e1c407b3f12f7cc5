//! FILENAME: pivot-tree/tests/common/mod.rs
//! Shared fixtures for the paging integration tests.

#![allow(dead_code)]

use pivot_tree::{NodeId, Panel, PanelAxis, PivotQuery, RawNode, Tree};

pub fn page(json: &str) -> RawNode {
    serde_json::from_str(json).expect("fixture page must parse")
}

pub fn rows_query() -> PivotQuery {
    PivotQuery::new(vec![
        Panel::new(PanelAxis::Rows, 0, "Year"),
        Panel::new(PanelAxis::Rows, 1, "Quarter"),
        Panel::new(PanelAxis::Measures, 2, "Revenue"),
    ])
}

pub fn columns_query(measures: usize) -> PivotQuery {
    let mut panels = vec![
        Panel::new(PanelAxis::Rows, 0, "Region"),
        Panel::new(PanelAxis::Columns, 1, "Year"),
        Panel::new(PanelAxis::Columns, 2, "Quarter"),
    ];
    for n in 0..measures {
        panels.push(Panel::new(PanelAxis::Measures, 3 + n, format!("Measure {n}")));
    }
    PivotQuery::new(panels)
}

pub fn values(tree: &Tree, ids: &[NodeId]) -> Vec<String> {
    ids.iter()
        .map(|&id| tree.value(id).unwrap_or_default().to_string())
        .collect()
}

pub fn leaf_values(tree: &Tree, ids: &[NodeId]) -> Vec<String> {
    values(tree, &tree.leaves(ids))
}
