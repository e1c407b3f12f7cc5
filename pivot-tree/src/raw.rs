//! FILENAME: pivot-tree/src/raw.rs
//! Raw Page Shape - Per-axis trees as delivered by the query layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::node::{TreeNode, UserType};

/// A node of a raw page tree in the server's camelCase JSON shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RawNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    #[serde(default)]
    pub is_part: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_childs: Option<usize>,

    /// Synthetic nodes the server builds itself (e.g. a rows grand total).
    #[serde(default)]
    pub user_type: UserType,
}

impl RawNode {
    pub fn new(value: impl Into<String>) -> Self {
        RawNode {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_children(mut self, children: Vec<RawNode>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn part(mut self) -> Self {
        self.is_part = true;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn children(&self) -> &[RawNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Node fields without children or pivot attributes beyond `user_type`.
    pub(crate) fn to_node(&self) -> TreeNode {
        let mut node = TreeNode {
            value: self.value.clone(),
            data: self.data.clone(),
            index: self.index,
            is_part: self.is_part,
            max_childs: self.max_childs,
            ..Default::default()
        };
        node.pivot.user_type = self.user_type;
        node
    }
}
