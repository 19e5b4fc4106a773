use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CanvasError;

/// The node-and-edge document representing a prompt workflow diagram,
/// serialized in the JSON Canvas format Obsidian plugins consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// A positioned shape with optional text and color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<NodeColor>,
}

/// A directed, side-anchored connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    #[serde(rename = "fromNode")]
    pub from_node: String,
    #[serde(rename = "fromSide")]
    pub from_side: Side,
    #[serde(rename = "toNode")]
    pub to_node: String,
    #[serde(rename = "toSide")]
    pub to_side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Text,
    Group,
    File,
    Link,
}

impl NodeType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(NodeType::Text),
            "group" => Some(NodeType::Group),
            "file" => Some(NodeType::File),
            "link" => Some(NodeType::Link),
            _ => None,
        }
    }
}

/// The six palette colors JSON Canvas encodes as digit strings. Absent
/// means the theme default (black/gray).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeColor {
    #[serde(rename = "1")]
    Red,
    #[serde(rename = "2")]
    Orange,
    #[serde(rename = "3")]
    Yellow,
    #[serde(rename = "4")]
    Green,
    #[serde(rename = "5")]
    Blue,
    #[serde(rename = "6")]
    Purple,
}

impl NodeColor {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "1" => Some(NodeColor::Red),
            "2" => Some(NodeColor::Orange),
            "3" => Some(NodeColor::Yellow),
            "4" => Some(NodeColor::Green),
            "5" => Some(NodeColor::Blue),
            "6" => Some(NodeColor::Purple),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "top" => Some(Side::Top),
            "bottom" => Some(Side::Bottom),
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }
}

impl Canvas {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Root = no incoming edge, leaf = no outgoing edge. Both sets are
    /// seeded with every node id and pruned in one edge scan, so the cost
    /// is linear in nodes + edges. Dangling edge endpoints simply remove
    /// nothing.
    pub fn roots_and_leaves(&self) -> (HashSet<String>, HashSet<String>) {
        let mut roots: HashSet<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let mut leaves = roots.clone();
        for edge in &self.edges {
            roots.remove(&edge.to_node);
            leaves.remove(&edge.from_node);
        }
        (roots, leaves)
    }
}

/// Durably write a canvas snapshot, fully overwriting the destination.
/// Called after every pipeline mutation so earlier checkpoints stay
/// observable if a later stage aborts.
pub fn save_canvas(canvas: &Canvas, path: &Path) -> Result<(), CanvasError> {
    let json = serde_json::to_string_pretty(canvas)
        .map_err(|e| CanvasError::PersistenceFailure(format!("serialize: {}", e)))?;
    fs::write(path, json)
        .map_err(|e| CanvasError::PersistenceFailure(format!("write {}: {}", path.display(), e)))
}
