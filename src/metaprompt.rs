//! Detaches "metaprompt" instruction nodes from the canvas.
//!
//! A sketch author attaches a short task description to a prompt node by
//! drawing a green node with the task text and an arrow to the target. The
//! extractor removes those sentinel nodes and their outgoing edges, leaving
//! a task per target node for a secondary generation pass to expand into
//! full instructions.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::canvas::{Canvas, NodeColor};

/// Green marks an instruction node.
pub const METAPROMPT_COLOR: NodeColor = NodeColor::Green;

/// Returns the task map (target node id → task text) and a pruned copy of
/// the canvas. The caller's canvas is untouched.
///
/// Edges are scanned in order: when two instruction edges target the same
/// node the later one wins, while the map keeps first-discovery order.
/// Every sentinel-colored node is dropped from the output whether or not a
/// task was recorded for anything, so re-running on the pruned canvas is a
/// no-op with an empty task map.
pub fn extract_metaprompts(canvas: &Canvas) -> (IndexMap<String, String>, Canvas) {
    let mut out = canvas.clone();

    let sentinels: HashSet<&str> = canvas
        .nodes
        .iter()
        .filter(|n| n.color == Some(METAPROMPT_COLOR))
        .map(|n| n.id.as_str())
        .collect();

    let mut tasks = IndexMap::new();
    for edge in &canvas.edges {
        if sentinels.contains(edge.from_node.as_str()) {
            let task = canvas
                .node(&edge.from_node)
                .and_then(|n| n.text.clone())
                .unwrap_or_default();
            tasks.insert(edge.to_node.clone(), task);
        }
    }

    out.edges.retain(|e| !sentinels.contains(e.from_node.as_str()));
    out.nodes.retain(|n| n.color != Some(METAPROMPT_COLOR));

    (tasks, out)
}

/// Prompt for the secondary pass that turns a task into full instructions.
/// The response is extracted with the `<prompt>` tag pair, so the prompt
/// spells that convention out.
pub fn expansion_prompt(task: &str) -> String {
    format!(
        "You are a prompt engineer working on a prompt workflow.\n\
         Expand the following task description into a complete, self-contained \
         prompt for a language model. Keep the intent of the task; add the \
         structure and context a model needs to do it well.\n\n\
         <task>\n{task}\n</task>\n\n\
         Only output the finished prompt, wrapped in <prompt></prompt> tags."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Edge, Node, NodeType, Side};

    fn node(id: &str, text: Option<&str>, color: Option<NodeColor>) -> Node {
        Node {
            id: id.to_string(),
            kind: NodeType::Text,
            text: text.map(str::to_string),
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            color,
        }
    }

    fn edge(id: &str, from: &str, to: &str) -> Edge {
        Edge {
            id: id.to_string(),
            from_node: from.to_string(),
            from_side: Side::Bottom,
            to_node: to.to_string(),
            to_side: Side::Top,
            label: None,
        }
    }

    #[test]
    fn green_node_becomes_task_and_is_removed() {
        let canvas = Canvas {
            nodes: vec![
                node("m1", Some("Write a haiku"), Some(NodeColor::Green)),
                node("n2", Some("placeholder"), None),
            ],
            edges: vec![edge("e1", "m1", "n2")],
        };

        let (tasks, pruned) = extract_metaprompts(&canvas);

        assert_eq!(tasks.get("n2").map(String::as_str), Some("Write a haiku"));
        assert_eq!(pruned.nodes.len(), 1);
        assert_eq!(pruned.nodes[0].id, "n2");
        assert!(pruned.edges.is_empty());
    }

    #[test]
    fn extraction_is_idempotent_on_its_own_output() {
        let canvas = Canvas {
            nodes: vec![
                node("m1", Some("Summarize"), Some(NodeColor::Green)),
                node("n2", None, None),
            ],
            edges: vec![edge("e1", "m1", "n2")],
        };

        let (_, pruned) = extract_metaprompts(&canvas);
        let (tasks, again) = extract_metaprompts(&pruned);
        assert!(tasks.is_empty());
        assert_eq!(again, pruned);
    }

    #[test]
    fn later_edge_to_same_target_wins_in_discovery_order() {
        let canvas = Canvas {
            nodes: vec![
                node("m1", Some("first"), Some(NodeColor::Green)),
                node("m2", Some("second"), Some(NodeColor::Green)),
                node("a", None, None),
                node("b", None, None),
            ],
            edges: vec![
                edge("e1", "m1", "a"),
                edge("e2", "m1", "b"),
                edge("e3", "m2", "a"),
            ],
        };

        let (tasks, _) = extract_metaprompts(&canvas);
        // `a` was discovered first, so it stays first, but carries m2's text
        let pairs: Vec<(&str, &str)> = tasks
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "second"), ("b", "first")]);
    }

    #[test]
    fn sentinel_without_outgoing_edge_is_still_removed() {
        let canvas = Canvas {
            nodes: vec![
                node("m1", Some("orphan instruction"), Some(NodeColor::Green)),
                node("n1", None, None),
            ],
            edges: vec![],
        };

        let (tasks, pruned) = extract_metaprompts(&canvas);
        assert!(tasks.is_empty());
        assert_eq!(pruned.nodes.len(), 1);
        assert_eq!(pruned.nodes[0].id, "n1");
    }

    #[test]
    fn textless_sentinel_records_empty_task() {
        let canvas = Canvas {
            nodes: vec![node("m1", None, Some(NodeColor::Green)), node("n1", None, None)],
            edges: vec![edge("e1", "m1", "n1")],
        };
        let (tasks, _) = extract_metaprompts(&canvas);
        assert_eq!(tasks.get("n1").map(String::as_str), Some(""));
    }

    #[test]
    fn edges_into_sentinels_survive_as_dangling() {
        let canvas = Canvas {
            nodes: vec![
                node("m1", Some("task"), Some(NodeColor::Green)),
                node("n1", None, None),
            ],
            edges: vec![edge("e1", "n1", "m1")],
        };
        let (tasks, pruned) = extract_metaprompts(&canvas);
        assert!(tasks.is_empty());
        assert_eq!(pruned.edges.len(), 1);
    }
}
