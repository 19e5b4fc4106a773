//! Normalizes a canvas into the role-colored form the Cannoli workflow
//! plugin expects: chain endpoints marked with the purple "response" color,
//! `assistant` placeholder nodes blanked, intermediate nodes left with
//! whatever colors the model chose.

use crate::canvas::{Canvas, NodeColor};
use crate::metaprompt::METAPROMPT_COLOR;

/// Purple marks a response slot in Cannoli's conventions.
pub const RESPONSE_COLOR: NodeColor = NodeColor::Purple;

/// Applies the role-coloring heuristics. Consumes the canvas: this is the
/// last mutating stage and nothing downstream needs an earlier copy.
/// Idempotent — applying it twice equals applying it once.
///
/// `metaprompt_aware` exempts green instruction nodes from endpoint
/// coloring so a later metaprompt pass still recognizes them.
pub fn to_cannoli(canvas: Canvas, metaprompt_aware: bool) -> Canvas {
    let mut out = canvas;
    let (roots, leaves) = out.roots_and_leaves();

    for node in &mut out.nodes {
        let is_assistant = node
            .text
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("assistant"));

        if is_assistant {
            node.text = Some(String::new());
            node.color = Some(RESPONSE_COLOR);
        } else if (roots.contains(&node.id) || leaves.contains(&node.id))
            && !(metaprompt_aware && node.color == Some(METAPROMPT_COLOR))
        {
            node.color = Some(RESPONSE_COLOR);
        }
    }

    out
}
