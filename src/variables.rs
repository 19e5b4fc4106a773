//! Rewrites placeholder occurrences in node text into the `{{name}}`
//! substitution syntax the workflow plugin understands, and reports which
//! variable names were discovered on which node so a follow-up generation
//! pass can place variable nodes on the canvas.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::canvas::Canvas;
use crate::error::PatternError;

/// The token in a placeholder template that stands for the variable name.
const MARKER: &str = "VAR";

/// The sketch convention: `$country`, `$topic`, ...
pub const DEFAULT_PATTERN: &str = "$VAR";

/// A compiled placeholder matcher. Built from a short template containing
/// exactly one `VAR` marker; everything else is matched literally.
#[derive(Debug, Clone)]
pub struct VariablePattern {
    regex: Regex,
}

impl VariablePattern {
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let Some(pos) = template.find(MARKER) else {
            return Err(PatternError::MissingMarker(template.to_string()));
        };
        let (before, after) = (&template[..pos], &template[pos + MARKER.len()..]);
        if after.contains(MARKER) {
            return Err(PatternError::DuplicateMarker(template.to_string()));
        }
        let regex = Regex::new(&format!(
            r"{}(\w+){}",
            regex::escape(before),
            regex::escape(after)
        ))?;
        Ok(Self { regex })
    }
}

impl Default for VariablePattern {
    fn default() -> Self {
        Self::compile(DEFAULT_PATTERN).expect("default placeholder template compiles")
    }
}

/// Rewrites every pattern occurrence in node text to `{{name}}` on a deep
/// copy of the canvas and aggregates the lower-cased names per node. The
/// caller's canvas and any previously persisted checkpoint are untouched.
/// No matches yields an empty map and a content-equal canvas.
pub fn extract_variables(
    canvas: &Canvas,
    pattern: &VariablePattern,
) -> (BTreeMap<String, BTreeSet<String>>, Canvas) {
    let mut out = canvas.clone();
    let mut found: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for node in &mut out.nodes {
        let Some(text) = &node.text else { continue };
        let mut names = BTreeSet::new();
        let rewritten = pattern.regex.replace_all(text, |caps: &regex::Captures| {
            // matching runs against the raw text, but names are recorded
            // in canonical lower case
            let name = caps[1].to_lowercase();
            let substitution = format!("{{{{{}}}}}", name);
            names.insert(name);
            substitution
        });
        if !names.is_empty() {
            node.text = Some(rewritten.into_owned());
            found.insert(node.id.clone(), names);
        }
    }

    (found, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Node, NodeType};

    fn text_node(id: &str, text: &str) -> Node {
        Node {
            id: id.to_string(),
            kind: NodeType::Text,
            text: Some(text.to_string()),
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            color: None,
        }
    }

    fn canvas_with(nodes: Vec<Node>) -> Canvas {
        Canvas { nodes, edges: vec![] }
    }

    #[test]
    fn rewrites_dollar_placeholder_to_double_braces() {
        let canvas = canvas_with(vec![text_node("n1", "$country")]);
        let pattern = VariablePattern::compile("$VAR").unwrap();
        let (vars, rewritten) = extract_variables(&canvas, &pattern);

        assert_eq!(rewritten.nodes[0].text.as_deref(), Some("{{country}}"));
        assert_eq!(vars.len(), 1);
        assert_eq!(vars["n1"], BTreeSet::from(["country".to_string()]));
    }

    #[test]
    fn no_matches_yields_empty_map_and_equal_canvas() {
        let canvas = canvas_with(vec![text_node("n1", "no placeholders here")]);
        let (vars, rewritten) = extract_variables(&canvas, &VariablePattern::default());
        assert!(vars.is_empty());
        assert_eq!(rewritten, canvas);
    }

    #[test]
    fn caller_canvas_is_not_mutated() {
        let canvas = canvas_with(vec![text_node("n1", "$topic")]);
        let before = canvas.clone();
        let _ = extract_variables(&canvas, &VariablePattern::default());
        assert_eq!(canvas, before);
    }

    #[test]
    fn names_are_lowercased_and_deduplicated_per_node() {
        let canvas = canvas_with(vec![text_node("n1", "Compare $Country with $country and $city")]);
        let (vars, rewritten) = extract_variables(&canvas, &VariablePattern::default());

        assert_eq!(
            rewritten.nodes[0].text.as_deref(),
            Some("Compare {{country}} with {{country}} and {{city}}")
        );
        assert_eq!(
            vars["n1"],
            BTreeSet::from(["country".to_string(), "city".to_string()])
        );
    }

    #[test]
    fn same_name_recurs_across_nodes_independently() {
        let canvas = canvas_with(vec![
            text_node("n1", "$lang question"),
            text_node("n2", "$lang answer"),
        ]);
        let (vars, _) = extract_variables(&canvas, &VariablePattern::default());
        assert_eq!(vars["n1"], BTreeSet::from(["lang".to_string()]));
        assert_eq!(vars["n2"], BTreeSet::from(["lang".to_string()]));
    }

    #[test]
    fn surrounding_template_text_is_matched_literally() {
        let canvas = canvas_with(vec![text_node("n1", "ask about <<name>> please")]);
        let pattern = VariablePattern::compile("<<VAR>>").unwrap();
        let (vars, rewritten) = extract_variables(&canvas, &pattern);
        assert_eq!(rewritten.nodes[0].text.as_deref(), Some("ask about {{name}} please"));
        assert_eq!(vars["n1"], BTreeSet::from(["name".to_string()]));
    }

    #[test]
    fn template_without_marker_is_rejected() {
        assert!(matches!(
            VariablePattern::compile("$var"),
            Err(PatternError::MissingMarker(_))
        ));
    }

    #[test]
    fn template_with_two_markers_is_rejected() {
        assert!(matches!(
            VariablePattern::compile("VAR..VAR"),
            Err(PatternError::DuplicateMarker(_))
        ));
    }
}
