//! Parses an extracted payload into a validated [`Canvas`].
//!
//! Validation is type/presence only and deliberately names the offending
//! element: responses come from a generative source, and "invalid node at
//! index 3: missing `width`" is the difference between a fixable prompt and
//! a shrug. Edge endpoints are not checked for referential integrity;
//! dangling references are tolerated downstream.

use serde_json::Value;

use crate::canvas::{Canvas, Edge, Node, NodeColor, NodeType, Side};
use crate::error::{CanvasError, SchemaViolation};

/// Parse and validate a canvas document. Invalid JSON is
/// [`CanvasError::MalformedPayload`]; structural problems are
/// [`CanvasError::SchemaViolation`] pinpointing index and field.
pub fn parse_canvas(payload: &str) -> Result<Canvas, CanvasError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| CanvasError::MalformedPayload(e.to_string()))?;

    let obj = value.as_object().ok_or(SchemaViolation::Shape)?;
    let raw_nodes = obj
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(SchemaViolation::Shape)?;
    let raw_edges = obj
        .get("edges")
        .and_then(Value::as_array)
        .ok_or(SchemaViolation::Shape)?;

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for (index, raw) in raw_nodes.iter().enumerate() {
        nodes.push(parse_node(raw, index)?);
    }

    let mut edges = Vec::with_capacity(raw_edges.len());
    for (index, raw) in raw_edges.iter().enumerate() {
        edges.push(parse_edge(raw, index)?);
    }

    Ok(Canvas { nodes, edges })
}

fn parse_node(raw: &Value, index: usize) -> Result<Node, CanvasError> {
    let fail = |field| SchemaViolation::Node { index, field };

    let id = str_field(raw, "id").ok_or(fail("id"))?;
    let kind = str_field(raw, "type")
        .and_then(NodeType::from_tag)
        .ok_or(fail("type"))?;
    let x = int_field(raw, "x").ok_or(fail("x"))?;
    let y = int_field(raw, "y").ok_or(fail("y"))?;
    let width = int_field(raw, "width").ok_or(fail("width"))?;
    let height = int_field(raw, "height").ok_or(fail("height"))?;

    // `color` is optional but comes from a closed palette when present.
    let color = match raw.get("color") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_str()
                .and_then(NodeColor::from_tag)
                .ok_or(fail("color"))?,
        ),
    };

    let text = str_field(raw, "text").map(str::to_string);

    Ok(Node { id: id.to_string(), kind, text, x, y, width, height, color })
}

fn parse_edge(raw: &Value, index: usize) -> Result<Edge, CanvasError> {
    let fail = |field| SchemaViolation::Edge { index, field };

    let id = str_field(raw, "id").ok_or(fail("id"))?;
    let from_node = str_field(raw, "fromNode").ok_or(fail("fromNode"))?;
    let from_side = str_field(raw, "fromSide")
        .and_then(Side::from_tag)
        .ok_or(fail("fromSide"))?;
    let to_node = str_field(raw, "toNode").ok_or(fail("toNode"))?;
    let to_side = str_field(raw, "toSide")
        .and_then(Side::from_tag)
        .ok_or(fail("toSide"))?;
    let label = str_field(raw, "label").map(str::to_string);

    Ok(Edge {
        id: id.to_string(),
        from_node: from_node.to_string(),
        from_side,
        to_node: to_node.to_string(),
        to_side,
        label,
    })
}

fn str_field<'a>(raw: &'a Value, field: &str) -> Option<&'a str> {
    raw.get(field).and_then(Value::as_str)
}

// Integer-valued only: `"5"` and `5.5` both fail the field, matching the
// no-implicit-coercion contract.
fn int_field(raw: &Value, field: &str) -> Option<i64> {
    raw.get(field).and_then(Value::as_i64)
}
