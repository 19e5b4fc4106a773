//! The conversion pipeline: one raw collaborator response in, a persisted
//! JSON Canvas out, with an ordered stream of checkpoint events along the
//! way.
//!
//! Strictly sequential, no internal parallelism, no cancellation and no
//! internal retries. Each invocation owns its own `Canvas` values; the
//! only shared resource is the output path, which concurrent invocations
//! race on unguarded (last writer wins).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::agent::Generator;
use crate::canvas::{Canvas, save_canvas};
use crate::cannoli::to_cannoli;
use crate::error::CanvasError;
use crate::extract::{CANVAS_TAGS, Delimiters, PROMPT_TAGS, extract_payload};
use crate::metaprompt::{expansion_prompt, extract_metaprompts};
use crate::parse::parse_canvas;
use crate::variables::{VariablePattern, extract_variables};

/// One progress notification, emitted synchronously after each durable
/// write (plus `running` markers before long stages). The field names and
/// emission order are the external contract — existing consumers parse
/// them as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub message: String,
    pub status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Running,
    Success,
    Error,
}

/// Which normalizer runs at the end; the data model is the same either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Default,
    /// Normalize into the role-colored form the Cannoli plugin expects.
    Cannoli,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub mode: Mode,
    /// Enables metaprompt detachment and expansion.
    pub metaprompts: bool,
    pub pattern: VariablePattern,
    /// How the initial payload is wrapped in the collaborator's response.
    pub delimiters: Delimiters,
    /// Destination of every checkpoint write, fully overwritten each time.
    pub output: PathBuf,
}

pub struct Pipeline<'a> {
    config: PipelineConfig,
    generator: &'a dyn Generator,
    events: mpsc::Sender<StatusUpdate>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: PipelineConfig,
        generator: &'a dyn Generator,
        events: mpsc::Sender<StatusUpdate>,
    ) -> Self {
        Self { config, generator, events }
    }

    /// Run the full conversion. On failure a single terminal `error` event
    /// is emitted and whatever was last durably persisted remains the
    /// visible output.
    pub async fn run(&self, raw: &str) -> Result<Canvas, CanvasError> {
        match self.convert(raw).await {
            Ok(canvas) => Ok(canvas),
            Err(err) => {
                warn!("pipeline aborted: {}", err);
                self.emit(format!("Error: {}", err), Status::Error).await;
                Err(err)
            }
        }
    }

    async fn convert(&self, raw: &str) -> Result<Canvas, CanvasError> {
        self.emit("Processing response...", Status::Running).await;

        let payload = extract_payload(raw, self.config.delimiters);
        let mut canvas = parse_canvas(payload)?;
        info!(nodes = canvas.nodes.len(), edges = canvas.edges.len(), "canvas parsed");
        self.checkpoint(&canvas, "Canvas parsed").await?;

        if self.config.metaprompts {
            self.emit("Extracting metaprompts...", Status::Running).await;
            let (tasks, pruned) = extract_metaprompts(&canvas);
            canvas = pruned;
            self.checkpoint(&canvas, "Metaprompts extracted").await?;

            for (target, task) in &tasks {
                self.emit(format!("Expanding prompt for node {}...", target), Status::Running)
                    .await;
                let response = self.generator.generate(&expansion_prompt(task)).await?;
                let text = extract_payload(&response, PROMPT_TAGS).trim().to_string();
                if let Some(node) = canvas.node_mut(target) {
                    node.text = Some(text);
                }
                self.checkpoint(&canvas, &format!("Prompt expanded for node {}", target))
                    .await?;
            }
        }

        self.emit("Extracting variables...", Status::Running).await;
        let (variables, rewritten) = extract_variables(&canvas, &self.config.pattern);
        canvas = rewritten;
        self.checkpoint(&canvas, "Variables extracted").await?;

        if !variables.is_empty() {
            self.emit("Placing variable nodes...", Status::Running).await;
            let prompt = placement_prompt(&canvas, &variables)?;
            let response = self.generator.generate(&prompt).await?;
            canvas = parse_canvas(extract_payload(&response, CANVAS_TAGS))?;
            self.checkpoint(&canvas, "Variable nodes placed").await?;
        }

        if self.config.mode == Mode::Cannoli {
            self.emit("Converting to Cannoli format...", Status::Running).await;
            canvas = to_cannoli(canvas, self.config.metaprompts);
            self.checkpoint(&canvas, "Canvas converted to Cannoli format").await?;
        }

        self.emit("Saving canvas...", Status::Running).await;
        self.checkpoint(&canvas, "Canvas saved successfully").await?;
        Ok(canvas)
    }

    /// Persist a snapshot and emit exactly one success event for the write.
    async fn checkpoint(&self, canvas: &Canvas, message: &str) -> Result<(), CanvasError> {
        save_canvas(canvas, &self.config.output)?;
        self.emit(message, Status::Success).await;
        Ok(())
    }

    async fn emit(&self, message: impl Into<String>, status: Status) {
        // a dropped receiver just means nobody is watching the progress
        let _ = self
            .events
            .send(StatusUpdate { message: message.into(), status })
            .await;
    }
}

/// Prompt for the pass that places variable nodes on the canvas. Derived
/// from the sketch-conversion system prompts: every parameter becomes a
/// purple empty node connected to the node using it.
fn placement_prompt(
    canvas: &Canvas,
    variables: &BTreeMap<String, BTreeSet<String>>,
) -> Result<String, CanvasError> {
    let json = serde_json::to_string_pretty(canvas)
        .map_err(|e| CanvasError::UpstreamFailure(format!("encode canvas for generator: {}", e)))?;

    let mut parameters = String::new();
    for (node_id, names) in variables {
        for name in names {
            let _ = writeln!(parameters, "Variable \"{}\" connects to node \"{}\"", name, node_id);
        }
    }

    Ok(format!(
        "You are an AI engineer working on a prompt workflow.\n\
         You have been tasked with updating a JSON Canvas diagram that shows the flow of prompts.\n\
         To add a parameter, add a new empty text node with color \"6\" and an edge labelled with \
         the parameter name connecting it to the node where the parameter is used.\n\
         Make sure new nodes do not overlap existing nodes. Keep every existing node and edge.\n\n\
         Add the following parameters to the JSON Canvas diagram:\n\n\
         <parameters>\n{parameters}</parameters>\n\n\
         <canvas>\n{json}\n</canvas>\n\n\
         Only output the updated JSON Canvas, wrapped in <canvas></canvas> tags."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase_with_contract_field_names() {
        let update = StatusUpdate {
            message: "Saving canvas...".to_string(),
            status: Status::Running,
        };
        let v = serde_json::to_value(&update).unwrap();
        assert_eq!(v, serde_json::json!({"message": "Saving canvas...", "status": "running"}));
    }

    #[test]
    fn placement_prompt_lists_each_variable_with_its_node() {
        let canvas = Canvas { nodes: vec![], edges: vec![] };
        let vars = BTreeMap::from([(
            "n1".to_string(),
            BTreeSet::from(["country".to_string(), "city".to_string()]),
        )]);
        let prompt = placement_prompt(&canvas, &vars).unwrap();
        assert!(prompt.contains("Variable \"country\" connects to node \"n1\""));
        assert!(prompt.contains("Variable \"city\" connects to node \"n1\""));
        assert!(prompt.contains("<canvas>"));
    }
}
