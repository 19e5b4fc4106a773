//! sketch2canvas turns the text response a generative collaborator produced
//! for a hand-drawn prompt-workflow sketch into a JSON Canvas document,
//! ready for an Obsidian workflow plugin.
//!
//! The pipeline: extract the payload from the annotated response, parse and
//! validate it into a typed [`canvas::Canvas`], optionally detach and expand
//! metaprompt instruction nodes, rewrite placeholder variables, optionally
//! normalize into Cannoli's role-colored form, and persist a snapshot after
//! every mutation while streaming [`pipeline::StatusUpdate`] events.

pub mod agent;
pub mod cannoli;
pub mod canvas;
pub mod error;
pub mod extract;
pub mod logger;
pub mod metaprompt;
pub mod parse;
pub mod pipeline;
pub mod variables;

pub use canvas::{Canvas, Edge, Node, NodeColor, NodeType, Side};
pub use error::{CanvasError, PatternError, SchemaViolation};
pub use pipeline::{Mode, Pipeline, PipelineConfig, Status, StatusUpdate};
