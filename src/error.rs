use thiserror::Error;

/// Everything that can abort a conversion pipeline. None of these are
/// retried internally; re-invocation is the caller's responsibility.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CanvasError {
    /// The extracted payload was not valid JSON at all.
    #[error("malformed canvas payload: {0}")]
    MalformedPayload(String),

    /// The payload parsed but a required field is missing or mistyped.
    #[error("schema violation: {0}")]
    SchemaViolation(#[from] SchemaViolation),

    /// The generation collaborator errored or returned an unexpected shape.
    #[error("upstream generation failed: {0}")]
    UpstreamFailure(String),

    /// A checkpoint write to the output path failed.
    #[error("failed to persist canvas: {0}")]
    PersistenceFailure(String),
}

/// Pinpoints the offending element. Responses come from a generative source
/// prone to omission, so the index and field name matter for diagnosis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("expected a top-level object with `nodes` and `edges` arrays")]
    Shape,

    #[error("invalid node at index {index}: missing or invalid `{field}`")]
    Node { index: usize, field: &'static str },

    #[error("invalid edge at index {index}: missing or invalid `{field}`")]
    Edge { index: usize, field: &'static str },
}

/// Problems compiling a caller-supplied placeholder template. Reported
/// before the pipeline starts, never from inside it.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("placeholder template `{0}` does not contain the marker `VAR`")]
    MissingMarker(String),

    #[error("placeholder template `{0}` contains more than one `VAR` marker")]
    DuplicateMarker(String),

    #[error("placeholder template compiled to an invalid expression: {0}")]
    Regex(#[from] regex::Error),
}
