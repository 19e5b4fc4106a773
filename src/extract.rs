//! Isolates the canvas payload from an annotated model response.
//!
//! Models wrap the JSON in a tag pair or a code fence, usually after some
//! prose and sometimes after echoing the few-shot example. We take the
//! *last* begin delimiter for that reason, and stay permissive about the
//! rest: no begin delimiter means the whole text is the payload, and a
//! missing end delimiter means the remainder of the string is.

/// A begin/end delimiter pair. Which pair applies depends on how the
/// collaborator was prompted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub begin: &'static str,
    pub end: &'static str,
}

/// Canvas payloads wrapped in an explicit tag pair.
pub const CANVAS_TAGS: Delimiters = Delimiters { begin: "<canvas>", end: "</canvas>" };

/// Expanded metaprompt text from the secondary generation pass.
pub const PROMPT_TAGS: Delimiters = Delimiters { begin: "<prompt>", end: "</prompt>" };

/// Fenced-block responses (`--fenced` mode).
pub const JSON_FENCE: Delimiters = Delimiters { begin: "```json", end: "```" };

/// Returns the trimmed substring between the delimiters, or the input
/// unchanged when no begin delimiter is present. No side effects.
pub fn extract_payload<'a>(raw: &'a str, delims: Delimiters) -> &'a str {
    let Some(pos) = raw.rfind(delims.begin) else {
        return raw;
    };
    let rest = &raw[pos + delims.begin.len()..];
    let body = match rest.find(delims.end) {
        Some(end) => &rest[..end],
        None => rest,
    };
    body.trim()
}
