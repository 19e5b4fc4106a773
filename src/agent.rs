//! The generation collaborator seam.
//!
//! Every secondary pass (metaprompt expansion, variable placement) goes
//! through [`Generator`]; the pipeline never knows which model is behind
//! it. Calls are suspension points with unbounded latency — no timeout is
//! imposed here, and a failure aborts the whole invocation upstream.

use async_trait::async_trait;
use ollama_rs::Ollama;
use ollama_rs::generation::completion::request::GenerationRequest;
use tracing::debug;
use url::Url;

use crate::error::CanvasError;

#[async_trait]
pub trait Generator: Send + Sync {
    /// Send one prompt, get one raw text response. Errors surface as
    /// [`CanvasError::UpstreamFailure`].
    async fn generate(&self, prompt: &str) -> Result<String, CanvasError>;
}

/// `OllamaGenerator` invokes a local Ollama server via `ollama_rs`.
/// With no URL configured the client's default endpoint is used.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    model: String,
    ollama_url: Option<Url>,
}

impl OllamaGenerator {
    pub fn new(model: impl Into<String>, ollama_url: Option<Url>) -> Self {
        Self { model: model.into(), ollama_url }
    }

    fn build_client(&self) -> Ollama {
        match &self.ollama_url {
            Some(url) => match url.port() {
                Some(port) => Ollama::new(url.clone(), port),
                None => Ollama::default(),
            },
            None => Ollama::default(),
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CanvasError> {
        let client = self.build_client();
        debug!(model = %self.model, "sending generation request");
        let req = GenerationRequest::new(self.model.clone(), prompt.to_string());
        let resp = client
            .generate(req)
            .await
            .map_err(|e| CanvasError::UpstreamFailure(format!("generate error: {}", e)))?;
        Ok(resp.response)
    }
}
