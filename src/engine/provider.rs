//! Provider seam.
//!
//! The service treats the language model as a black box that takes a prompt
//! plus a response schema and hands back a JSON string. Production traffic goes
//! through [`super::gemini::GeminiProvider`]; tests plug in scripted providers.

use async_trait::async_trait;
use serde_json::Value;

/// One structured-output request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub prompt: String,
    /// JSON-Schema-like description of the expected response.
    pub schema: Value,
}

/// Raw failures reported by a provider, before classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("credential rejected (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed provider envelope: {0}")]
    MalformedEnvelope(String),
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run one request and return the model's JSON text, undecoded.
    async fn generate_json(&self, request: &ProviderRequest) -> Result<String, ProviderError>;
}
