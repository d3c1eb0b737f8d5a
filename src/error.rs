//! Normalized failures surfaced to the workflow.
//!
//! Every failure that can reach the presentation layer is one of these
//! variants. The `Display` text is what the user sees, so messages are written
//! for people rather than for logs.

use crate::engine::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// User input failed a precondition.
    #[error("{0}")]
    Validation(String),

    #[error("The generation service is not configured. Set GEMINI_API_KEY or pass --api-key.")]
    NotConfigured,

    #[error(
        "Could not reach the generation service ({0}). Check your network connection; \
         ad-blockers or privacy extensions can also block these requests."
    )]
    Transport(String),

    #[error("The generation service rejected the API key. Check that the key is valid and enabled.")]
    Auth,

    #[error("The generation service returned an unexpected response ({0}). Please try again.")]
    ResponseShape(String),

    #[error("The generation service returned an error (HTTP {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Could not determine a valid number of flash cards to generate. The text might be too short.")]
    Range,
}

impl GenerationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GenerationError::Validation(msg.into())
    }

    pub fn response_shape(msg: impl Into<String>) -> Self {
        GenerationError::ResponseShape(msg.into())
    }
}

impl From<ProviderError> for GenerationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Transport(detail) => GenerationError::Transport(detail),
            ProviderError::Unauthorized { .. } => GenerationError::Auth,
            ProviderError::Status { status, message } => {
                GenerationError::Provider { status, message }
            }
            ProviderError::MalformedEnvelope(detail) => GenerationError::ResponseShape(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_mentions_connectivity_and_blockers() {
        let msg = GenerationError::Transport("connection refused".into()).to_string();
        assert!(msg.contains("network connection"));
        assert!(msg.contains("ad-blockers"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn auth_and_transport_messages_differ() {
        let auth = GenerationError::from(ProviderError::Unauthorized {
            status: 403,
            message: "forbidden".into(),
        });
        assert_eq!(auth, GenerationError::Auth);
        assert_ne!(
            auth.to_string(),
            GenerationError::Transport("x".into()).to_string()
        );
    }

    #[test]
    fn provider_errors_map_onto_generation_kinds() {
        assert_eq!(
            GenerationError::from(ProviderError::Status {
                status: 500,
                message: "boom".into()
            }),
            GenerationError::Provider {
                status: 500,
                message: "boom".into()
            }
        );
        assert!(matches!(
            GenerationError::from(ProviderError::MalformedEnvelope("no candidates".into())),
            GenerationError::ResponseShape(_)
        ));
    }
}
