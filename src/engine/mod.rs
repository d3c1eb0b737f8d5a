mod decode;
mod gemini;
mod prompt;
mod provider;

pub use gemini::GeminiProvider;
pub use prompt::{MAX_CARDS, MIN_CARDS};
pub use provider::{ProviderError, TextProvider};

use crate::error::GenerationError;
use crate::model::{CardCountRange, FlashCard, GeneratorConfig};
use anyhow::Result;
use std::sync::Arc;

/// Stateless facade over the text provider.
///
/// Holds no per-request state, so one instance can back any number of
/// workflows. A service built without a credential has no provider and fails
/// every call with [`GenerationError::NotConfigured`].
#[derive(Clone)]
pub struct CardGenerationService {
    provider: Option<Arc<dyn TextProvider>>,
}

impl CardGenerationService {
    pub fn from_config(cfg: &GeneratorConfig) -> Result<Self> {
        match cfg.credential() {
            Some(key) => Ok(Self::with_provider(Arc::new(GeminiProvider::new(cfg, key)?))),
            None => {
                log::warn!("no API key configured; card generation is disabled");
                Ok(Self { provider: None })
            }
        }
    }

    pub fn with_provider(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&dyn TextProvider, GenerationError> {
        self.provider
            .as_deref()
            .ok_or(GenerationError::NotConfigured)
    }

    /// Ask the provider how many cards `text` supports. The range is returned unclamped.
    pub async fn estimate_range(&self, text: &str) -> Result<CardCountRange, GenerationError> {
        let provider = self.provider()?;
        let raw = provider
            .generate_json(&prompt::range_request(text))
            .await
            .map_err(|e| {
                log::warn!("{}: range estimation failed: {e}", provider.name());
                GenerationError::from(e)
            })?;

        let range = decode::parse_range(&raw).inspect_err(|e| {
            log::warn!("{}: range response rejected: {e:?}", provider.name());
        })?;
        log::debug!("{}: proposed range {}..={}", provider.name(), range.min, range.max);
        Ok(range)
    }

    /// Generate `count` cards from `text` in a single attempt.
    ///
    /// The provider may return more or fewer cards than asked for; the list is
    /// passed through unchanged.
    pub async fn generate_cards(
        &self,
        text: &str,
        count: u32,
    ) -> Result<Vec<FlashCard>, GenerationError> {
        let provider = self.provider()?;
        let raw = provider
            .generate_json(&prompt::cards_request(text, count))
            .await
            .map_err(|e| {
                log::warn!("{}: card generation failed: {e}", provider.name());
                GenerationError::from(e)
            })?;

        let cards = decode::parse_cards(&raw).inspect_err(|e| {
            log::warn!("{}: card response rejected: {e:?}", provider.name());
        })?;
        if cards.len() != count as usize {
            log::warn!(
                "{}: asked for {count} cards, received {}",
                provider.name(),
                cards.len()
            );
        }
        Ok(cards)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider shared by service and workflow tests.

    use super::provider::{ProviderError, ProviderRequest, TextProvider};
    use crate::model::WorkflowSnapshot;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::watch;

    #[derive(Default)]
    pub(crate) struct FakeProvider {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        requests: Mutex<Vec<ProviderRequest>>,
        delay: Option<Duration>,
        observer: Mutex<Option<watch::Receiver<WorkflowSnapshot>>>,
        seen: Mutex<Vec<WorkflowSnapshot>>,
    }

    impl FakeProvider {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Hold every reply back for `delay` before answering.
        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Record the published snapshot each time a call arrives.
        pub(crate) fn observe(&self, rx: watch::Receiver<WorkflowSnapshot>) {
            *self.observer.lock().unwrap() = Some(rx);
        }

        /// Snapshots that were current while each call was in flight.
        pub(crate) fn seen(&self) -> Vec<WorkflowSnapshot> {
            self.seen.lock().unwrap().clone()
        }

        pub(crate) fn reply(self, body: &str) -> Self {
            self.push(Ok(body.to_string()))
        }

        pub(crate) fn fail(self, err: ProviderError) -> Self {
            self.push(Err(err))
        }

        fn push(self, reply: Result<String, ProviderError>) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub(crate) fn request(&self, idx: usize) -> ProviderRequest {
            self.requests.lock().unwrap()[idx].clone()
        }
    }

    #[async_trait]
    impl TextProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn generate_json(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
            self.requests.lock().unwrap().push(request.clone());
            let current = self
                .observer
                .lock()
                .unwrap()
                .as_ref()
                .map(|rx| rx.borrow().clone());
            if let Some(snap) = current {
                self.seen.lock().unwrap().push(snap);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Transport("no scripted reply".into())))
        }
    }

    /// Build a `{"flashcards": [...]}` body with `n` numbered cards.
    pub(crate) fn cards_body(n: usize) -> String {
        let cards: Vec<serde_json::Value> = (1..=n)
            .map(|i| serde_json::json!({"question": format!("Q{i}"), "answer": format!("A{i}")}))
            .collect();
        serde_json::json!({ "flashcards": cards }).to_string()
    }
}
