//! Analyze → choose count → generate → review state machine.
//!
//! Every operation builds the next snapshot off to the side and commits it in
//! one step, so observers only ever see whole snapshots: at most a busy one
//! while the provider call is pending and then the settled one.

use crate::engine::{CardGenerationService, MAX_CARDS, MIN_CARDS};
use crate::error::GenerationError;
use crate::model::{CardCountRange, ProcessState, WorkflowSnapshot};
use tokio::sync::watch;

pub struct GenerationWorkflow {
    service: CardGenerationService,
    snapshot: WorkflowSnapshot,
    publisher: watch::Sender<WorkflowSnapshot>,
}

impl GenerationWorkflow {
    pub fn new(service: CardGenerationService) -> Self {
        let (publisher, _) = watch::channel(WorkflowSnapshot::default());
        Self {
            service,
            snapshot: WorkflowSnapshot::default(),
            publisher,
        }
    }

    pub fn snapshot(&self) -> &WorkflowSnapshot {
        &self.snapshot
    }

    /// Observe every committed snapshot from now on.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.publisher.subscribe()
    }

    fn commit(&mut self, next: WorkflowSnapshot) {
        log::trace!("workflow: {:?} -> {:?}", self.snapshot.state, next.state);
        self.snapshot = next;
        self.publisher.send_replace(self.snapshot.clone());
    }

    /// Record a failure that leaves the state untouched.
    fn reject(&mut self, err: GenerationError) -> Result<(), GenerationError> {
        let mut next = self.snapshot.clone();
        next.error_message = Some(err.to_string());
        self.commit(next);
        Err(err)
    }

    /// Replace the draft text. Only allowed while editing.
    pub fn set_input_text(&mut self, text: &str) -> Result<(), GenerationError> {
        if self.snapshot.state != ProcessState::Idle {
            return self.reject(GenerationError::validation(
                "Go back to editing before changing the text.",
            ));
        }
        let mut next = self.snapshot.clone();
        next.input_text = text.to_string();
        next.error_message = None;
        self.commit(next);
        Ok(())
    }

    pub async fn analyze(&mut self, text: &str) -> Result<(), GenerationError> {
        self.snapshot.input_text = text.to_string();
        if text.trim().is_empty() {
            return self.reject(GenerationError::validation(
                "Please enter some text to analyze.",
            ));
        }

        self.commit(WorkflowSnapshot {
            state: ProcessState::Analyzing,
            input_text: text.to_string(),
            ..WorkflowSnapshot::default()
        });

        let outcome = match self.service.estimate_range(text).await {
            Ok(range) => count_options(range),
            Err(e) => Err(e),
        };

        let mut next = self.snapshot.clone();
        match outcome {
            Ok(options) => {
                next.state = ProcessState::ChoosingCount;
                next.count_options = options;
                self.commit(next);
                Ok(())
            }
            Err(e) => {
                next.state = ProcessState::Idle;
                next.error_message = Some(e.to_string());
                self.commit(next);
                Err(e)
            }
        }
    }

    pub async fn generate(&mut self, count: u32) -> Result<(), GenerationError> {
        if self.snapshot.state == ProcessState::ShowingResults
            && self.snapshot.selected_count == Some(count)
        {
            return Ok(());
        }
        if !self.snapshot.count_options.contains(&count) {
            let msg = if self.snapshot.count_options.is_empty() {
                "Analyze the text before choosing a number of cards.".to_string()
            } else {
                format!(
                    "Choose one of the offered card counts: {}.",
                    join_counts(&self.snapshot.count_options)
                )
            };
            return self.reject(GenerationError::validation(msg));
        }

        let mut busy = self.snapshot.clone();
        busy.state = ProcessState::Generating;
        busy.error_message = None;
        busy.cards.clear();
        busy.flipped_index = None;
        busy.selected_count = Some(count);
        self.commit(busy);

        let result = self
            .service
            .generate_cards(&self.snapshot.input_text, count)
            .await;

        let mut next = self.snapshot.clone();
        match result {
            Ok(cards) => {
                next.state = ProcessState::ShowingResults;
                next.cards = cards;
                self.commit(next);
                Ok(())
            }
            Err(e) => {
                next.state = ProcessState::ChoosingCount;
                next.selected_count = None;
                next.error_message = Some(e.to_string());
                self.commit(next);
                Err(e)
            }
        }
    }

    /// Toggle which card shows its answer. At most one card is flipped.
    pub fn flip_card(&mut self, index: usize) {
        if self.snapshot.state != ProcessState::ShowingResults || index >= self.snapshot.cards.len()
        {
            return;
        }
        let mut next = self.snapshot.clone();
        next.flipped_index = if next.flipped_index == Some(index) {
            None
        } else {
            Some(index)
        };
        self.commit(next);
    }

    /// Return to editing, keeping the draft text.
    pub fn back_to_edit(&mut self) {
        let input_text = std::mem::take(&mut self.snapshot.input_text);
        self.commit(WorkflowSnapshot {
            input_text,
            ..WorkflowSnapshot::default()
        });
    }

    /// Settle a provider call that was abandoned mid-flight.
    ///
    /// Takes the same failure edge the call would have taken, so the session
    /// never ends in a busy state. Does nothing when no call is pending.
    pub fn interrupt(&mut self) {
        let mut next = self.snapshot.clone();
        match next.state {
            ProcessState::Analyzing => next.state = ProcessState::Idle,
            ProcessState::Generating => {
                next.state = ProcessState::ChoosingCount;
                next.selected_count = None;
            }
            _ => return,
        }
        next.error_message = Some("Interrupted before the generation service answered.".into());
        self.commit(next);
    }

    pub fn reset(&mut self) {
        self.commit(WorkflowSnapshot::default());
    }
}

/// Clamp the proposed range to `[MIN_CARDS, MAX_CARDS]` and keep the even counts.
///
/// When the clamped range holds no even number the lower bound is offered on
/// its own, so a valid range always yields at least one option.
pub(crate) fn count_options(range: CardCountRange) -> Result<Vec<u32>, GenerationError> {
    let lo = range.min.max(MIN_CARDS);
    let hi = range.max.min(MAX_CARDS);
    if lo > hi {
        return Err(GenerationError::Range);
    }

    // lo >= MIN_CARDS > 0 and hi <= MAX_CARDS, so every value fits in u32.
    let evens: Vec<u32> = (lo..=hi).filter(|n| n % 2 == 0).map(|n| n as u32).collect();
    if evens.is_empty() {
        Ok(vec![lo as u32])
    } else {
        Ok(evens)
    }
}

pub(crate) fn join_counts(counts: &[u32]) -> String {
    counts
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
