use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl GeneratorConfig {
    /// Credential with surrounding whitespace removed; blank values count as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// A single question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashCard {
    pub question: String,
    pub answer: String,
}

/// Card-count bounds as proposed by the provider, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCountRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessState {
    #[default]
    Idle,
    Analyzing,
    ChoosingCount,
    Generating,
    ShowingResults,
}

impl ProcessState {
    /// True while a provider call is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, ProcessState::Analyzing | ProcessState::Generating)
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessState::Idle => "Idle",
            ProcessState::Analyzing => "Analyzing",
            ProcessState::ChoosingCount => "Choosing count",
            ProcessState::Generating => "Generating",
            ProcessState::ShowingResults => "Results",
        }
    }
}

/// Everything the presentation layer may observe about the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub state: ProcessState,
    pub input_text: String,
    pub error_message: Option<String>,
    pub count_options: Vec<u32>,
    pub selected_count: Option<u32>,
    pub cards: Vec<FlashCard>,
    pub flipped_index: Option<usize>,
}

/// Generated cards written by `--export-json`, with the settings that produced them.
/// The API key never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardExport {
    pub generated_utc: String,
    pub generator: GeneratorConfig,
    pub requested_count: Option<u32>,
    pub flashcards: Vec<FlashCard>,
}
