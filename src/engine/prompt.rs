//! Prompt and response-schema construction for the two provider calls.

use super::provider::ProviderRequest;
use serde_json::{json, Value};

/// Lowest card count the provider is asked to propose.
pub const MIN_CARDS: i64 = 4;
/// Highest card count the provider is asked to propose.
pub const MAX_CARDS: i64 = 10;

pub(crate) fn range_request(text: &str) -> ProviderRequest {
    let prompt = format!(
        "Analyze the following text and determine a reasonable minimum and maximum number of \
flash cards that can be generated from it. The minimum should be at least {MIN_CARDS}, and the \
maximum should not exceed {MAX_CARDS}. Focus on extracting distinct, important concepts.

Text:
---
{text}
---

Provide your answer as a JSON object with 'min' and 'max' keys."
    );

    ProviderRequest {
        prompt,
        schema: range_schema(),
    }
}

pub(crate) fn cards_request(text: &str, count: u32) -> ProviderRequest {
    let prompt = format!(
        "Based on the following text, generate exactly {count} flash cards. Each flash card \
should have a clear 'question' and a concise 'answer'. Extract the most important concepts, \
definitions, and key facts.

Text:
---
{text}
---

Generate the {count} flash cards now."
    );

    ProviderRequest {
        prompt,
        schema: cards_schema(),
    }
}

fn range_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "min": {
                "type": "INTEGER",
                "description": format!("The minimum number of flash cards (at least {MIN_CARDS})."),
            },
            "max": {
                "type": "INTEGER",
                "description": format!("The maximum number of flash cards (at most {MAX_CARDS})."),
            },
        },
        "required": ["min", "max"],
    })
}

fn cards_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "flashcards": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": {
                            "type": "STRING",
                            "description": "The question or term for the front of the flashcard.",
                        },
                        "answer": {
                            "type": "STRING",
                            "description": "The answer or definition for the back of the flashcard.",
                        },
                    },
                    "required": ["question", "answer"],
                },
            },
        },
        "required": ["flashcards"],
    })
}
