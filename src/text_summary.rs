//! Text rendering of workflow snapshots for CLI output.

use crate::model::{ProcessState, WorkflowSnapshot};
use crate::orchestrator::join_counts;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Render the whole snapshot: state banner, state-specific body, then any error.
pub(crate) fn build_text_summary(snap: &WorkflowSnapshot, show_answers: bool) -> TextSummary {
    let mut lines = vec![format!("== {} ==", snap.state.label())];

    match snap.state {
        ProcessState::Idle => {
            if snap.input_text.trim().is_empty() {
                lines.push("Draft is empty. Enter text with `text <...>` or `add <...>`.".into());
            } else {
                let words = snap.input_text.split_whitespace().count();
                lines.push(format!(
                    "Draft: {} characters, {words} words. Type `analyze` to continue.",
                    snap.input_text.chars().count()
                ));
            }
        }
        ProcessState::Analyzing => lines.push("Analyzing text…".into()),
        ProcessState::ChoosingCount => lines.push(format!(
            "How many flash cards? {} (use `count <N>`)",
            join_counts(&snap.count_options)
        )),
        ProcessState::Generating => {
            let n = snap.selected_count.unwrap_or_default();
            lines.push(format!("Generating {n} flash cards…"));
        }
        ProcessState::ShowingResults => {
            lines.extend(build_card_lines(snap, show_answers).lines);
        }
    }

    if snap.state.is_busy() {
        lines.push("(commands typed now run once this finishes)".into());
    }
    if let Some(err) = snap.error_message.as_deref() {
        lines.push(format!("Error: {err}"));
    }

    TextSummary { lines }
}

/// Numbered card list. Answers show for the flipped card, or all of them with `show_answers`.
pub(crate) fn build_card_lines(snap: &WorkflowSnapshot, show_answers: bool) -> TextSummary {
    let mut lines = Vec::new();

    if snap.cards.is_empty() {
        lines.push("The provider returned no flash cards.".into());
    }
    for (i, card) in snap.cards.iter().enumerate() {
        lines.push(format!("{:>2}. Q: {}", i + 1, card.question));
        if show_answers || snap.flipped_index == Some(i) {
            lines.push(format!("    A: {}", card.answer));
        }
    }

    if let Some(asked) = snap.selected_count {
        if snap.cards.len() != asked as usize {
            lines.push(format!(
                "(asked for {asked} cards, received {})",
                snap.cards.len()
            ));
        }
    }

    TextSummary { lines }
}
