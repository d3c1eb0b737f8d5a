//! Session controller.
//!
//! Applies UI commands to the workflow one at a time. Snapshots reach the
//! presentation layer through the workflow's watch channel, so the controller
//! itself never renders anything.

use super::workflow::GenerationWorkflow;
use crate::error::GenerationError;
use crate::model::WorkflowSnapshot;
use std::future::Future;
use std::pin::pin;
use tokio::sync::mpsc::UnboundedReceiver;

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiCommand {
    SetText(String),
    AppendText(String),
    Analyze,
    Generate(u32),
    Flip(usize),
    BackToEdit,
    Reset,
    Quit,
}

/// Drive `workflow` until the UI quits, the command channel closes, or
/// `shutdown` resolves.
///
/// Commands are applied in arrival order; one that arrives while a provider
/// call is pending waits for that call to settle. `shutdown` also cuts a
/// pending call short, leaving the workflow in the state that call would have
/// failed into. Returns the last snapshot.
pub(crate) async fn run_controller(
    mut workflow: GenerationWorkflow,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
    shutdown: impl Future<Output = ()>,
) -> WorkflowSnapshot {
    let mut shutdown = pin!(shutdown);

    loop {
        let cmd = tokio::select! {
            cmd = cmd_rx.recv() => cmd,
            _ = &mut shutdown => {
                log::debug!("interrupted; closing session");
                None
            }
        };
        let Some(cmd) = cmd else { break };

        let settled = match cmd {
            UiCommand::SetText(text) => {
                note("edit", workflow.set_input_text(&text));
                true
            }
            UiCommand::AppendText(line) => {
                let current = &workflow.snapshot().input_text;
                let text = if current.is_empty() {
                    line
                } else {
                    format!("{current}\n{line}")
                };
                note("edit", workflow.set_input_text(&text));
                true
            }
            UiCommand::Analyze => {
                let text = workflow.snapshot().input_text.clone();
                tokio::select! {
                    res = workflow.analyze(&text) => { note("analyze", res); true }
                    _ = &mut shutdown => false,
                }
            }
            UiCommand::Generate(count) => tokio::select! {
                res = workflow.generate(count) => { note("generate", res); true }
                _ = &mut shutdown => false,
            },
            UiCommand::Flip(index) => {
                workflow.flip_card(index);
                true
            }
            UiCommand::BackToEdit => {
                workflow.back_to_edit();
                true
            }
            UiCommand::Reset => {
                workflow.reset();
                true
            }
            UiCommand::Quit => break,
        };

        if !settled {
            log::debug!(
                "interrupted while {}; closing session",
                workflow.snapshot().state.label()
            );
            workflow.interrupt();
            break;
        }
    }

    workflow.snapshot().clone()
}

/// Failures are already in the snapshot; only log them here.
fn note(op: &str, res: Result<(), GenerationError>) {
    if let Err(e) = res {
        log::debug!("{op} failed: {e:?}");
    }
}
