//! Application-level orchestration.
//!
//! `workflow` owns the card generation state machine; `controller` feeds it
//! UI commands for interactive sessions. CLI layers call into this module and
//! only read snapshots back.

mod controller;
mod workflow;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use workflow::{join_counts, GenerationWorkflow};
