//! Card export.

use crate::model::{CardExport, GeneratorConfig, WorkflowSnapshot};
use anyhow::{Context, Result};
use std::path::Path;

pub fn build_export(snap: &WorkflowSnapshot, generator: &GeneratorConfig) -> CardExport {
    CardExport {
        generated_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        generator: generator.clone(),
        requested_count: snap.selected_count,
        flashcards: snap.cards.clone(),
    }
}

pub fn export_json(path: &Path, export: &CardExport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export directory {}", parent.display()))?;
    }
    let data = serde_json::to_vec_pretty(export).context("serialize cards")?;
    std::fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
