use crate::models::OddsDocument;
use anyhow::{Context, Result};
use std::path::Path;

/// Save odds documents to a JSON fixture file
pub fn save_documents_to_file(documents: &[OddsDocument], path: impl AsRef<Path>) -> Result<()> {
    let json =
        serde_json::to_string_pretty(documents).context("Failed to serialize odds documents")?;
    std::fs::write(path.as_ref(), json).with_context(|| {
        format!("Failed to write fixture file {}", path.as_ref().display())
    })?;
    Ok(())
}

/// Load odds documents from a JSON fixture file
pub fn load_documents_from_file(path: impl AsRef<Path>) -> Result<Vec<OddsDocument>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture file {}", path.display()))?;
    let documents: Vec<OddsDocument> =
        serde_json::from_str(&json).context("Failed to deserialize odds documents")?;
    Ok(documents)
}
