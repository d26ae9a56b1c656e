//! Offline seeding for narrator-tier content.
//!
//! This module hosts the logic that powers the `cicerone seed` CLI command.
//! The command reads a JSON script of `{key, text}` entries and runs each one
//! through the narration dispatcher under the `narrator` tier. Narrator
//! content skips admission, and the cache makes re-runs idempotent: entries
//! already generated are skipped for free, so the script can be replayed
//! after edits.
//!
//! Typical usage from the CLI:
//!
//! ```text
//! $ SPEECH_API_KEY=... DATA_PATH=/var/lib/cicerone cicerone seed tour.json
//! ```
//!
//! Individual entry failures are logged and counted but do not abort the
//! run; only configuration errors fail the process.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::Path;

use crate::config::ServiceConfig;
use crate::core::CoreState;
use crate::core::narration::NarrationPayload;
use crate::core::tier::Tier;

/// One narrator entry of the seed script.
#[derive(Debug, Deserialize)]
struct SeedEntry {
    key: String,
    text: String,
}

fn parse_script(raw: &[u8]) -> Result<Vec<SeedEntry>> {
    serde_json::from_slice(raw).context("Seed script must be a JSON array of {key, text} entries")
}

/// Seed narrator content from a JSON script.
///
/// Loads configuration from the environment, builds the narration pipeline,
/// and generates audio for every entry in the script.
pub async fn run(script_path: &Path) -> Result<()> {
    let config = ServiceConfig::from_env().map_err(|e| anyhow!(e.to_string()))?;
    if !config.has_speech_provider() {
        anyhow::bail!("SPEECH_API_KEY must be set to run `cicerone seed`");
    }

    let raw = tokio::fs::read(script_path)
        .await
        .with_context(|| format!("Failed to read seed script {}", script_path.display()))?;
    let entries = parse_script(&raw)?;

    tracing::info!(
        "Seeding {} narrator entries from {}",
        entries.len(),
        script_path.display()
    );

    let core = CoreState::new(&config)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    let mut generated = 0usize;
    let mut failed = 0usize;
    for entry in &entries {
        if entry.key.trim().is_empty() || entry.text.trim().is_empty() {
            tracing::warn!("Skipping seed entry with an empty key or text");
            failed += 1;
            continue;
        }
        match core
            .narration
            .generate(
                &entry.key,
                Tier::Narrator,
                NarrationPayload::Speech {
                    text: entry.text.clone(),
                },
                "seeder",
            )
            .await
        {
            Some(artifact) => {
                tracing::info!("Seeded {} -> {}", entry.key, artifact.id());
                generated += 1;
            }
            None => {
                tracing::warn!("Failed to seed {}", entry.key);
                failed += 1;
            }
        }
    }

    tracing::info!("Seeding complete: {} generated, {} failed", generated, failed);
    Ok(())
}
