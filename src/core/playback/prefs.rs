//! Persisted player preferences.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Listener preferences that survive restarts.
///
/// Currently just the mute flag: a listener who muted narration stays muted
/// until they unmute, however many sessions later that is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPrefs {
    pub muted: bool,
}

impl PlayerPrefs {
    /// Reads preferences from `path`, falling back to defaults.
    ///
    /// A missing file is the normal first-run case. An unreadable or corrupt
    /// file is logged and treated the same way.
    pub async fn load(path: &Path) -> Self {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("Failed to read player prefs {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Discarding corrupt player prefs {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Writes preferences to `path` atomically.
    pub async fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let raw = serde_json::to_vec_pretty(self)?;

        // Write to a temp file and rename so a crash never leaves a torn file.
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&raw).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, path).await?;

        Ok(())
    }
}
