use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use notes_core::{Note, Theme};
use tracing::{debug, warn};

use crate::kv::{KeyValueStore, MemoryKeyValue};
use crate::sqlite::SqliteKeyValue;

pub const NOTES_KEY: &str = "notes";
pub const THEME_KEY: &str = "theme";

/// Loads and saves the note collection and theme flag through a
/// [`KeyValueStore`]. Unreadable or corrupt data loads as the default value.
#[derive(Clone)]
pub struct NoteStore {
    kv: Arc<dyn KeyValueStore>,
}

impl NoteStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn open_sqlite(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Arc::new(SqliteKeyValue::open(path)?)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValue::new()))
    }

    pub fn load(&self) -> Vec<Note> {
        let raw = match self.kv.get(NOTES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read notes, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Note>>(&raw) {
            Ok(notes) => {
                debug!(count = notes.len(), "loaded notes");
                notes
            }
            Err(err) => {
                warn!(error = %err, "stored notes are corrupt, starting empty");
                Vec::new()
            }
        }
    }

    pub fn save(&self, notes: &[Note]) -> Result<()> {
        let raw = serde_json::to_string(notes).context("failed to serialize notes")?;
        self.kv.set(NOTES_KEY, &raw)?;
        debug!(count = notes.len(), "saved notes");
        Ok(())
    }

    pub fn load_theme(&self) -> Theme {
        let raw = match self.kv.get(THEME_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Theme::default(),
            Err(err) => {
                warn!(error = %err, "failed to read theme, using default");
                return Theme::default();
            }
        };

        raw.trim().trim_matches('"').parse::<Theme>().unwrap_or_else(|err| {
            warn!(error = %err, "stored theme is invalid, using default");
            Theme::default()
        })
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.kv.set(THEME_KEY, theme.as_str())
    }
}
