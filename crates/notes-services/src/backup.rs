use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result};
use notes_core::{Note, Theme};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::notebook::NoteBook;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub notes: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct BackupFile {
    #[serde(default)]
    theme: Option<Theme>,
    #[serde(default)]
    notes: Vec<Note>,
}

impl NoteBook {
    pub fn export_backup_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create backup dir {}", parent.display()))?;
        }

        let payload = {
            let state = self.state.lock();
            BackupFile {
                theme: Some(state.theme),
                notes: state.notes.clone(),
            }
        };

        fs::write(path, serde_json::to_string_pretty(&payload)?)
            .with_context(|| format!("failed to write backup {}", path.display()))?;
        info!(path = %path.display(), count = payload.notes.len(), "backup written");
        Ok(())
    }

    /// Appends backup notes whose ids are not already present, in file order.
    /// Notes with blank text are skipped.
    /// The backup theme, when present, replaces the current one.
    pub fn import_backup_json(&self, path: impl AsRef<Path>) -> Result<ImportReport> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read backup {}", path.display()))?;
        let backup: BackupFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse backup {}", path.display()))?;

        let mut report = ImportReport::default();
        {
            let mut state = self.state.lock();
            let mut seen: HashSet<_> = state.notes.iter().map(|note| note.id).collect();
            for note in backup.notes {
                if note.text.trim().is_empty() || !seen.insert(note.id) {
                    report.skipped += 1;
                    continue;
                }
                state.ids.observe(note.id);
                state.notes.push(note);
                report.notes += 1;
            }

            if report.notes > 0 {
                self.persist(&state.notes)?;
            }
        }

        if let Some(theme) = backup.theme {
            self.set_theme(theme)?;
        }

        info!(
            imported = report.notes,
            skipped = report.skipped,
            "backup imported"
        );
        Ok(report)
    }
}
