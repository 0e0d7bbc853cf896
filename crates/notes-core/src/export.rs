use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::note::Note;

const PLAIN_SEPARATOR: &str = "\n\n";
const MARKDOWN_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Plain,
    #[default]
    Markdown,
}

#[derive(Debug, Error)]
#[error("unknown export format `{0}`, expected `plain` or `markdown`")]
pub struct UnknownExportFormat(pub String);

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Plain => "plain",
            ExportFormat::Markdown => "markdown",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Plain => "text/plain",
            ExportFormat::Markdown => "text/markdown",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Plain => "legendary_notes.txt",
            ExportFormat::Markdown => "legendary_notes.md",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownExportFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" | "txt" | "text" => Ok(ExportFormat::Plain),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(UnknownExportFormat(value.to_owned())),
        }
    }
}

/// Payload handed to the download collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub contents: String,
}

/// Renders notes in the order given. Callers pass the canonical collection.
pub fn export_text(notes: &[Note], format: ExportFormat) -> String {
    match format {
        ExportFormat::Plain => notes
            .iter()
            .map(|note| format!("[{}]: {}", note.label(), note.text))
            .collect::<Vec<_>>()
            .join(PLAIN_SEPARATOR),
        ExportFormat::Markdown => notes
            .iter()
            .map(|note| format!("**{}**\n\n{}", note.label(), note.text))
            .collect::<Vec<_>>()
            .join(MARKDOWN_SEPARATOR),
    }
}

pub fn export_file(notes: &[Note], format: ExportFormat) -> ExportFile {
    ExportFile {
        file_name: format.file_name(),
        mime_type: format.mime_type(),
        contents: export_text(notes, format),
    }
}
