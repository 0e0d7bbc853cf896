use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use notes_core::ExportFile;
use tracing::info;

/// Delivers an exported payload to the user, e.g. as a file download.
pub trait ExportSink {
    fn deliver(&self, file: &ExportFile) -> Result<()>;
}

/// Writes exports into a directory under their default file name.
#[derive(Debug, Clone)]
pub struct DirectoryExportSink {
    dir: PathBuf,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, file: &ExportFile) -> PathBuf {
        self.dir.join(file.file_name)
    }
}

impl ExportSink for DirectoryExportSink {
    fn deliver(&self, file: &ExportFile) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create export dir {}", self.dir.display()))?;
        let path = self.path_for(file);
        fs::write(&path, &file.contents)
            .with_context(|| format!("failed to write export {}", path.display()))?;
        info!(path = %path.display(), mime = file.mime_type, "exported notes");
        Ok(())
    }
}
