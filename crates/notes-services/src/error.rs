use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("note text is empty")]
    EmptyText,

    /// The in-memory change was applied but could not be written to storage.
    #[error("failed to persist to storage: {0:#}")]
    Persist(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, NotesError>;
