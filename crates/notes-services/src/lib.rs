mod backup;
mod error;
mod export;
mod notebook;

pub use backup::ImportReport;
pub use error::NotesError;
pub use export::{DirectoryExportSink, ExportSink};
pub use notebook::{NoteBook, NoteBookBuilder};
