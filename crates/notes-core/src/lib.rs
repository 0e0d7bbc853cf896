pub mod draft;
pub mod export;
pub mod note;
pub mod settings;
pub mod view;

pub use draft::Draft;
pub use export::{ExportFile, ExportFormat, UnknownExportFormat, export_file, export_text};
pub use note::{IdGenerator, Note, NoteId};
pub use settings::{Theme, UnknownTheme};
pub use view::view;
