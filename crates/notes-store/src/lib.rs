mod kv;
mod migrations;
mod sqlite;
mod store;

pub use kv::{KeyValueStore, MemoryKeyValue};
pub use sqlite::SqliteKeyValue;
pub use store::{NOTES_KEY, NoteStore, THEME_KEY};
