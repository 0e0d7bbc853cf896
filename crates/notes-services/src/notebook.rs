use std::{collections::HashSet, path::PathBuf, sync::Arc};

use notes_core::{
    Draft, ExportFile, ExportFormat, IdGenerator, Note, NoteId, Theme, export_file, view,
};
use notes_store::NoteStore;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{NotesError, Result};
use crate::export::ExportSink;

pub struct NoteBookBuilder {
    db_path: Option<PathBuf>,
}

impl NoteBookBuilder {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path: Some(db_path),
        }
    }

    pub fn in_memory() -> Self {
        Self { db_path: None }
    }

    pub fn build(self) -> anyhow::Result<NoteBook> {
        let store = match self.db_path {
            Some(path) => NoteStore::open_sqlite(path)?,
            None => NoteStore::in_memory(),
        };
        Ok(NoteBook::open(store))
    }
}

/// Owner of the canonical note collection.
///
/// Every mutation runs under one lock and writes the full collection through
/// the [`NoteStore`] before the lock is released, so readers never observe a
/// change that has not been handed to storage. A failed write is returned as
/// [`NotesError::Persist`]; the in-memory change is kept and the next
/// successful write carries it.
#[derive(Clone)]
pub struct NoteBook {
    pub(crate) store: NoteStore,
    pub(crate) state: Arc<Mutex<NoteBookState>>,
}

pub(crate) struct NoteBookState {
    pub(crate) notes: Vec<Note>,
    pub(crate) ids: IdGenerator,
    pub(crate) theme: Theme,
}

impl NoteBook {
    pub fn open(store: NoteStore) -> Self {
        let mut seen = HashSet::new();
        let mut notes = store.load();
        let loaded = notes.len();
        notes.retain(|note| seen.insert(note.id));
        if notes.len() != loaded {
            warn!(
                dropped = loaded - notes.len(),
                "dropped notes with duplicate ids"
            );
        }

        let ids = IdGenerator::seeded(&notes);
        let theme = store.load_theme();
        info!(count = notes.len(), theme = %theme, "note book opened");

        Self {
            store,
            state: Arc::new(Mutex::new(NoteBookState { notes, ids, theme })),
        }
    }

    pub fn notes(&self) -> Vec<Note> {
        self.state.lock().notes.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a note at the head of the collection. Blank text is ignored and
    /// yields `Ok(None)`.
    pub fn add(&self, text: &str, tag: &str) -> Result<Option<Note>> {
        match self.try_add(text, tag) {
            Ok(note) => Ok(Some(note)),
            Err(NotesError::EmptyText) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn try_add(&self, text: &str, tag: &str) -> Result<Note> {
        if text.trim().is_empty() {
            debug!("ignoring blank note");
            return Err(NotesError::EmptyText);
        }

        let mut state = self.state.lock();
        let id = state.ids.next_id();
        let note = Note::new(id, text, tag);
        state.notes.insert(0, note.clone());
        info!(note_id = note.id, tag = %note.tag, "note added");
        self.persist(&state.notes)?;
        Ok(note)
    }

    /// Adds the draft as a note and clears it. A blank draft is left untouched.
    pub fn add_draft(&self, draft: &mut Draft) -> Result<Option<Note>> {
        if draft.is_blank() {
            return Ok(None);
        }

        let added = self.try_add(&draft.text, &draft.tag);
        // the note is in the collection even when persisting it failed
        draft.clear();
        added.map(Some)
    }

    /// Removes the note with `id`. Returns `Ok(false)` when there is no such note.
    pub fn delete(&self, id: NoteId) -> Result<bool> {
        let mut state = self.state.lock();
        let Some(index) = state.notes.iter().position(|note| note.id == id) else {
            debug!(note_id = id, "delete ignored, note not found");
            return Ok(false);
        };

        state.notes.remove(index);
        info!(note_id = id, "note deleted");
        self.persist(&state.notes)?;
        Ok(true)
    }

    /// Flips the pin flag and returns the updated note, or `Ok(None)` when
    /// there is no such note.
    pub fn toggle_pin(&self, id: NoteId) -> Result<Option<Note>> {
        let mut state = self.state.lock();
        let Some(note) = state.notes.iter_mut().find(|note| note.id == id) else {
            debug!(note_id = id, "pin toggle ignored, note not found");
            return Ok(None);
        };

        note.is_pinned = !note.is_pinned;
        let updated = note.clone();
        info!(note_id = id, pinned = updated.is_pinned, "note pin toggled");
        self.persist(&state.notes)?;
        Ok(Some(updated))
    }

    pub fn view(&self, search: &str) -> Vec<Note> {
        let state = self.state.lock();
        view(&state.notes, search).into_iter().cloned().collect()
    }

    pub fn export_file(&self, format: ExportFormat) -> ExportFile {
        export_file(&self.state.lock().notes, format)
    }

    pub fn export(&self, format: ExportFormat, sink: &dyn ExportSink) -> anyhow::Result<ExportFile> {
        let file = self.export_file(format);
        sink.deliver(&file)?;
        Ok(file)
    }

    pub fn theme(&self) -> Theme {
        self.state.lock().theme
    }

    pub fn set_theme(&self, theme: Theme) -> Result<Theme> {
        let mut state = self.state.lock();
        state.theme = theme;
        self.store.save_theme(theme).map_err(|err| {
            warn!(error = %err, "failed to persist theme");
            NotesError::Persist(err)
        })?;
        debug!(theme = %theme, "theme saved");
        Ok(theme)
    }

    pub fn toggle_theme(&self) -> Result<Theme> {
        let next = self.theme().toggle();
        self.set_theme(next)
    }

    pub(crate) fn persist(&self, notes: &[Note]) -> Result<()> {
        self.store.save(notes).map_err(|err| {
            warn!(error = %err, count = notes.len(), "failed to persist notes");
            NotesError::Persist(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    use anyhow::anyhow;
    use notes_store::{KeyValueStore, MemoryKeyValue};

    use super::*;

    struct FullDisk;

    impl KeyValueStore for FullDisk {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("quota exceeded"))
        }
    }

    #[derive(Default)]
    struct FailsFirstWrite {
        inner: MemoryKeyValue,
        failed: AtomicBool,
    }

    impl KeyValueStore for FailsFirstWrite {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(anyhow!("disk busy"));
            }
            self.inner.set(key, value)
        }
    }

    fn book() -> NoteBook {
        NoteBook::open(NoteStore::in_memory())
    }

    fn ids(notes: &[Note]) -> Vec<NoteId> {
        notes.iter().map(|note| note.id).collect()
    }

    #[test]
    fn added_ids_are_unique() {
        let book = book();
        for index in 0..50 {
            book.add(&format!("note {index}"), "").expect("add");
        }
        let unique: HashSet<_> = ids(&book.notes()).into_iter().collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn blank_text_is_rejected_silently() {
        let book = book();
        assert!(book.add("   ", "tag").expect("add blank").is_none());
        assert!(book.is_empty());
        assert!(matches!(book.try_add("\n\t", ""), Err(NotesError::EmptyText)));
    }

    #[test]
    fn new_notes_prepend() {
        let book = book();
        let a = book.add("A", "").expect("add a").expect("note a");
        let b = book.add("B", "").expect("add b").expect("note b");
        assert_eq!(ids(&book.notes()), vec![b.id, a.id]);
        assert!(!b.is_pinned);
    }

    #[test]
    fn delete_twice_matches_delete_once() {
        let book = book();
        let keep = book.add("keep", "").expect("add").expect("note");
        let gone = book.add("gone", "").expect("add").expect("note");

        assert!(book.delete(gone.id).expect("first delete"));
        let after_once = book.notes();
        assert!(!book.delete(gone.id).expect("second delete"));
        assert_eq!(book.notes(), after_once);
        assert_eq!(ids(&after_once), vec![keep.id]);
    }

    #[test]
    fn toggle_pin_on_missing_id_is_noop() {
        let book = book();
        book.add("only", "").expect("add");
        let before = book.notes();
        assert!(book.toggle_pin(42).expect("toggle").is_none());
        assert_eq!(book.notes(), before);
    }

    #[test]
    fn pinning_reorders_view_but_not_collection() {
        let book = book();
        let c = book.add("C", "").expect("add").expect("note");
        let b = book.add("B", "").expect("add").expect("note");
        let a = book.add("A", "").expect("add").expect("note");
        let pinned = book.toggle_pin(b.id).expect("pin").expect("note");
        assert!(pinned.is_pinned);

        assert_eq!(ids(&book.notes()), vec![a.id, b.id, c.id]);
        assert_eq!(ids(&book.view("")), vec![b.id, a.id, c.id]);
    }

    #[test]
    fn every_mutation_is_visible_to_a_fresh_reader() {
        let kv = Arc::new(MemoryKeyValue::new());
        let book = NoteBook::open(NoteStore::new(kv.clone()));
        let milk = book.add("Remember milk", "Errand").expect("add").expect("note");
        book.add("Finish report", "").expect("add");
        book.toggle_pin(milk.id).expect("pin");
        book.toggle_theme().expect("theme");

        let reopened = NoteBook::open(NoteStore::new(kv.clone()));
        assert_eq!(reopened.notes(), book.notes());
        assert_eq!(reopened.theme(), Theme::Light);

        book.delete(milk.id).expect("delete");
        let reopened = NoteBook::open(NoteStore::new(kv));
        assert_eq!(reopened.notes(), book.notes());
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn draft_is_cleared_after_add() {
        let book = book();
        let mut draft = Draft::new("Party", "fun");
        draft.insert(" 🎉");
        let note = book.add_draft(&mut draft).expect("add").expect("note");
        assert_eq!(note.text, "Party 🎉");
        assert_eq!(note.tag, "fun");
        assert_eq!(draft, Draft::default());

        let mut blank = Draft::new("  ", "kept");
        assert!(book.add_draft(&mut blank).expect("add blank").is_none());
        assert_eq!(blank.tag, "kept");
    }

    #[test]
    fn write_failure_is_reported_and_state_kept() {
        let book = NoteBook::open(NoteStore::new(Arc::new(FullDisk)));
        let err = book.add("unsaved", "").expect_err("persist should fail");
        assert!(matches!(err, NotesError::Persist(_)));
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(book.len(), 1);
        assert!(matches!(book.toggle_theme(), Err(NotesError::Persist(_))));
        assert_eq!(book.theme(), Theme::Light);
    }

    #[test]
    fn next_successful_write_carries_earlier_unsaved_note() {
        let kv = Arc::new(FailsFirstWrite::default());
        let book = NoteBook::open(NoteStore::new(kv.clone()));
        assert!(matches!(book.add("A", ""), Err(NotesError::Persist(_))));
        book.add("B", "").expect("add b").expect("note b");

        let reopened = NoteBook::open(NoteStore::new(kv));
        let texts: Vec<_> = reopened.notes().into_iter().map(|note| note.text).collect();
        assert_eq!(texts, vec!["B", "A"]);
    }

    #[test]
    fn duplicate_ids_in_storage_are_dropped_on_open() {
        let raw = r#"[{"id":7,"text":"first"},{"id":7,"text":"dup"},{"id":3,"text":"other"}]"#;
        let kv = MemoryKeyValue::new().with_value(notes_store::NOTES_KEY, raw);
        let book = NoteBook::open(NoteStore::new(Arc::new(kv)));
        let texts: Vec<_> = book.notes().into_iter().map(|note| note.text).collect();
        assert_eq!(texts, vec!["first", "other"]);

        let added = book.add("new", "").expect("add").expect("note");
        assert!(added.id > 7);
    }

    #[test]
    fn export_uses_canonical_order() {
        let book = book();
        let first = book.add("first", "").expect("add").expect("note");
        book.add("second", "two").expect("add");
        book.toggle_pin(first.id).expect("pin");

        let file = book.export_file(ExportFormat::Plain);
        assert_eq!(file.contents, "[two]: second\n\n[Note]: first");
        assert_eq!(file.mime_type, "text/plain");
    }
}
