use chrono::Utc;
use serde::{Deserialize, Serialize};

pub type NoteId = i64;

const UNTAGGED_LABEL: &str = "Note";

/// A single free-text note. Field names on the wire match the browser payload
/// (`isPinned`), and `tag`/`isPinned` default when absent so early collections
/// that only stored `id` and `text` still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub is_pinned: bool,
}

impl Note {
    pub fn new(id: NoteId, text: impl Into<String>, tag: impl Into<String>) -> Self {
        let tag: String = tag.into();
        Self {
            id,
            text: text.into(),
            tag: tag.trim().to_owned(),
            is_pinned: false,
        }
    }

    pub fn has_tag(&self) -> bool {
        !self.tag.is_empty()
    }

    /// Tag shown in listings and exports, `"Note"` for untagged notes.
    pub fn label(&self) -> &str {
        if self.has_tag() {
            &self.tag
        } else {
            UNTAGGED_LABEL
        }
    }
}

/// Issues note ids from the wall clock in milliseconds, bumped past the last
/// issued id so two notes created in the same tick never collide.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: NoteId,
}

impl IdGenerator {
    pub fn seeded<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Self {
        let mut generator = Self::default();
        for note in notes {
            generator.observe(note.id);
        }
        generator
    }

    pub fn observe(&mut self, id: NoteId) {
        self.last = self.last.max(id);
    }

    pub fn next_id(&mut self) -> NoteId {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub fn next_at(&mut self, now_ms: i64) -> NoteId {
        let id = now_ms.max(self.last.saturating_add(1));
        self.last = id;
        id
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_stay_unique_within_one_tick() {
        let mut generator = IdGenerator::default();
        let ids: Vec<_> = (0..100).map(|_| generator.next_at(1_700_000_000_000)).collect();
        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn seeded_generator_skips_past_loaded_ids() {
        let loaded = vec![Note::new(5_000, "future", "")];
        let mut generator = IdGenerator::seeded(&loaded);
        assert_eq!(generator.next_at(10), 5_001);
        assert_eq!(generator.next_at(9_000), 9_000);
    }

    #[test]
    fn untagged_note_uses_default_label() {
        assert_eq!(Note::new(1, "Hi", "   ").label(), "Note");
        assert_eq!(Note::new(2, "Hi", "Errand").label(), "Errand");
    }

    #[test]
    fn deserializes_legacy_payload_without_tag_or_pin() {
        let note: Note = serde_json::from_str(r#"{"id":1712,"text":"old"}"#).expect("parse");
        assert_eq!(note.tag, "");
        assert!(!note.is_pinned);

        let json = serde_json::to_value(Note::new(3, "x", "y")).expect("serialize");
        assert_eq!(json["isPinned"], serde_json::Value::Bool(false));
    }
}
