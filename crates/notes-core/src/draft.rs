use serde::{Deserialize, Serialize};

/// Transient input state for the note being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub text: String,
    pub tag: String,
}

impl Draft {
    pub fn new(text: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: tag.into(),
        }
    }

    /// Appends a symbol handed over by the emoji picker. The symbol is opaque.
    pub fn insert(&mut self, symbol: &str) {
        self.text.push_str(symbol);
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.tag.clear();
    }
}
