//! Session State
//!
//! The mutable record of one teaching session. A `SessionState` is owned by
//! exactly one [`crate::engine::Classroom`] and is never shared.

use crate::dialogue::Conversation;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const INITIAL_ATTENTION: i32 = 80;
pub const WAKE_ATTENTION: i32 = 50;
pub const MAX_ATTENTION: i32 = 100;
pub const INITIAL_ATTEMPTS: u32 = 3;
pub const ALIEN_TURNS: i32 = 3;
pub const ALIEN_INACTIVE: i32 = -1;

/// One exam question generated at setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TestQuestion {
    #[serde(default)]
    pub difficulty: String,
    pub question: String,
    #[serde(rename = "std_answer", alias = "standard_answer", default)]
    pub standard_answer: String,
}

/// The learner's notebook: everything the student is allowed to know.
///
/// Notes can only be appended, or replaced in place at an existing index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KnowledgeLedger {
    notes: Vec<String>,
}

impl KnowledgeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Replaces the note at `index`, returning the old note.
    ///
    /// Returns `None` and leaves the ledger untouched when `index` is out of range.
    pub fn replace(&mut self, index: usize, note: impl Into<String>) -> Option<String> {
        self.notes
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, note.into()))
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.notes.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Notes as a bulleted list, or an explicit empty-notebook marker.
    pub fn bulleted(&self) -> String {
        if self.notes.is_empty() {
            return "(Notebook is empty)".to_string();
        }
        self.notes
            .iter()
            .map(|note| format!("- {}", note))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Notes one per line, or an explicit empty-notebook marker.
    pub fn plain(&self) -> String {
        if self.notes.is_empty() {
            "(Notebook is empty)".to_string()
        } else {
            self.notes.join("\n")
        }
    }
}

impl<S: Into<String>> FromIterator<S> for KnowledgeLedger {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            notes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Mutable state of a single teaching session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub topic: String,
    pub persona: String,
    pub curriculum: Vec<String>,
    pub test_bank: Vec<TestQuestion>,
    pub knowledge_ledger: KnowledgeLedger,
    /// Not clamped on the way down; may go negative.
    pub attention_span: i32,
    pub attempts_left: u32,
    pub is_asleep: bool,
    /// `ALIEN_INACTIVE` (-1) when no invasion is under way.
    pub alien_countdown: i32,
    pub conversation: Conversation,
}

impl SessionState {
    pub fn new(
        persona: String,
        topic: String,
        curriculum: Vec<String>,
        test_bank: Vec<TestQuestion>,
    ) -> Self {
        Self {
            topic,
            persona,
            curriculum,
            test_bank,
            knowledge_ledger: KnowledgeLedger::new(),
            attention_span: INITIAL_ATTENTION,
            attempts_left: INITIAL_ATTEMPTS,
            is_asleep: false,
            alien_countdown: ALIEN_INACTIVE,
            conversation: Conversation::default(),
        }
    }

    pub fn alien_active(&self) -> bool {
        self.alien_countdown >= 0
    }

    /// Raises attention by `amount`, capped at `MAX_ATTENTION`.
    pub fn raise_attention(&mut self, amount: i32) {
        self.attention_span = (self.attention_span + amount).min(MAX_ATTENTION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SessionState {
        SessionState::new("Literalist".into(), "Rust".into(), vec![], vec![])
    }

    #[test]
    fn test_initial_values() {
        let state = state();
        assert_eq!(state.attention_span, 80);
        assert_eq!(state.attempts_left, 3);
        assert!(!state.is_asleep);
        assert_eq!(state.alien_countdown, -1);
        assert!(!state.alien_active());
        assert!(state.knowledge_ledger.is_empty());
        assert!(state.conversation.is_empty());
    }

    #[test]
    fn test_attention_is_capped_upward_only() {
        let mut state = state();
        state.attention_span = 95;
        state.raise_attention(10);
        assert_eq!(state.attention_span, 100);

        state.attention_span = -5;
        state.raise_attention(10);
        assert_eq!(state.attention_span, 5);
    }

    #[test]
    fn test_ledger_replace_keeps_length() {
        let mut ledger: KnowledgeLedger = ["a", "b"].into_iter().collect();
        assert_eq!(ledger.replace(1, "B"), Some("b".to_string()));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get(1), Some("B"));
        assert_eq!(ledger.replace(5, "x"), None);
        assert_eq!(ledger.notes(), &["a".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_ledger_rendering() {
        let empty = KnowledgeLedger::new();
        assert_eq!(empty.bulleted(), "(Notebook is empty)");
        assert_eq!(empty.plain(), "(Notebook is empty)");

        let ledger: KnowledgeLedger = ["Rust is fast", "Rust has no GC"].into_iter().collect();
        assert_eq!(ledger.bulleted(), "- Rust is fast\n- Rust has no GC");
        assert_eq!(ledger.plain(), "Rust is fast\nRust has no GC");
    }

    #[test]
    fn test_question_accepts_both_answer_field_names() {
        let short: TestQuestion =
            serde_json::from_str(r#"{"difficulty":"easy","question":"Q?","std_answer":"A"}"#)
                .unwrap();
        let long: TestQuestion =
            serde_json::from_str(r#"{"question":"Q?","standard_answer":"A"}"#).unwrap();
        assert_eq!(short.standard_answer, "A");
        assert_eq!(long.standard_answer, "A");
        assert_eq!(long.difficulty, "");
    }
}
