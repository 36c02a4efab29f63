//! Learning Processor
//!
//! Turns one teacher utterance into an attention update and, if the student
//! is awake and paying attention, a candidate notebook entry. The processor
//! never writes to the ledger itself; the session loop appends the note.

use crate::notice::Notice;
use crate::oracle::{Oracle, OracleMessage, OracleRequest};
use crate::prompts::{PromptKey, PromptLibrary};
use crate::state::{SessionState, WAKE_ATTENTION};
use tracing::{debug, info, warn};

pub const WAKE_PHRASES: [&str; 3] = ["WAKE", "UP", "HEY"];
/// Messages with more words than this cost attention.
pub const LONG_MESSAGE_WORDS: usize = 35;
pub const LONG_MESSAGE_PENALTY: i32 = 15;
pub const QUESTION_BONUS: i32 = 10;
/// Below this attention nothing is learned.
pub const ATTENTION_FLOOR: i32 = 20;

/// What the student got out of one teacher utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearningOutcome {
    /// A new note for the ledger.
    Note(String),
    /// Nothing was written down this turn.
    NoNote,
    /// The student slept through it.
    Asleep,
}

impl LearningOutcome {
    pub fn note(&self) -> Option<&str> {
        match self {
            LearningOutcome::Note(note) => Some(note),
            _ => None,
        }
    }
}

/// Case-insensitive substring scan for a wake phrase.
pub fn contains_wake_phrase(text: &str) -> bool {
    let upper = text.to_uppercase();
    WAKE_PHRASES.iter().any(|phrase| upper.contains(phrase))
}

/// Applies the word-count and question-mark adjustments.
///
/// Both checks are independent; a long question nets -5.
pub fn apply_attention_mechanics(state: &mut SessionState, text: &str, notices: &mut Vec<Notice>) {
    let word_count = text.split_whitespace().count();
    if word_count > LONG_MESSAGE_WORDS {
        state.attention_span -= LONG_MESSAGE_PENALTY;
        notices.push(Notice::system(format!(
            "Message too long! Attention dropped to {}%.",
            state.attention_span
        )));
    }
    if text.contains('?') {
        state.raise_attention(QUESTION_BONUS);
    }
    debug!(word_count, attention = state.attention_span, "Attention updated");
}

/// Processes one teacher utterance.
pub async fn process(
    state: &mut SessionState,
    teacher_text: &str,
    oracle: &dyn Oracle,
    prompts: &PromptLibrary,
    notices: &mut Vec<Notice>,
) -> LearningOutcome {
    if state.is_asleep {
        if contains_wake_phrase(teacher_text) {
            state.is_asleep = false;
            state.attention_span = WAKE_ATTENTION;
            info!("Student woke up");
            notices.push(Notice::system("The student wakes up, groggy."));
            return LearningOutcome::NoNote;
        }
        return LearningOutcome::Asleep;
    }

    apply_attention_mechanics(state, teacher_text, notices);

    if state.attention_span < ATTENTION_FLOOR {
        debug!(attention = state.attention_span, "Student tuned out");
        return LearningOutcome::NoNote;
    }

    let attention = state.attention_span.to_string();
    let notebook = state.knowledge_ledger.bulleted();
    let system_prompt = prompts.render(
        PromptKey::NoteTaker,
        &[
            ("persona", state.persona.as_str()),
            ("attention", attention.as_str()),
            ("notebook", notebook.as_str()),
            ("teacher_text", teacher_text),
        ],
    );
    let request = OracleRequest::text(vec![
        OracleMessage::system(system_prompt),
        OracleMessage::user(teacher_text),
    ]);

    match oracle.complete(request).await {
        Ok(note) => validate_note(note),
        Err(e) => {
            warn!(error = %e, "Note synthesis failed, no note this turn");
            LearningOutcome::NoNote
        }
    }
}

fn validate_note(note: String) -> LearningOutcome {
    let note = note.trim();
    if note.contains("NOTHING") || note.chars().count() < 3 {
        LearningOutcome::NoNote
    } else {
        LearningOutcome::Note(note.to_string())
    }
}
