//! Dialogue Responder
//!
//! Produces the student's in-character reply. The student keeps a persistent
//! conversation whose first message is the knowledge-containment preamble;
//! every turn additionally carries a fresh snapshot of attention and notebook.

use crate::learning::LearningOutcome;
use crate::oracle::{FALLBACK_TEXT, Oracle, OracleMessage, OracleRequest};
use crate::prompts::{PromptKey, PromptLibrary};
use crate::state::SessionState;
use tracing::warn;

/// What the student says instead of answering while asleep.
pub const SLEEP_REPLY: &str = "Zzzzz... (snore)...";

/// The student's persisted conversation with the teacher.
///
/// Starts empty; the first reply lazily installs the system preamble. Grows by
/// two messages per successful turn and is never truncated.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<OracleMessage>,
}

impl Conversation {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn messages(&self) -> &[OracleMessage] {
        &self.messages
    }

    fn start(&mut self, preamble: String) {
        self.messages.push(OracleMessage::system(preamble));
    }

    fn record_turn(&mut self, teacher_text: &str, reply: &str) {
        self.messages.push(OracleMessage::user(teacher_text));
        self.messages.push(OracleMessage::assistant(reply));
    }
}

/// Builds the knowledge-containment preamble for this session.
pub fn system_preamble(state: &SessionState, prompts: &PromptLibrary) -> String {
    prompts.render(
        PromptKey::StudentSystem,
        &[
            ("persona", state.persona.as_str()),
            ("topic", state.topic.as_str()),
        ],
    )
}

/// Produces the student's reply to `teacher_text`.
pub async fn respond(
    state: &mut SessionState,
    teacher_text: &str,
    outcome: &LearningOutcome,
    oracle: &dyn Oracle,
    prompts: &PromptLibrary,
) -> String {
    if *outcome == LearningOutcome::Asleep {
        return SLEEP_REPLY.to_string();
    }

    if state.conversation.is_empty() {
        let preamble = system_preamble(state, prompts);
        state.conversation.start(preamble);
    }

    let attention = state.attention_span.to_string();
    let notebook = state.knowledge_ledger.plain();
    let turn_state = prompts.render(
        PromptKey::TurnState,
        &[
            ("attention", attention.as_str()),
            ("notebook", notebook.as_str()),
            ("note", outcome.note().unwrap_or("none")),
        ],
    );

    let mut messages = state.conversation.messages().to_vec();
    messages.push(OracleMessage::system(turn_state));
    messages.push(OracleMessage::user(teacher_text));

    match oracle.complete(OracleRequest::text(messages)).await {
        Ok(reply) => {
            state.conversation.record_turn(teacher_text, &reply);
            reply
        }
        Err(e) => {
            warn!(error = %e, "Student reply failed");
            FALLBACK_TEXT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockOracle, OracleError, Role};

    fn state() -> SessionState {
        SessionState::new("Rabbit Hole".into(), "Volcanoes".into(), vec![], vec![])
    }

    #[tokio::test]
    async fn test_asleep_short_circuits() {
        let mut oracle = MockOracle::new();
        oracle.expect_complete().never();
        let mut state = state();

        let reply = respond(&mut state, "hello?", &LearningOutcome::Asleep, &oracle, &PromptLibrary::default()).await;

        assert_eq!(reply, SLEEP_REPLY);
        assert!(state.conversation.is_empty());
    }

    #[tokio::test]
    async fn test_first_turn_installs_preamble_and_records_history() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_complete()
            .withf(|req| {
                let m = &req.messages;
                m.len() == 3
                    && m[0].role == Role::System
                    && m[0].content.contains("YOUR PERSONA: Rabbit Hole")
                    && m[0].content.contains("YOUR TOPIC: Volcanoes")
                    && m[1].role == Role::System
                    && m[1].content.contains("You just wrote down: \"Lava is hot\"")
                    && m[2] == OracleMessage::user("Lava is hot")
            })
            .times(1)
            .returning(|_| Ok("But why is it hot?".to_string()));
        let mut state = state();
        state.knowledge_ledger.append("Lava is hot");

        let outcome = LearningOutcome::Note("Lava is hot".into());
        let reply = respond(&mut state, "Lava is hot", &outcome, &oracle, &PromptLibrary::default()).await;

        assert_eq!(reply, "But why is it hot?");
        assert_eq!(state.conversation.len(), 3);
        assert_eq!(state.conversation.messages()[2], OracleMessage::assistant("But why is it hot?"));
    }

    #[tokio::test]
    async fn test_history_grows_by_two_per_turn() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_complete()
            .returning(|req| Ok(format!("reply {}", req.messages.len())));
        let mut state = state();
        let prompts = PromptLibrary::default();

        respond(&mut state, "one", &LearningOutcome::NoNote, &oracle, &prompts).await;
        respond(&mut state, "two", &LearningOutcome::NoNote, &oracle, &prompts).await;
        let third = respond(&mut state, "three", &LearningOutcome::NoNote, &oracle, &prompts).await;

        assert_eq!(state.conversation.len(), 7);
        // preamble + 2 turns of history + state message + teacher line
        assert_eq!(third, "reply 7");
        let system_count = state
            .conversation
            .messages()
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(system_count, 1);
    }

    #[tokio::test]
    async fn test_no_note_is_reported_as_none() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_complete()
            .withf(|req| req.messages[1].content.contains("You just wrote down: \"none\""))
            .returning(|_| Ok("Huh?".to_string()));
        let mut state = state();
        let reply = respond(&mut state, "blah", &LearningOutcome::NoNote, &oracle, &PromptLibrary::default()).await;
        assert_eq!(reply, "Huh?");
    }

    #[tokio::test]
    async fn test_failure_returns_fallback_without_history() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_complete()
            .returning(|_| Err(OracleError::Unavailable("down".into())));
        let mut state = state();
        let reply = respond(&mut state, "hi", &LearningOutcome::NoNote, &oracle, &PromptLibrary::default()).await;
        assert_eq!(reply, FALLBACK_TEXT);
        // Only the preamble remains.
        assert_eq!(state.conversation.len(), 1);
    }
}
