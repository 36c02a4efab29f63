//! Session Loop
//!
//! A `Classroom` owns one session from setup to its terminal outcome. Each
//! transport feeds it teacher lines and renders the notices it returns; the
//! classroom itself never touches stdin, sockets, or the terminal.

use crate::command::TeacherInput;
use crate::curriculum::CurriculumService;
use crate::dialogue;
use crate::events::EventInjector;
use crate::learning;
use crate::notice::{Notice, SessionOutcome};
use crate::oracle::Oracle;
use crate::prompts::PromptLibrary;
use crate::quiz::{self, QuizResult};
use crate::state::SessionState;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const COMMAND_HELP: &str = "COMMANDS: /image <url>, TEST, QUIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Playing,
    Finished(SessionOutcome),
}

/// One teaching session and everything it needs to advance.
pub struct Classroom {
    oracle: Arc<dyn Oracle>,
    prompts: Arc<PromptLibrary>,
    state: SessionState,
    injector: EventInjector,
    rng: StdRng,
    phase: SessionPhase,
}

impl Classroom {
    pub fn new(oracle: Arc<dyn Oracle>, prompts: Arc<PromptLibrary>, state: SessionState) -> Self {
        Self {
            oracle,
            prompts,
            state,
            injector: EventInjector::default(),
            rng: StdRng::from_os_rng(),
            phase: SessionPhase::Playing,
        }
    }

    /// Replaces the random source, e.g. with a seeded one for replayable sessions.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    #[must_use]
    pub fn with_event_injector(mut self, injector: EventInjector) -> Self {
        self.injector = injector;
        self
    }

    /// Generates the curriculum and test bank for `topic` and opens the session.
    ///
    /// Generation failures degrade to empty material rather than aborting setup.
    pub async fn setup(
        oracle: Arc<dyn Oracle>,
        prompts: Arc<PromptLibrary>,
        curriculum_service: &dyn CurriculumService,
        persona: String,
        topic: String,
    ) -> (Self, Vec<Notice>) {
        info!(%topic, "Setting up classroom");

        let curriculum = curriculum_service
            .generate_curriculum(&topic)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Continuing without a curriculum");
                Vec::new()
            });
        let test_bank = curriculum_service
            .generate_test_bank(&topic, &curriculum)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Continuing without a test bank");
                Vec::new()
            });
        info!(
            facts = curriculum.len(),
            questions = test_bank.len(),
            "Session material ready"
        );

        let mut notices = vec![Notice::system(format!("Curriculum for {}:", topic))];
        notices.extend(
            curriculum
                .iter()
                .map(|fact| Notice::CurriculumFact { text: fact.clone() }),
        );
        if test_bank.is_empty() {
            notices.push(Notice::system(
                "No exam questions could be prepared. Every TEST will fail.",
            ));
        }
        notices.push(Notice::system(format!("TOPIC: {}", topic)));
        notices.push(Notice::system(COMMAND_HELP));

        let state = SessionState::new(persona, topic, curriculum, test_bank);
        (Self::new(oracle, prompts, state), notices)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, SessionPhase::Finished(_))
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.phase {
            SessionPhase::Finished(outcome) => Some(outcome),
            SessionPhase::Playing => None,
        }
    }

    /// Plays one turn with the teacher's raw line and opens the next one.
    ///
    /// The returned notices include anything shown before the next line would
    /// be read, such as the alien countdown.
    pub async fn submit_teacher_line(&mut self, raw: &str) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let SessionPhase::Finished(outcome) = self.phase {
            debug!(?outcome, "Ignoring line for finished session");
            notices.push(Notice::system("The session is over. No further input is accepted."));
            return notices;
        }

        match TeacherInput::parse(raw) {
            Ok(TeacherInput::Quit) => {
                self.finish(SessionOutcome::Quit, &mut notices);
                return notices;
            }
            Ok(TeacherInput::Test) => {
                let report = quiz::run_quiz(
                    &mut self.state,
                    &mut self.rng,
                    self.oracle.as_ref(),
                    &self.prompts,
                    &mut notices,
                )
                .await;
                if report.result == QuizResult::Passed {
                    self.finish(SessionOutcome::Passed, &mut notices);
                    return notices;
                }
            }
            Ok(TeacherInput::Image { url, text }) => {
                notices.push(Notice::system(format!("Attached image {} (Simulated)", url)));
                self.teach(&text, &mut notices).await;
            }
            Ok(TeacherInput::Utterance(text)) => self.teach(&text, &mut notices).await,
            Err(e) => notices.push(Notice::system(e.to_string())),
        }

        if self.state.attempts_left == 0 {
            notices.push(Notice::system("No attempts left. The student flunks out."));
            self.finish(SessionOutcome::Exhausted, &mut notices);
            return notices;
        }

        self.open_turn(&mut notices);
        notices
    }

    async fn teach(&mut self, text: &str, notices: &mut Vec<Notice>) {
        self.injector
            .trigger(
                &mut self.state,
                &mut self.rng,
                self.oracle.as_ref(),
                &self.prompts,
                notices,
            )
            .await;

        let outcome =
            learning::process(&mut self.state, text, self.oracle.as_ref(), &self.prompts, notices)
                .await;
        if let Some(note) = outcome.note() {
            self.state.knowledge_ledger.append(note);
            debug!(notes = self.state.knowledge_ledger.len(), "Note recorded");
        }

        let reply = dialogue::respond(
            &mut self.state,
            text,
            &outcome,
            self.oracle.as_ref(),
            &self.prompts,
        )
        .await;
        notices.push(Notice::student(reply));
    }

    /// Shows and advances the alien countdown before the next line is read.
    fn open_turn(&mut self, notices: &mut Vec<Notice>) {
        if !self.state.alien_active() {
            return;
        }
        notices.push(Notice::AlienDeadline {
            turns: self.state.alien_countdown,
        });
        self.state.alien_countdown -= 1;
        if self.state.alien_countdown == 0 {
            notices.push(Notice::system("EARTH DESTROYED."));
            self.finish(SessionOutcome::EarthDestroyed, notices);
        }
    }

    fn finish(&mut self, outcome: SessionOutcome, notices: &mut Vec<Notice>) {
        info!(?outcome, attempts_left = self.state.attempts_left, "Session finished");
        self.phase = SessionPhase::Finished(outcome);
        notices.push(Notice::SessionOver { outcome });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::{LLMCurriculumService, MockCurriculumService};
    use crate::dialogue::SLEEP_REPLY;
    use crate::events::RandomEvent;
    use crate::oracle::{MockOracle, OracleError, OracleRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn words(n: usize) -> String {
        vec!["blah"; n].join(" ")
    }

    fn system_contains(req: &OracleRequest, needle: &str) -> bool {
        req.system_prompt().is_some_and(|s| s.contains(needle))
    }

    /// Notes echo the teacher, the student always chats back, quizzes always fail.
    fn scripted_oracle(calls: Arc<AtomicUsize>) -> MockOracle {
        let mut oracle = MockOracle::new();
        oracle.expect_complete().returning(move |req| {
            calls.fetch_add(1, Ordering::SeqCst);
            if system_contains(&req, "Current Attention") {
                Ok(format!("note: {}", req.last_user_message().unwrap_or_default()))
            } else if system_contains(&req, "grading a test") {
                Ok("FAIL".to_string())
            } else if system_contains(&req, "TOTAL AMNESIA") {
                Ok("I don't know".to_string())
            } else {
                Ok("Okay, got it!".to_string())
            }
        });
        oracle
    }

    fn classroom(oracle: MockOracle, state: SessionState) -> Classroom {
        Classroom::new(Arc::new(oracle), Arc::new(PromptLibrary::default()), state)
            .with_rng(StdRng::seed_from_u64(42))
            .with_event_injector(EventInjector::disabled())
    }

    fn fresh_state() -> SessionState {
        SessionState::new("Nodder".into(), "Photosynthesis".into(), vec![], vec![])
    }

    fn last_student_line(notices: &[Notice]) -> Option<&str> {
        notices.iter().rev().find_map(|n| match n {
            Notice::Student { text } => Some(text.as_str()),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_scenario_a_short_statement_is_learned() {
        let mut class = classroom(scripted_oracle(Arc::default()), fresh_state());

        let notices = class.submit_teacher_line("Plants eat light for energy").await;

        assert_eq!(class.state().attention_span, 80);
        assert_eq!(class.state().knowledge_ledger.notes(), ["note: Plants eat light for energy"]);
        assert_eq!(last_student_line(&notices), Some("Okay, got it!"));
        assert_eq!(class.phase(), SessionPhase::Playing);
    }

    #[tokio::test]
    async fn test_scenario_b_asleep_student_snores() {
        let mut oracle = MockOracle::new();
        oracle.expect_complete().never();
        let mut state = fresh_state();
        state.is_asleep = true;
        state.knowledge_ledger.append("Chlorophyll is green");
        let mut class = classroom(oracle, state);

        let notices = class.submit_teacher_line("still there?").await;

        assert!(class.state().is_asleep);
        assert_eq!(class.state().knowledge_ledger.notes(), ["Chlorophyll is green"]);
        assert_eq!(last_student_line(&notices), Some(SLEEP_REPLY));
    }

    #[tokio::test]
    async fn test_scenario_c_long_messages_drain_attention() {
        let mut class = classroom(scripted_oracle(Arc::default()), fresh_state());
        let lecture = words(40);

        let mut attention = vec![];
        let mut ledger_sizes = vec![];
        for _ in 0..5 {
            class.submit_teacher_line(&lecture).await;
            attention.push(class.state().attention_span);
            ledger_sizes.push(class.state().knowledge_ledger.len());
        }

        assert_eq!(attention, vec![65, 50, 35, 20, 5]);
        // Exactly 20 still learns; 5 does not.
        assert_eq!(ledger_sizes, vec![1, 2, 3, 4, 4]);
    }

    #[tokio::test]
    async fn test_scenario_d_three_failed_tests_exhaust() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (class, _) = Classroom::setup(
            Arc::new(scripted_oracle(calls.clone())),
            Arc::new(PromptLibrary::default()),
            &MockCurriculumService,
            "Nodder".into(),
            "Photosynthesis".into(),
        )
        .await;
        let mut class = class
            .with_rng(StdRng::seed_from_u64(7))
            .with_event_injector(EventInjector::disabled());

        let mut attempts = vec![];
        let mut last = Vec::new();
        for _ in 0..3 {
            last = class.submit_teacher_line("TEST").await;
            attempts.push(class.state().attempts_left);
        }

        assert_eq!(attempts, vec![2, 1, 0]);
        assert_eq!(class.outcome(), Some(SessionOutcome::Exhausted));
        assert_eq!(
            last.last(),
            Some(&Notice::SessionOver { outcome: SessionOutcome::Exhausted })
        );

        let before = calls.load(Ordering::SeqCst);
        let notices = class.submit_teacher_line("test").await;
        assert_eq!(calls.load(Ordering::SeqCst), before);
        assert!(!notices.iter().any(|n| matches!(n, Notice::Question { .. })));
        assert_eq!(class.state().attempts_left, 0);
    }

    #[tokio::test]
    async fn test_passing_quiz_ends_session() {
        let mut oracle = MockOracle::new();
        oracle.expect_complete().returning(|req| {
            if system_contains(&req, "grading a test") {
                Ok("PASS".to_string())
            } else {
                Ok("The sun feeds the leaf".to_string())
            }
        });
        let mut state = fresh_state();
        state.test_bank = MockCurriculumService
            .generate_test_bank("Photosynthesis", &vec!["fact".to_string(); 4])
            .await
            .unwrap();
        let mut class = classroom(oracle, state);

        let notices = class.submit_teacher_line("test").await;

        assert_eq!(class.outcome(), Some(SessionOutcome::Passed));
        assert_eq!(class.state().attempts_left, 2);
        assert!(notices.contains(&Notice::system("PASSED! You taught them well.")));
    }

    #[tokio::test]
    async fn test_alien_countdown_destroys_earth() {
        let mut state = fresh_state();
        state.test_bank = MockCurriculumService
            .generate_test_bank("Photosynthesis", &["fact".to_string()])
            .await
            .unwrap();
        let mut class = classroom(scripted_oracle(Arc::default()), state)
            .with_event_injector(EventInjector::only(RandomEvent::Alien));

        let first = class.submit_teacher_line("Leaves are green").await;
        assert_eq!(class.state().attempts_left, 1);
        assert!(first.contains(&Notice::AlienDeadline { turns: 3 }));

        let second = class.submit_teacher_line("Roots drink water").await;
        assert!(second.contains(&Notice::AlienDeadline { turns: 2 }));
        assert_eq!(class.phase(), SessionPhase::Playing);

        let third = class.submit_teacher_line("Sunlight matters").await;
        assert!(third.contains(&Notice::AlienDeadline { turns: 1 }));
        assert!(third.contains(&Notice::system("EARTH DESTROYED.")));
        assert_eq!(class.outcome(), Some(SessionOutcome::EarthDestroyed));
    }

    #[tokio::test]
    async fn test_failed_test_under_alien_deadline_exhausts() {
        let mut state = fresh_state();
        state.alien_countdown = 2;
        state.attempts_left = 1;
        let mut class = classroom(scripted_oracle(Arc::default()), state);

        class.submit_teacher_line("TEST").await;

        assert_eq!(class.outcome(), Some(SessionOutcome::Exhausted));
    }

    #[tokio::test]
    async fn test_quit_and_rejected_image() {
        let mut oracle = MockOracle::new();
        oracle.expect_complete().never();
        let mut class = classroom(oracle, fresh_state());

        let notices = class.submit_teacher_line("/image").await;
        assert_eq!(notices, vec![Notice::system("Missing URL.")]);
        assert_eq!(class.state().attention_span, 80);

        let notices = class.submit_teacher_line("Quit").await;
        assert_eq!(notices, vec![Notice::SessionOver { outcome: SessionOutcome::Quit }]);
        assert!(class.is_finished());
    }

    #[tokio::test]
    async fn test_image_is_taught_as_placeholder_text() {
        let mut class = classroom(scripted_oracle(Arc::default()), fresh_state());

        let notices = class.submit_teacher_line("/image http://leaf.png").await;

        assert_eq!(notices[0], Notice::system("Attached image http://leaf.png (Simulated)"));
        assert_eq!(
            class.state().knowledge_ledger.notes(),
            ["note: [Image attached: http://leaf.png]"]
        );
    }

    #[tokio::test]
    async fn test_setup_degrades_when_oracle_is_down() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_complete()
            .returning(|_| Err(OracleError::Unavailable("down".into())));
        let oracle: Arc<dyn Oracle> = Arc::new(oracle);
        let prompts = Arc::new(PromptLibrary::default());
        let service = LLMCurriculumService::new(oracle.clone(), prompts.clone());

        let (class, notices) =
            Classroom::setup(oracle, prompts, &service, "Gaslighter".into(), "Rust".into()).await;

        assert!(class.state().curriculum.is_empty());
        assert!(class.state().test_bank.is_empty());
        assert_eq!(notices.last(), Some(&Notice::system(COMMAND_HELP)));
        assert_eq!(class.phase(), SessionPhase::Playing);
    }

    #[tokio::test]
    async fn test_setup_lists_curriculum() {
        let (class, notices) = Classroom::setup(
            Arc::new(MockOracle::new()),
            Arc::new(PromptLibrary::default()),
            &MockCurriculumService,
            "Literalist".into(),
            "Gravity".into(),
        )
        .await;

        let facts: Vec<_> = notices
            .iter()
            .filter(|n| matches!(n, Notice::CurriculumFact { .. }))
            .collect();
        assert_eq!(facts.len(), 3);
        assert_eq!(class.state().test_bank.len(), 3);
        assert_eq!(class.state().persona, "Literalist");
    }
}
