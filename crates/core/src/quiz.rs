//! Quiz Engine
//!
//! One quiz attempt: consume an attempt, sample up to six questions, let the
//! student answer strictly from their notebook, and have a separate strict
//! grader mark each answer.

use crate::notice::Notice;
use crate::oracle::{Oracle, OracleMessage, OracleRequest, complete_or_fallback};
use crate::prompts::{PromptKey, PromptLibrary};
use crate::state::{SessionState, TestQuestion};
use rand::Rng;
use rand::seq::index;
use tracing::info;

/// Maximum number of questions asked per attempt.
pub const QUIZ_SIZE: usize = 6;
const GRADER_SYSTEM: &str = "You are a strict teacher grading a test.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizResult {
    Passed,
    Failed,
}

/// Summary of one quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizReport {
    pub score: usize,
    pub asked: usize,
    pub result: QuizResult,
}

/// The pass rule: at most one miss, but at least one correct answer.
///
/// A single-question quiz must be answered correctly and an empty quiz never
/// passes.
pub fn passes(score: usize, asked: usize) -> bool {
    score >= asked.saturating_sub(1).max(1)
}

/// True when a grader reply counts as a pass.
pub fn is_pass_grade(grade: &str) -> bool {
    grade.to_uppercase().contains("PASS")
}

/// Draws `min(QUIZ_SIZE, bank size)` distinct questions in random order.
pub fn sample_questions<R: Rng>(bank: &[TestQuestion], rng: &mut R) -> Vec<TestQuestion> {
    let amount = QUIZ_SIZE.min(bank.len());
    index::sample(rng, bank.len(), amount)
        .into_iter()
        .map(|i| bank[i].clone())
        .collect()
}

/// Runs one quiz attempt against the student's current notebook.
///
/// The attempt is consumed on entry, whatever the outcome. An empty test bank
/// cannot be passed.
pub async fn run_quiz<R: Rng + Send>(
    state: &mut SessionState,
    rng: &mut R,
    oracle: &dyn Oracle,
    prompts: &PromptLibrary,
    notices: &mut Vec<Notice>,
) -> QuizReport {
    state.attempts_left = state.attempts_left.saturating_sub(1);
    notices.push(Notice::system("--- FINAL EXAM INITIATED ---"));

    if state.test_bank.is_empty() {
        notices.push(Notice::system(
            "There are no exam questions, so this attempt cannot be passed.",
        ));
        notices.push(failed_summary(state.attempts_left));
        info!(attempts_left = state.attempts_left, "Quiz failed on empty test bank");
        return QuizReport {
            score: 0,
            asked: 0,
            result: QuizResult::Failed,
        };
    }

    let quiz = sample_questions(&state.test_bank, rng);
    let notes = state.knowledge_ledger.notes().join("\n");
    notices.push(Notice::system(format!(
        "[INFO] Student's Brain Dump:\n{}\n",
        notes
    )));

    let student_system = prompts.render(
        PromptKey::QuizStudent,
        &[("notes", notes.as_str()), ("persona", state.persona.as_str())],
    );

    let mut score = 0;
    for question in &quiz {
        notices.push(Notice::Question {
            text: question.question.clone(),
        });

        let answer = complete_or_fallback(
            oracle,
            OracleRequest::text(vec![
                OracleMessage::system(student_system.clone()),
                OracleMessage::user(question.question.clone()),
            ]),
        )
        .await;
        notices.push(Notice::student(format!("Answer: {}", answer)));

        let grading = prompts.render(
            PromptKey::QuizGrader,
            &[
                ("question", question.question.as_str()),
                ("standard_answer", question.standard_answer.as_str()),
                ("answer", answer.as_str()),
            ],
        );
        let grade = complete_or_fallback(
            oracle,
            OracleRequest::text(vec![
                OracleMessage::system(GRADER_SYSTEM),
                OracleMessage::user(grading),
            ]),
        )
        .await;

        let passed = is_pass_grade(&grade);
        if passed {
            score += 1;
        }
        notices.push(Notice::Grade { passed });
    }

    let asked = quiz.len();
    let result = if passes(score, asked) {
        notices.push(Notice::system("PASSED! You taught them well."));
        QuizResult::Passed
    } else {
        notices.push(failed_summary(state.attempts_left));
        QuizResult::Failed
    };
    info!(score, asked, ?result, attempts_left = state.attempts_left, "Quiz finished");

    QuizReport {
        score,
        asked,
        result,
    }
}

fn failed_summary(attempts_left: u32) -> Notice {
    Notice::system(format!("FAILED. Attempts left: {}", attempts_left))
}
