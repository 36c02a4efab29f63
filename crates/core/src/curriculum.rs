//! Curriculum Generation Service
//!
//! This module produces the read-only material a session starts with: a short
//! list of atomic facts about the topic and a bank of exam questions. It runs
//! once, during setup, before the first teacher turn.

use crate::oracle::{Oracle, OracleMessage, OracleRequest};
use crate::prompts::{PromptKey, PromptLibrary};
use crate::state::TestQuestion;
use anyhow::{Context, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum number of curriculum facts kept.
pub const MAX_FACTS: usize = 5;
/// Maximum number of exam questions kept.
pub const MAX_QUESTIONS: usize = 10;

/// The JSON document the oracle is asked to produce for the test bank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TestBank {
    #[serde(default)]
    pub questions: Vec<TestQuestion>,
}

/// Defines the contract for any service that can generate session material.
///
/// This abstraction allows the system to swap between an oracle-backed
/// generator and a static one while keeping setup identical.
#[async_trait]
pub trait CurriculumService: Send + Sync {
    /// Generates up to `MAX_FACTS` short facts about `topic`.
    async fn generate_curriculum(&self, topic: &str) -> Result<Vec<String>>;

    /// Generates up to `MAX_QUESTIONS` exam questions grounded in `curriculum`.
    async fn generate_test_bank(
        &self,
        topic: &str,
        curriculum: &[String],
    ) -> Result<Vec<TestQuestion>>;
}

/// An implementation of `CurriculumService` that asks the oracle.
pub struct LLMCurriculumService {
    oracle: Arc<dyn Oracle>,
    prompts: Arc<PromptLibrary>,
}

impl LLMCurriculumService {
    pub fn new(oracle: Arc<dyn Oracle>, prompts: Arc<PromptLibrary>) -> Self {
        Self { oracle, prompts }
    }
}

#[async_trait]
impl CurriculumService for LLMCurriculumService {
    async fn generate_curriculum(&self, topic: &str) -> Result<Vec<String>> {
        let prompt = self
            .prompts
            .render(PromptKey::Curriculum, &[("topic", topic)]);
        let request = OracleRequest::text(vec![
            OracleMessage::system("Curriculum Generator."),
            OracleMessage::user(prompt),
        ]);
        let answer = self
            .oracle
            .complete(request)
            .await
            .context("Curriculum generation failed")?;
        Ok(parse_facts(&answer))
    }

    async fn generate_test_bank(
        &self,
        topic: &str,
        curriculum: &[String],
    ) -> Result<Vec<TestQuestion>> {
        let curriculum_json = serde_json::to_string(curriculum)?;
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(TestBank))?;
        let prompt = self.prompts.render(
            PromptKey::TestBank,
            &[
                ("topic", topic),
                ("curriculum", curriculum_json.as_str()),
                ("schema", schema.as_str()),
            ],
        );
        let request = OracleRequest::json(vec![OracleMessage::user(prompt)]);
        let raw = self
            .oracle
            .complete(request)
            .await
            .context("Test bank generation failed")?;
        parse_test_bank(&raw)
    }
}

/// Keeps the first `MAX_FACTS` non-empty lines, without list markers.
pub fn parse_facts(answer: &str) -> Vec<String> {
    answer
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .take(MAX_FACTS)
        .collect()
}

/// Parses the oracle's JSON test bank, dropping questions with no text.
pub fn parse_test_bank(raw: &str) -> Result<Vec<TestQuestion>> {
    let bank: TestBank =
        serde_json::from_str(raw.trim()).context("Test bank response was not valid JSON")?;
    Ok(bank
        .questions
        .into_iter()
        .filter(|q| !q.question.trim().is_empty())
        .take(MAX_QUESTIONS)
        .collect())
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let without_number = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if without_number.len() < line.len() {
        if let Some(rest) = without_number
            .strip_prefix('.')
            .or_else(|| without_number.strip_prefix(')'))
        {
            return rest.trim();
        }
        return line;
    }
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim)
        .unwrap_or(line)
}

/// A static `CurriculumService` for development and integration testing.
///
/// Always produces the same facts and questions, so sessions built on it are
/// reproducible without any oracle traffic.
pub struct MockCurriculumService;

#[async_trait]
impl CurriculumService for MockCurriculumService {
    async fn generate_curriculum(&self, topic: &str) -> Result<Vec<String>> {
        Ok(vec![
            format!("{} has a definition", topic),
            format!("{} has a mechanism", topic),
            format!("{} has an example", topic),
        ])
    }

    async fn generate_test_bank(
        &self,
        topic: &str,
        curriculum: &[String],
    ) -> Result<Vec<TestQuestion>> {
        Ok(curriculum
            .iter()
            .enumerate()
            .map(|(i, fact)| TestQuestion {
                difficulty: "easy".to_string(),
                question: format!("Question {} about {}?", i + 1, topic),
                standard_answer: fact.clone(),
            })
            .collect())
    }
}
