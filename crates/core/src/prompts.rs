//! Prompt Library
//!
//! Every oracle prompt is a Markdown template with `{name}` placeholders. The
//! defaults are compiled into the binary; a prompts directory can override
//! any of them by file stem (e.g. `note_taker.md`).

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Identifies one prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKey {
    Curriculum,
    TestBank,
    StudentSystem,
    NoteTaker,
    TurnState,
    QuizStudent,
    QuizGrader,
    Misconception,
    Eureka,
}

impl PromptKey {
    pub const ALL: [PromptKey; 9] = [
        PromptKey::Curriculum,
        PromptKey::TestBank,
        PromptKey::StudentSystem,
        PromptKey::NoteTaker,
        PromptKey::TurnState,
        PromptKey::QuizStudent,
        PromptKey::QuizGrader,
        PromptKey::Misconception,
        PromptKey::Eureka,
    ];

    /// File stem used when loading overrides from disk.
    pub fn file_stem(self) -> &'static str {
        match self {
            PromptKey::Curriculum => "curriculum",
            PromptKey::TestBank => "test_bank",
            PromptKey::StudentSystem => "student_system",
            PromptKey::NoteTaker => "note_taker",
            PromptKey::TurnState => "turn_state",
            PromptKey::QuizStudent => "quiz_student",
            PromptKey::QuizGrader => "quiz_grader",
            PromptKey::Misconception => "misconception",
            PromptKey::Eureka => "eureka",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            PromptKey::Curriculum => include_str!("../prompts/curriculum.md"),
            PromptKey::TestBank => include_str!("../prompts/test_bank.md"),
            PromptKey::StudentSystem => include_str!("../prompts/student_system.md"),
            PromptKey::NoteTaker => include_str!("../prompts/note_taker.md"),
            PromptKey::TurnState => include_str!("../prompts/turn_state.md"),
            PromptKey::QuizStudent => include_str!("../prompts/quiz_student.md"),
            PromptKey::QuizGrader => include_str!("../prompts/quiz_grader.md"),
            PromptKey::Misconception => include_str!("../prompts/misconception.md"),
            PromptKey::Eureka => include_str!("../prompts/eureka.md"),
        }
    }

    fn from_file_stem(stem: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.file_stem() == stem)
    }
}

/// The full set of prompt templates used by a classroom.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: HashMap<PromptKey, String>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        let templates = PromptKey::ALL
            .into_iter()
            .map(|key| (key, key.embedded().to_string()))
            .collect();
        Self { templates }
    }
}

impl PromptLibrary {
    /// Overrides templates with any `*.md` file in `dir` whose stem names a prompt.
    ///
    /// Unknown files are ignored.
    pub fn with_overrides_from(mut self, dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read prompts directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?;
            if let Some(key) = PromptKey::from_file_stem(stem) {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read prompt {}", path.display()))?;
                info!(prompt = stem, "Loaded prompt override");
                self.templates.insert(key, content);
            }
        }
        Ok(self)
    }

    /// Returns the raw template for `key`.
    pub fn template(&self, key: PromptKey) -> &str {
        self.templates
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.embedded())
    }

    /// Renders `key`, substituting `{name}` placeholders from `vars`.
    pub fn render(&self, key: PromptKey, vars: &[(&str, &str)]) -> String {
        render_template(self.template(key), vars)
    }
}

/// Single-pass placeholder substitution.
///
/// Substituted values are never rescanned, so teacher text containing
/// `{persona}` stays literal. Braces that do not enclose a known name are kept.
fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match replaced {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
