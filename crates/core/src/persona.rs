//! Student Persona Catalog
//!
//! Five ready-made archetypes plus free-text custom personas.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::Serialize;

/// A named student archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Persona {
    pub name: &'static str,
    pub description: &'static str,
}

impl Persona {
    /// The persona text handed to the oracle.
    pub fn prompt_text(&self) -> String {
        format!("The '{}': {}", self.name, self.description)
    }
}

pub const CATALOG: [Persona; 5] = [
    Persona {
        name: "Literalist",
        description: "Writes down exactly what you say, word for word. If you joke, they treat it as fact. Zero nuance.",
    },
    Persona {
        name: "Nodder",
        description: "Understands NOTHING but never asks questions. Just says 'Okay' or 'Got it' to end the conversation, unless directly prompted by the teacher to do otherwise.",
    },
    Persona {
        name: "Try-Hard",
        description: "Hyper-enthusiastic, constantly flexing irrelevant knowledge, annoying buzzwords.",
    },
    Persona {
        name: "Rabbit Hole",
        description: "Constantly asks 'But why?' or 'So what?' about minor details, trying to derail the topic.",
    },
    Persona {
        name: "Gaslighter",
        description: "Intentionally misinterprets ambiguous sentences to make you look wrong.",
    },
];

/// Menu option that asks for a free-text persona.
pub const CUSTOM_CHOICE: &str = "6";

/// Resolves a teacher's persona selection to the persona text used in prompts.
///
/// Accepts a catalog number (`1`-`5`), an archetype name (fuzzy matched), or a
/// free-text description. Blank input selects the first archetype. A name
/// query must cover at least 60% of the archetype's letters, so short free
/// text such as `rat` stays a custom description.
pub fn resolve_persona(choice: &str) -> String {
    let choice = choice.trim();
    if choice.is_empty() {
        return CATALOG[0].prompt_text();
    }
    if let Ok(index) = choice.parse::<usize>() {
        return CATALOG
            .get(index.wrapping_sub(1))
            .unwrap_or(&CATALOG[0])
            .prompt_text();
    }
    match match_archetype(choice) {
        Some(persona) => persona.prompt_text(),
        None => choice.to_string(),
    }
}

fn match_archetype(query: &str) -> Option<&'static Persona> {
    let matcher = SkimMatcherV2::default().ignore_case();
    let query_len = letter_count(query);
    CATALOG
        .iter()
        .filter(|p| query_len * 5 >= letter_count(p.name) * 3)
        .filter_map(|p| matcher.fuzzy_match(p.name, query).map(|score| (score, p)))
        .max_by_key(|(score, _)| *score)
        .map(|(_, p)| p)
}

fn letter_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphanumeric()).count()
}
