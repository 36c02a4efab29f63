//! Random Event Injector
//!
//! Once per turn, before the teacher's words are processed, the classroom may
//! be disrupted. At most one disruptive mode is active at a time: nothing
//! fires while the student sleeps or while the aliens are on their way.

use crate::notice::Notice;
use crate::oracle::{Oracle, OracleMessage, OracleRequest};
use crate::prompts::{PromptKey, PromptLibrary};
use crate::state::{ALIEN_TURNS, SessionState};
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use tracing::{info, warn};

/// Default chance that any event fires on a given turn.
pub const TRIGGER_PROBABILITY: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RandomEvent {
    /// The student falls asleep until woken.
    Nap,
    /// One note is rewritten to be wrong.
    Misconception,
    /// Pass the test within three turns or lose.
    Alien,
    /// Announced, then nothing happens.
    FireDrill,
    /// All notes are synthesized into a new one.
    Eureka,
}

pub const DEFAULT_WEIGHTS: [(RandomEvent, f64); 5] = [
    (RandomEvent::Nap, 0.25),
    (RandomEvent::Misconception, 0.30),
    (RandomEvent::Alien, 0.10),
    (RandomEvent::FireDrill, 0.20),
    (RandomEvent::Eureka, 0.15),
];

/// Selects and applies random events.
#[derive(Debug, Clone)]
pub struct EventInjector {
    trigger_probability: f64,
    weights: Vec<(RandomEvent, f64)>,
}

impl Default for EventInjector {
    fn default() -> Self {
        Self {
            trigger_probability: TRIGGER_PROBABILITY,
            weights: DEFAULT_WEIGHTS.to_vec(),
        }
    }
}

impl EventInjector {
    /// An injector that never fires.
    pub fn disabled() -> Self {
        Self {
            trigger_probability: 0.0,
            weights: DEFAULT_WEIGHTS.to_vec(),
        }
    }

    /// An injector that fires `event` on every eligible turn.
    pub fn only(event: RandomEvent) -> Self {
        Self {
            trigger_probability: 1.0,
            weights: vec![(event, 1.0)],
        }
    }

    /// Decides whether an event fires this turn and which one.
    ///
    /// Always `None` while the student is asleep or an alien countdown runs.
    pub fn roll<R: Rng>(&self, state: &SessionState, rng: &mut R) -> Option<RandomEvent> {
        if state.is_asleep || state.alien_active() {
            return None;
        }
        if rng.random::<f64>() >= self.trigger_probability {
            return None;
        }
        let index = WeightedIndex::new(self.weights.iter().map(|(_, w)| *w)).ok()?;
        Some(self.weights[index.sample(rng)].0)
    }

    /// Rolls for an event and applies it to `state`.
    pub async fn trigger<R: Rng + Send>(
        &self,
        state: &mut SessionState,
        rng: &mut R,
        oracle: &dyn Oracle,
        prompts: &PromptLibrary,
        notices: &mut Vec<Notice>,
    ) -> Option<RandomEvent> {
        let event = self.roll(state, rng)?;
        info!(?event, "Random event fired");
        apply_event(event, state, rng, oracle, prompts, notices).await;
        Some(event)
    }
}

/// Applies `event` to `state`. Oracle failures leave the ledger unchanged.
pub async fn apply_event<R: Rng + Send>(
    event: RandomEvent,
    state: &mut SessionState,
    rng: &mut R,
    oracle: &dyn Oracle,
    prompts: &PromptLibrary,
    notices: &mut Vec<Notice>,
) {
    match event {
        RandomEvent::Nap => {
            state.is_asleep = true;
            notices.push(Notice::random_event(
                "The student just faceplanted. They are ASLEEP.",
            ));
        }
        RandomEvent::Misconception => {
            if state.knowledge_ledger.is_empty() {
                return;
            }
            let index = rng.random_range(0..state.knowledge_ledger.len());
            let original = state.knowledge_ledger.get(index).unwrap_or_default();
            let prompt = prompts.render(PromptKey::Misconception, &[("note", original)]);
            match ask(oracle, prompt).await {
                Some(wrong) => {
                    state.knowledge_ledger.replace(index, wrong);
                    notices.push(Notice::random_event(
                        "The student looks confused... (Memory corrupted!)",
                    ));
                }
                None => warn!(index, "Misconception skipped, ledger unchanged"),
            }
        }
        RandomEvent::Alien => {
            state.alien_countdown = ALIEN_TURNS;
            state.attempts_left = 1;
            notices.push(Notice::random_event(
                "ALIEN INVASION! Pass the TEST in 3 turns or Earth dies.",
            ));
        }
        RandomEvent::FireDrill => {
            notices.push(Notice::random_event(
                "FIRE DRILL! Fortunately nobody implemented a fire drill, so the fire fades away naturally.",
            ));
        }
        RandomEvent::Eureka => {
            if state.knowledge_ledger.len() < 2 {
                return;
            }
            let notes = state.knowledge_ledger.bulleted();
            let prompt = prompts.render(PromptKey::Eureka, &[("notes", notes.as_str())]);
            match ask(oracle, prompt).await {
                Some(insight) => {
                    state.knowledge_ledger.append(insight);
                    notices.push(Notice::random_event(
                        "EUREKA! The student connected the dots.",
                    ));
                }
                None => warn!("Eureka skipped, ledger unchanged"),
            }
        }
    }
}

async fn ask(oracle: &dyn Oracle, prompt: String) -> Option<String> {
    match oracle
        .complete(OracleRequest::text(vec![OracleMessage::user(prompt)]))
        .await
    {
        Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Oracle call for random event failed");
            None
        }
    }
}
