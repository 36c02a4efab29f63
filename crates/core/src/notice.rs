use serde::Serialize;

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The alien countdown ran out.
    EarthDestroyed,
    /// Every quiz attempt was used without a pass.
    Exhausted,
    /// A quiz was passed.
    Passed,
    /// The teacher quit.
    Quit,
}

impl SessionOutcome {
    pub fn is_success(self) -> bool {
        self == SessionOutcome::Passed
    }
}

/// Everything a classroom emits for a transport to render, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Narration or bookkeeping from the game itself.
    System { text: String },
    /// Something the student says.
    Student { text: String },
    /// A disruptive random event just happened.
    RandomEvent { text: String },
    /// A curriculum fact shown at setup.
    CurriculumFact { text: String },
    /// A quiz question being asked.
    Question { text: String },
    /// The grade for the previous quiz answer.
    Grade { passed: bool },
    /// Turns remaining before the aliens arrive.
    AlienDeadline { turns: i32 },
    /// The session is over; no further input is accepted.
    SessionOver { outcome: SessionOutcome },
}

impl Notice {
    pub fn system(text: impl Into<String>) -> Self {
        Notice::System { text: text.into() }
    }

    pub fn student(text: impl Into<String>) -> Self {
        Notice::Student { text: text.into() }
    }

    pub fn random_event(text: impl Into<String>) -> Self {
        Notice::RandomEvent { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_serialization_is_tagged() {
        let json = serde_json::to_string(&Notice::student("Cool.")).unwrap();
        assert_eq!(json, r#"{"kind":"student","text":"Cool."}"#);

        let json = serde_json::to_string(&Notice::SessionOver {
            outcome: SessionOutcome::EarthDestroyed,
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"session_over","outcome":"earth_destroyed"}"#);
    }

    #[test]
    fn test_only_passed_is_success() {
        assert!(SessionOutcome::Passed.is_success());
        assert!(!SessionOutcome::Quit.is_success());
        assert!(!SessionOutcome::Exhausted.is_success());
        assert!(!SessionOutcome::EarthDestroyed.is_success());
    }
}
