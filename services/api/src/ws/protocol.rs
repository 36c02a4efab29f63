//! Defines the WebSocket message protocol between the browser client and the API server.

use classroom_core::{notice::Notice, notice::SessionOutcome, persona::Persona};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Sets up the classroom. This must be the first message.
    Init {
        /// A catalog number, an archetype name, or a free-text description.
        #[serde(default)]
        persona: String,
        /// The topic the teacher wants to teach.
        topic: String,
        /// Makes random events and quiz sampling replayable.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// One line from the teacher: an utterance, `/image <url>`, `TEST` or `QUIT`.
    TeacherLine { text: String },
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent on connect so the client can offer the persona menu.
    Welcome { personas: Vec<Persona> },
    /// Confirms the classroom is ready.
    Initialized {
        session_id: Uuid,
        topic: String,
        persona: String,
        curriculum: Vec<String>,
        question_count: usize,
    },
    /// Everything the classroom emitted for one submission, in order.
    Notices { items: Vec<Notice> },
    /// The session has ended; the server closes the socket next.
    GameOver { outcome: SessionOutcome },
    /// Reports a recoverable protocol error to the client.
    Error { message: String },
}
