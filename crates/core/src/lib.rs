//! Classroom Core Library
//!
//! The transport-independent engine of the teaching game: the oracle contract
//! and its adapters, session material generation, and the per-turn pipeline
//! (event injector, learning processor, dialogue responder, quiz engine) driven
//! by a single [`engine::Classroom`]. Transports only submit teacher lines and
//! render the [`notice::Notice`]s that come back.

pub mod command;
pub mod config;
pub mod curriculum;
pub mod dialogue;
pub mod engine;
pub mod events;
pub mod learning;
pub mod notice;
pub mod oracle;
pub mod persona;
pub mod prompts;
pub mod quiz;
pub mod state;

pub use engine::{Classroom, SessionPhase};
pub use notice::{Notice, SessionOutcome};
