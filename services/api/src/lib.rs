//! Classroom API Library Crate
//!
//! This library contains the web transport for the classroom: configuration,
//! the shared application state, WebSocket session handling, and routing. The
//! `api` binary is a thin wrapper around this library.

pub mod config;
pub mod router;
pub mod state;
pub mod ws;
