//! WebSocket Session Management
//!
//! - `protocol`: Defines the JSON-based message format for client-server communication.
//! - `session`: Manages the WebSocket connection lifecycle, from handshake to game over.

pub mod protocol;
pub mod session;

pub use session::ws_handler;
