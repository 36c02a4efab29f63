//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the shared,
//! immutable resources every classroom session is built from.

use crate::config::Config;
use classroom_core::{curriculum::CurriculumService, oracle::Oracle, prompts::PromptLibrary};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Sessions never store anything here; each connection owns its classroom.
#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<dyn Oracle>,
    pub prompts: Arc<PromptLibrary>,
    pub curriculum_service: Arc<dyn CurriculumService>,
    pub config: Arc<Config>,
}
