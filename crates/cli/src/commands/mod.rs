//! Command handlers for the Coursemate CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod courses;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use courses::CoursesCommand;

use coursemate_core::{AppConfig, AppResult};
use coursemate_llm::create_client;
use coursemate_rag::{loader, CourseAssistant, CourseStore};
use std::sync::Arc;

/// Build the query facade: load the corpus and wire the chat client.
pub(crate) fn build_assistant(config: &AppConfig) -> AppResult<CourseAssistant> {
    config.validate()?;

    let store = Arc::new(CourseStore::with_default_index(config.max_results));
    let stats = loader::load_corpus(&store, &config.data_dir)?;
    tracing::info!(
        "Corpus ready: {} courses, {} chunks",
        stats.courses,
        stats.chunks
    );

    let client = create_client(
        &config.provider,
        config.endpoint.as_deref(),
        config.api_key.as_deref(),
    )?;

    Ok(CourseAssistant::new(store, client, config))
}
