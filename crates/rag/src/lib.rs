//! Tool-augmented query pipeline for course materials.
//!
//! This crate implements the core of Coursemate: an agent loop that decides
//! between answering directly and invoking retrieval over a corpus of
//! pre-chunked course content, plus the session history that threads
//! multi-turn conversations.
//!
//! Control flow: [`pipeline::CourseAssistant`] → [`agent::AgentOrchestrator`]
//! → (maybe) [`tools::CourseSearchTool`] → [`store::CourseStore`]; results
//! flow back up, and the facade persists the turn into
//! [`session::SessionManager`].

pub mod agent;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod tools;

// Re-export commonly used types
pub use models::{ChunkRef, Course, CourseChunk, Lesson, SearchResults};
pub use pipeline::{CourseAnalytics, CourseAssistant, QueryOutcome};
pub use store::CourseStore;
