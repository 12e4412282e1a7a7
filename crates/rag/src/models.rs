//! Course data model.
//!
//! These types describe the persisted corpus (produced by external
//! ingestion) and the retrieval response envelope.

use serde::{Deserialize, Serialize};

/// A unit of course content indexed for retrieval.
///
/// Immutable once stored. `lesson_number` may be absent for course-level
/// front matter; that must never be an error when persisted or searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Chunk text
    pub content: String,

    /// Title of the owning course
    pub course_title: String,

    /// Lesson the chunk belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,

    /// Position of the chunk within the course
    pub chunk_index: u32,
}

/// A single lesson within a course. Unique per (course, lesson_number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_link: Option<String>,
}

/// Course outline: title, optional link and instructor, ordered lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Link for a lesson of this course, if recorded.
    pub fn lesson_link(&self, lesson_number: u32) -> Option<&str> {
        self.lessons
            .iter()
            .find(|l| l.lesson_number == lesson_number)
            .and_then(|l| l.lesson_link.as_deref())
    }
}

/// Metadata for one retrieved document, aligned 1:1 with `documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRef {
    pub course_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
    pub chunk_index: u32,
}

/// The retrieval response envelope.
///
/// Invariant: if `error` is set, `documents` / `metadata` / `distances` are
/// empty and must be ignored by callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    /// Retrieved documents, best match first
    pub documents: Vec<String>,

    /// Per-document metadata, aligned with `documents`
    pub metadata: Vec<ChunkRef>,

    /// Per-document distances, aligned with `documents` (smaller is closer)
    pub distances: Vec<f32>,

    /// Set when retrieval itself failed; consumed as ordinary tool content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResults {
    /// Build a normal result set from aligned sequences.
    pub fn new(documents: Vec<String>, metadata: Vec<ChunkRef>, distances: Vec<f32>) -> Self {
        debug_assert_eq!(documents.len(), metadata.len());
        debug_assert_eq!(documents.len(), distances.len());
        Self {
            documents,
            metadata,
            distances,
            error: None,
        }
    }

    /// Build an error result. Sequences are left empty.
    pub fn empty(error_message: impl Into<String>) -> Self {
        Self {
            documents: Vec::new(),
            metadata: Vec::new(),
            distances: Vec::new(),
            error: Some(error_message.into()),
        }
    }

    /// True iff no documents were retrieved.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
