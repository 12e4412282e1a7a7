//! Evidence store: filtered retrieval plus course metadata lookups.
//!
//! `CourseStore` owns all persisted chunks and course outlines, and is the
//! sole authority for search. It never raises past its boundary: retrieval
//! failures become an error-carrying [`SearchResults`] consumed by the agent
//! as ordinary content.

pub mod index;

pub use index::{ChunkFilter, ScoredChunk, SimilarityIndex, TrigramIndex};

use crate::models::{ChunkRef, Course, CourseChunk, SearchResults};
use coursemate_core::{AppError, AppResult};
use std::sync::RwLock;

/// Evidence store over a similarity-search backend and a course catalog.
pub struct CourseStore {
    catalog: RwLock<Vec<Course>>,
    index: Box<dyn SimilarityIndex>,
    max_results: usize,
}

impl CourseStore {
    /// Create a store over an explicit backend.
    pub fn new(index: Box<dyn SimilarityIndex>, max_results: usize) -> Self {
        Self {
            catalog: RwLock::new(Vec::new()),
            index,
            max_results,
        }
    }

    /// Create a store over the default in-process trigram backend.
    pub fn with_default_index(max_results: usize) -> Self {
        Self::new(Box::new(TrigramIndex::new()), max_results)
    }

    /// Register (or replace) a course outline.
    pub fn add_course_metadata(&self, course: Course) -> AppResult<()> {
        let mut catalog = self
            .catalog
            .write()
            .map_err(|_| AppError::Other("course catalog lock poisoned".to_string()))?;

        catalog.retain(|c| c.title != course.title);
        tracing::debug!("Registered course '{}'", course.title);
        catalog.push(course);
        Ok(())
    }

    /// Persist content chunks in the similarity backend.
    ///
    /// Chunks with absent lesson numbers are stored like any other.
    pub fn add_course_content(&self, chunks: &[CourseChunk]) -> AppResult<()> {
        self.index.add_chunks(chunks)
    }

    /// Filtered nearest-neighbor search.
    ///
    /// Never returns an error: an unresolvable course name or a backend
    /// failure yields an error-carrying `SearchResults` instead.
    pub fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name) {
                Some(title) => Some(title),
                None => {
                    return SearchResults::empty(format!("No course found matching '{}'", name))
                }
            },
            None => None,
        };

        let filter = ChunkFilter {
            course_title,
            lesson_number,
        };
        let filter = if filter.is_empty() {
            None
        } else {
            Some(filter)
        };

        match self.index.query(query, self.max_results, filter.as_ref()) {
            Ok(hits) => {
                tracing::debug!("Search for '{}' returned {} hits", query, hits.len());

                let mut documents = Vec::with_capacity(hits.len());
                let mut metadata = Vec::with_capacity(hits.len());
                let mut distances = Vec::with_capacity(hits.len());

                for hit in hits {
                    documents.push(hit.chunk.content);
                    metadata.push(ChunkRef {
                        course_title: hit.chunk.course_title,
                        lesson_number: hit.chunk.lesson_number,
                        chunk_index: hit.chunk.chunk_index,
                    });
                    distances.push(hit.distance);
                }

                SearchResults::new(documents, metadata, distances)
            }
            Err(e) => {
                tracing::warn!("Search backend failed: {}", e);
                SearchResults::empty(format!("Search error: {}", e))
            }
        }
    }

    /// Resolve a free-form course name to a stored title.
    ///
    /// Tries exact match, case-insensitive match, substring containment,
    /// then best word overlap.
    fn resolve_course_name(&self, name: &str) -> Option<String> {
        let catalog = self.catalog.read().ok()?;

        if let Some(course) = catalog.iter().find(|c| c.title == name) {
            return Some(course.title.clone());
        }

        let name_lower = name.to_lowercase();
        if let Some(course) = catalog
            .iter()
            .find(|c| c.title.to_lowercase() == name_lower)
        {
            return Some(course.title.clone());
        }

        if let Some(course) = catalog.iter().find(|c| {
            let title_lower = c.title.to_lowercase();
            title_lower.contains(&name_lower) || name_lower.contains(&title_lower)
        }) {
            return Some(course.title.clone());
        }

        let name_words: Vec<&str> = name_lower.split_whitespace().collect();
        catalog
            .iter()
            .map(|c| {
                let title_lower = c.title.to_lowercase();
                let overlap = name_words
                    .iter()
                    .filter(|w| title_lower.split_whitespace().any(|t| t == **w))
                    .count();
                (c, overlap)
            })
            .filter(|(_, overlap)| *overlap > 0)
            .max_by_key(|(_, overlap)| *overlap)
            .map(|(c, _)| c.title.clone())
    }

    /// Link for a lesson, if recorded. Pure lookup, absence is not failure.
    pub fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        let catalog = self.catalog.read().ok()?;
        catalog
            .iter()
            .find(|c| c.title == course_title)
            .and_then(|c| c.lesson_link(lesson_number))
            .map(|s| s.to_string())
    }

    /// Full outline for a course, resolved by fuzzy name.
    pub fn get_course_outline(&self, name: &str) -> Option<Course> {
        let title = self.resolve_course_name(name)?;
        let catalog = self.catalog.read().ok()?;
        catalog.iter().find(|c| c.title == title).cloned()
    }

    /// Number of registered courses.
    pub fn course_count(&self) -> usize {
        self.catalog.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Titles of all registered courses, in registration order.
    pub fn course_titles(&self) -> Vec<String> {
        self.catalog
            .read()
            .map(|c| c.iter().map(|course| course.title.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of indexed chunks.
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }
}
