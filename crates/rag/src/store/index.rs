//! Similarity-search contract and the default in-process backend.
//!
//! The embedding model and nearest-neighbor machinery live behind
//! [`SimilarityIndex`]; the evidence store never sees vectors. The default
//! backend embeds with character trigrams, which is deterministic and
//! offline — suitable for development and tests, replaceable in production
//! deployments.

use crate::models::CourseChunk;
use coursemate_core::{AppError, AppResult};
use std::sync::RwLock;

/// Metadata filter applied to candidate chunks before ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkFilter {
    /// Exact course title (already resolved by the store)
    pub course_title: Option<String>,

    /// Lesson number within the course
    pub lesson_number: Option<u32>,
}

impl ChunkFilter {
    /// True when neither field constrains the search.
    pub fn is_empty(&self) -> bool {
        self.course_title.is_none() && self.lesson_number.is_none()
    }

    /// Both conditions combine with logical AND.
    pub fn matches(&self, chunk: &CourseChunk) -> bool {
        if let Some(ref title) = self.course_title {
            if &chunk.course_title != title {
                return false;
            }
        }
        if let Some(lesson) = self.lesson_number {
            if chunk.lesson_number != Some(lesson) {
                return false;
            }
        }
        true
    }
}

/// One ranked hit from the backend.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: CourseChunk,
    /// Distance, smaller is closer (1 - cosine similarity)
    pub distance: f32,
}

/// Similarity-search contract over content chunks.
///
/// Implementations own the embedding model. Filtered retrieval returns at
/// most `limit` hits ordered by ascending distance; an empty result with no
/// backend failure is normal, not an error.
pub trait SimilarityIndex: Send + Sync {
    /// Persist chunks in the index.
    fn add_chunks(&self, chunks: &[CourseChunk]) -> AppResult<()>;

    /// Retrieve the closest chunks to `text`, optionally filtered.
    fn query(
        &self,
        text: &str,
        limit: usize,
        filter: Option<&ChunkFilter>,
    ) -> AppResult<Vec<ScoredChunk>>;

    /// Number of chunks currently indexed.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const EMBEDDING_DIM: usize = 384;

/// In-process trigram-embedding index.
///
/// Embeds text with character trigrams and word hashes into a normalized
/// vector. Not semantically accurate like a neural model, but consistent
/// and content-dependent.
pub struct TrigramIndex {
    entries: RwLock<Vec<(CourseChunk, Vec<f32>)>>,
    dimensions: usize,
}

impl TrigramIndex {
    pub fn new() -> Self {
        Self::with_dimensions(EMBEDDING_DIM)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            dimensions,
        }
    }

    /// Generate a trigram-based embedding for text.
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let lower = text.to_lowercase();

        // Filter stop words for better discrimination
        let stop_words: std::collections::HashSet<&str> = [
            "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to",
            "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have",
            "has", "had", "it", "its", "their", "they", "them",
        ]
        .iter()
        .copied()
        .collect();

        let words: Vec<&str> = lower
            .split_whitespace()
            .filter(|w| !stop_words.contains(w) && w.len() > 2)
            .collect();

        let mut word_freq = std::collections::HashMap::new();
        for word in &words {
            *word_freq.entry(*word).or_insert(0u32) += 1;
        }

        for (word, freq) in word_freq.iter() {
            // Character trigrams spread each word over several dimensions
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram = format!("{}{}{}", chars[i], chars[i + 1], chars[i + 2]);
                let trigram_hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

                let dim_idx = (trigram_hash as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            // Also encode the whole word
            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

impl Default for TrigramIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

impl SimilarityIndex for TrigramIndex {
    fn add_chunks(&self, chunks: &[CourseChunk]) -> AppResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AppError::Other("similarity index lock poisoned".to_string()))?;

        for chunk in chunks {
            let embedding = self.embed(&chunk.content);
            entries.push((chunk.clone(), embedding));
        }

        tracing::debug!("Indexed {} chunks ({} total)", chunks.len(), entries.len());
        Ok(())
    }

    fn query(
        &self,
        text: &str,
        limit: usize,
        filter: Option<&ChunkFilter>,
    ) -> AppResult<Vec<ScoredChunk>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AppError::Other("similarity index lock poisoned".to_string()))?;

        let query_embedding = self.embed(text);

        let mut hits: Vec<ScoredChunk> = entries
            .iter()
            .filter(|(chunk, _)| filter.map(|f| f.matches(chunk)).unwrap_or(true))
            .map(|(chunk, embedding)| ScoredChunk {
                chunk: chunk.clone(),
                distance: 1.0 - cosine(&query_embedding, embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        Ok(hits)
    }

    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}
