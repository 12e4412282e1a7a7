//! Corpus loader.
//!
//! Ingestion and chunking happen elsewhere; this module only loads their
//! persisted output into the evidence store. The data directory holds:
//! - `courses.json` — the course catalog (array of outlines)
//! - `chunks.jsonl` — one content chunk per line

use crate::models::{Course, CourseChunk};
use crate::store::CourseStore;
use coursemate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// What a load pass brought into the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    pub courses: usize,
    pub chunks: usize,
}

/// Load the persisted corpus from `data_dir` into the store.
///
/// A missing directory is an empty corpus, not an error; malformed files
/// are.
pub fn load_corpus(store: &CourseStore, data_dir: &Path) -> AppResult<CorpusStats> {
    if !data_dir.exists() {
        tracing::warn!("Corpus directory {:?} does not exist; starting empty", data_dir);
        return Ok(CorpusStats {
            courses: 0,
            chunks: 0,
        });
    }

    let courses = load_courses(data_dir)?;
    let course_count = courses.len();
    for course in courses {
        store.add_course_metadata(course)?;
    }

    let chunks = load_chunks(data_dir)?;
    let chunk_count = chunks.len();
    store.add_course_content(&chunks)?;

    tracing::info!(
        "Loaded corpus from {:?}: {} courses, {} chunks",
        data_dir,
        course_count,
        chunk_count
    );

    Ok(CorpusStats {
        courses: course_count,
        chunks: chunk_count,
    })
}

fn load_courses(data_dir: &Path) -> AppResult<Vec<Course>> {
    let path = data_dir.join("courses.json");
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| AppError::Corpus(format!("Failed to read {:?}: {}", path, e)))?;

    serde_json::from_str(&contents)
        .map_err(|e| AppError::Corpus(format!("Failed to parse {:?}: {}", path, e)))
}

fn load_chunks(data_dir: &Path) -> AppResult<Vec<CourseChunk>> {
    let path = data_dir.join("chunks.jsonl");
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(&path)
        .map_err(|e| AppError::Corpus(format!("Failed to open {:?}: {}", path, e)))?;
    let reader = BufReader::new(file);

    let mut chunks = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line =
            line.map_err(|e| AppError::Corpus(format!("Failed to read line {}: {}", line_num + 1, e)))?;

        if line.trim().is_empty() {
            continue;
        }

        let chunk: CourseChunk = serde_json::from_str(&line).map_err(|e| {
            AppError::Corpus(format!(
                "Failed to parse line {} in chunks.jsonl: {}",
                line_num + 1,
                e
            ))
        })?;
        chunks.push(chunk);
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_is_empty_corpus() {
        let store = CourseStore::with_default_index(5);
        let stats = load_corpus(&store, Path::new("/nonexistent/corpus")).unwrap();
        assert_eq!(stats.courses, 0);
        assert_eq!(stats.chunks, 0);
        assert_eq!(store.course_count(), 0);
    }

    #[test]
    fn test_load_courses_and_chunks() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("courses.json"),
            r#"[{"title": "Python Basics", "course_link": "https://example.com",
                 "lessons": [{"lesson_number": 1, "title": "Intro"}]}]"#,
        )
        .unwrap();

        let mut jsonl = File::create(temp.path().join("chunks.jsonl")).unwrap();
        writeln!(
            jsonl,
            r#"{{"content": "Python is a language.", "course_title": "Python Basics", "lesson_number": 1, "chunk_index": 0}}"#
        )
        .unwrap();
        writeln!(
            jsonl,
            r#"{{"content": "Front matter.", "course_title": "Python Basics", "chunk_index": 1}}"#
        )
        .unwrap();

        let store = CourseStore::with_default_index(5);
        let stats = load_corpus(&store, temp.path()).unwrap();

        assert_eq!(stats.courses, 1);
        assert_eq!(stats.chunks, 2);
        assert_eq!(store.course_count(), 1);
        assert_eq!(store.chunk_count(), 2);

        // Chunk without lesson_number loads and is searchable
        let results = store.search("front matter", None, None);
        assert!(results.error.is_none());
        assert!(!results.is_empty());
    }

    #[test]
    fn test_malformed_chunk_line_reports_line_number() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("chunks.jsonl"), "not json\n").unwrap();

        let store = CourseStore::with_default_index(5);
        let err = load_corpus(&store, temp.path()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_empty_directory_loads_nothing() {
        let temp = TempDir::new().unwrap();
        let store = CourseStore::with_default_index(5);
        let stats = load_corpus(&store, temp.path()).unwrap();
        assert_eq!(stats.courses, 0);
        assert_eq!(stats.chunks, 0);
    }
}
