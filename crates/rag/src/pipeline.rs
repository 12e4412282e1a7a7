//! Query facade composing the store, tools, agent, and sessions.
//!
//! This is the boundary the serving layer talks to. Whatever happens
//! underneath, `query` always returns a well-formed answer string and a
//! (possibly empty) source list.

use crate::agent::AgentOrchestrator;
use crate::session::SessionManager;
use crate::store::CourseStore;
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolRegistry};
use coursemate_core::AppConfig;
use coursemate_llm::ChatClient;
use serde::Serialize;
use std::sync::Arc;

/// Corpus statistics for the serving layer.
#[derive(Debug, Clone, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Result of one query through the facade.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<String>,
    /// The session the exchange was recorded under (fresh when the caller
    /// supplied none)
    pub session_id: String,
}

/// Facade over the tool-augmented query pipeline.
pub struct CourseAssistant {
    store: Arc<CourseStore>,
    registry: ToolRegistry,
    orchestrator: AgentOrchestrator,
    sessions: SessionManager,
}

impl CourseAssistant {
    /// Wire the pipeline: registers the retrieval tools over `store` and
    /// configures the orchestrator from `config`.
    pub fn new(store: Arc<CourseStore>, client: Arc<dyn ChatClient>, config: &AppConfig) -> Self {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CourseSearchTool::new(Arc::clone(&store))));
        registry.register(Arc::new(CourseOutlineTool::new(Arc::clone(&store))));

        let orchestrator = AgentOrchestrator::new(
            client,
            &config.model,
            config.temperature,
            config.max_tokens,
        );

        Self {
            store,
            registry,
            orchestrator,
            sessions: SessionManager::new(config.max_history),
        }
    }

    /// Answer one query, threading session history.
    ///
    /// This boundary never fails: orchestrator errors degrade into an
    /// error-mentioning answer with no sources.
    pub async fn query(&self, text: &str, session_id: Option<&str>) -> QueryOutcome {
        let session_id = match session_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.sessions.create_session(),
        };

        let history = self.sessions.get_history(&session_id);

        match self
            .orchestrator
            .generate(text, history.as_deref(), &self.registry)
            .await
        {
            Ok(reply) => {
                if let Err(e) = self.sessions.add_exchange(&session_id, text, &reply.answer) {
                    tracing::warn!("Failed to record exchange: {}", e);
                }
                QueryOutcome {
                    answer: reply.answer,
                    sources: reply.sources,
                    session_id,
                }
            }
            Err(e) => {
                tracing::error!("Query failed: {}", e);
                QueryOutcome {
                    answer: format!(
                        "An error occurred while processing your question: {}",
                        e
                    ),
                    sources: Vec::new(),
                    session_id,
                }
            }
        }
    }

    /// Corpus statistics: course count and titles.
    pub fn get_course_analytics(&self) -> CourseAnalytics {
        CourseAnalytics {
            total_courses: self.store.course_count(),
            course_titles: self.store.course_titles(),
        }
    }

    /// Mint a fresh session id.
    pub fn create_session(&self) -> String {
        self.sessions.create_session()
    }

    /// Drop a session's transcript.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.clear_session(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, CourseChunk, Lesson};
    use coursemate_core::{AppError, AppResult};
    use coursemate_llm::{ChatRequest, ChatResponse, ContentBlock, StopReason};
    use std::sync::Mutex;

    struct MockClient {
        responses: Mutex<Vec<ChatResponse>>,
        requests: Mutex<Vec<ChatRequest>>,
        fail: bool,
    }

    impl MockClient {
        fn scripted(responses: Vec<ChatResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl coursemate_llm::ChatClient for MockClient {
        fn provider_name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(AppError::Llm("Boom".to_string()));
            }
            Ok(self.responses.lock().unwrap().remove(0))
        }
    }

    fn direct_response(text: &str) -> ChatResponse {
        ChatResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
        }
    }

    fn search_tool_response() -> ChatResponse {
        ChatResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![ContentBlock::ToolUse {
                id: "toolu_01".to_string(),
                name: "search_course_content".to_string(),
                input: serde_json::json!({"query": "Python language"}),
            }],
        }
    }

    fn populated_store() -> Arc<CourseStore> {
        let store = Arc::new(CourseStore::with_default_index(5));
        store
            .add_course_metadata(Course {
                title: "Python Basics".to_string(),
                course_link: Some("https://example.com/python".to_string()),
                instructor: Some("Instructor A".to_string()),
                lessons: vec![Lesson {
                    lesson_number: 1,
                    title: "Intro".to_string(),
                    lesson_link: Some("https://example.com/python/1".to_string()),
                }],
            })
            .unwrap();
        store
            .add_course_content(&[CourseChunk {
                content: "Python is a high-level language.".to_string(),
                course_title: "Python Basics".to_string(),
                lesson_number: Some(1),
                chunk_index: 0,
            }])
            .unwrap();
        store
    }

    fn assistant_with(client: MockClient) -> CourseAssistant {
        let mut config = AppConfig::default();
        config.max_history = 2;
        CourseAssistant::new(populated_store(), Arc::new(client), &config)
    }

    #[tokio::test]
    async fn test_query_happy_path() {
        let assistant = assistant_with(MockClient::scripted(vec![direct_response("Hello!")]));
        let outcome = assistant.query("What is Python?", None).await;

        assert_eq!(outcome.answer, "Hello!");
        assert!(outcome.sources.is_empty());
        assert!(!outcome.session_id.is_empty());
    }

    #[tokio::test]
    async fn test_query_with_tool_use_returns_sources() {
        let assistant = assistant_with(MockClient::scripted(vec![
            search_tool_response(),
            direct_response("Python is great."),
        ]));

        let outcome = assistant.query("Tell me about Python", None).await;
        assert_eq!(outcome.answer, "Python is great.");
        assert_eq!(outcome.sources.len(), 1);
        assert!(outcome.sources[0].contains("Python Basics - Lesson 1"));
    }

    #[tokio::test]
    async fn test_query_degrades_gracefully_on_transport_failure() {
        let assistant = assistant_with(MockClient::failing());
        let outcome = assistant.query("trigger error", None).await;

        assert!(outcome.answer.to_lowercase().contains("error"));
        assert!(outcome.answer.contains("Boom"));
        assert!(outcome.sources.is_empty());
    }

    #[tokio::test]
    async fn test_session_threading_across_queries() {
        let client = MockClient::scripted(vec![
            direct_response("First answer"),
            direct_response("Second answer"),
        ]);
        let assistant = assistant_with(client);

        let first = assistant.query("first question", None).await;
        let second = assistant
            .query("second question", Some(&first.session_id))
            .await;

        // Same session id reused, and history recorded in order
        assert_eq!(first.session_id, second.session_id);
        let history = assistant.sessions.get_history(&first.session_id).unwrap();
        assert_eq!(
            history,
            "User: first question\nAssistant: First answer\n\
             User: second question\nAssistant: Second answer"
        );
    }

    #[tokio::test]
    async fn test_failed_query_does_not_pollute_history() {
        let assistant = assistant_with(MockClient::failing());
        let outcome = assistant.query("bad question", None).await;
        assert!(assistant.sessions.get_history(&outcome.session_id).is_none());
    }

    #[tokio::test]
    async fn test_analytics() {
        let assistant = assistant_with(MockClient::scripted(vec![]));
        let analytics = assistant.get_course_analytics();

        assert_eq!(analytics.total_courses, 1);
        assert_eq!(analytics.course_titles, vec!["Python Basics".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_session() {
        let assistant =
            assistant_with(MockClient::scripted(vec![direct_response("answer")]));
        let outcome = assistant.query("question", None).await;
        assert!(assistant.sessions.get_history(&outcome.session_id).is_some());

        assistant.clear_session(&outcome.session_id);
        assert!(assistant.sessions.get_history(&outcome.session_id).is_none());
    }
}
