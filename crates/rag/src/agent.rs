//! Agent orchestration loop.
//!
//! Drives one query through at most two LLM round-trips: the first offers
//! the tool schemas, and if the model requests tool use, every requested
//! invocation is executed and folded into a single follow-up request that
//! does not re-offer tools. This bounds each query to a fixed depth
//! regardless of how many tool blocks the model emits.

use crate::tools::ToolRegistry;
use coursemate_core::AppResult;
use coursemate_llm::{ChatClient, ChatRequest, ContentBlock, Message, StopReason};
use std::sync::Arc;

/// Base instructions for the course assistant.
const SYSTEM_PROMPT: &str = "\
You are an AI assistant for course materials. You answer questions about \
courses, lessons, and their content.

Tool usage:
- Use the search tool for questions about specific course content
- Use the outline tool for questions about course structure, lesson lists, or links
- Make at most one round of tool calls per question
- If a search returns nothing relevant, say so plainly

Answering:
- Be brief, concise and focused
- Do not mention the search process or the tools in your answer
- For general knowledge questions, answer from your own knowledge without searching";

/// Final output of one orchestrated query.
#[derive(Debug, Clone)]
pub struct AgentReply {
    /// The model's final answer text
    pub answer: String,

    /// Citations from every tool executed for this query, in invocation
    /// order, deduplicated
    pub sources: Vec<String>,
}

/// Drives the two-round conversation state machine over a `ChatClient`.
pub struct AgentOrchestrator {
    client: Arc<dyn ChatClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AgentOrchestrator {
    pub fn new(
        client: Arc<dyn ChatClient>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    fn base_request(&self, system: &str) -> ChatRequest {
        ChatRequest::new(&self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_system(system)
    }

    /// Answer one query, running at most one tool round.
    ///
    /// Transport failures propagate to the caller; recovery lives in the
    /// query facade.
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        registry: &ToolRegistry,
    ) -> AppResult<AgentReply> {
        let system = match history {
            Some(history) => format!("{}\n\nPrevious conversation:\n{}", SYSTEM_PROMPT, history),
            None => SYSTEM_PROMPT.to_string(),
        };

        let mut messages = vec![Message::user_text(query)];

        let mut request = self.base_request(&system).with_messages(messages.clone());
        let schemas = registry.schemas();
        if !schemas.is_empty() {
            request = request.with_tools(schemas);
        }

        let response = self.client.complete(&request).await?;

        let tool_uses = response.tool_uses();
        if response.stop_reason != StopReason::ToolUse || tool_uses.is_empty() {
            tracing::debug!("Direct answer, no tool round");
            return Ok(AgentReply {
                answer: response.first_text().unwrap_or_default().to_string(),
                sources: Vec::new(),
            });
        }

        tracing::info!("Model requested {} tool invocation(s)", tool_uses.len());

        // Execute every requested invocation; one result block per id
        let mut results = Vec::with_capacity(tool_uses.len());
        let mut sources = Vec::new();
        for (id, name, input) in tool_uses {
            let output = registry.execute(name, input);
            for source in output.sources {
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
            results.push(ContentBlock::ToolResult {
                tool_use_id: id.to_string(),
                content: output.content,
            });
        }

        messages.push(Message::assistant(response.content.clone()));
        messages.push(Message::tool_results(results));

        // Second round never re-offers tools
        let followup = self.base_request(&system).with_messages(messages);
        let final_response = self.client.complete(&followup).await?;

        Ok(AgentReply {
            answer: final_response.first_text().unwrap_or_default().to_string(),
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolOutput};
    use coursemate_core::{AppError, AppResult};
    use coursemate_llm::{ChatResponse, ToolSchema};
    use std::sync::Mutex;

    /// Scripted chat client recording every request it receives.
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

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatClient for MockClient {
        fn provider_name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(AppError::Llm("Boom".to_string()));
            }
            let mut responses = self.responses.lock().unwrap();
            Ok(responses.remove(0))
        }
    }

    /// Tool double recording the arguments it was invoked with.
    struct RecordingTool {
        calls: Mutex<Vec<serde_json::Value>>,
        output: ToolOutput,
    }

    impl RecordingTool {
        fn new(content: &str, sources: Vec<&str>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                output: ToolOutput {
                    content: content.to_string(),
                    sources: sources.into_iter().map(String::from).collect(),
                },
            }
        }
    }

    impl Tool for RecordingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "search_course_content".to_string(),
                description: "test tool".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {"query": {"type": "string"}},
                    "required": ["query"],
                }),
            }
        }

        fn execute(&self, args: &serde_json::Value) -> ToolOutput {
            self.calls.lock().unwrap().push(args.clone());
            self.output.clone()
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

    fn tool_use_response(id: &str, input: serde_json::Value) -> ChatResponse {
        ChatResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![ContentBlock::ToolUse {
                id: id.to_string(),
                name: "search_course_content".to_string(),
                input,
            }],
        }
    }

    fn registry_with(tool: Arc<RecordingTool>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(tool);
        registry
    }

    #[tokio::test]
    async fn test_direct_response_single_round_trip() {
        let client = Arc::new(MockClient::scripted(vec![direct_response("Hello world")]));
        let orchestrator = AgentOrchestrator::new(client.clone(), "claude-test", 0.0, 800);
        let registry = registry_with(Arc::new(RecordingTool::new("unused", vec![])));

        let reply = orchestrator
            .generate("What is 2+2?", None, &registry)
            .await
            .unwrap();

        assert_eq!(reply.answer, "Hello world");
        assert!(reply.sources.is_empty());
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_history_embedded_in_system_prompt() {
        let client = Arc::new(MockClient::scripted(vec![direct_response("ok")]));
        let orchestrator = AgentOrchestrator::new(client.clone(), "claude-test", 0.0, 800);
        let registry = ToolRegistry::new();

        orchestrator
            .generate("Follow-up", Some("User: Hi\nAssistant: Hello"), &registry)
            .await
            .unwrap();

        let system = client.requests()[0].system.clone().unwrap();
        assert!(system.contains("Previous conversation:"));
        assert!(system.contains("User: Hi"));
    }

    #[tokio::test]
    async fn test_no_history_leaves_system_prompt_bare() {
        let client = Arc::new(MockClient::scripted(vec![direct_response("ok")]));
        let orchestrator = AgentOrchestrator::new(client.clone(), "claude-test", 0.0, 800);

        orchestrator
            .generate("First question", None, &ToolRegistry::new())
            .await
            .unwrap();

        let system = client.requests()[0].system.clone().unwrap();
        assert!(!system.contains("Previous conversation"));
    }

    #[tokio::test]
    async fn test_tool_invoked_with_model_supplied_arguments() {
        let client = Arc::new(MockClient::scripted(vec![
            tool_use_response("toolu_01", serde_json::json!({"query": "basics"})),
            direct_response("Here are the results."),
        ]));
        let orchestrator = AgentOrchestrator::new(client, "claude-test", 0.0, 800);
        let tool = Arc::new(RecordingTool::new("search result text", vec![]));
        let registry = registry_with(tool.clone());

        orchestrator
            .generate("What is Python?", None, &registry)
            .await
            .unwrap();

        let calls = tool.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], serde_json::json!({"query": "basics"}));
    }

    #[tokio::test]
    async fn test_tool_round_issues_two_calls_and_omits_tools() {
        let client = Arc::new(MockClient::scripted(vec![
            tool_use_response("toolu_abc", serde_json::json!({"query": "x"})),
            direct_response("Final answer"),
        ]));
        let orchestrator = AgentOrchestrator::new(client.clone(), "claude-test", 0.0, 800);
        let registry = registry_with(Arc::new(RecordingTool::new("tool output", vec![])));

        let reply = orchestrator.generate("Q", None, &registry).await.unwrap();
        assert_eq!(reply.answer, "Final answer");

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].tools.is_some());
        assert!(requests[1].tools.is_none());
    }

    #[tokio::test]
    async fn test_tool_result_message_shape() {
        let client = Arc::new(MockClient::scripted(vec![
            tool_use_response("toolu_abc", serde_json::json!({"query": "x"})),
            direct_response("Final answer"),
        ]));
        let orchestrator = AgentOrchestrator::new(client.clone(), "claude-test", 0.0, 800);
        let registry = registry_with(Arc::new(RecordingTool::new("tool output", vec![])));

        orchestrator.generate("Q", None, &registry).await.unwrap();

        let second = &client.requests()[1];
        // messages: [user query, assistant tool request, user tool results]
        assert_eq!(second.messages.len(), 3);

        let assistant = &second.messages[1];
        assert!(matches!(
            assistant.content[0],
            ContentBlock::ToolUse { ref id, .. } if id == "toolu_abc"
        ));

        let result_msg = &second.messages[2];
        match &result_msg.content[0] {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
            } => {
                assert_eq!(tool_use_id, "toolu_abc");
                assert_eq!(content, "tool output");
            }
            other => panic!("expected tool result block, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_tool_blocks_fold_into_one_followup() {
        let client = Arc::new(MockClient::scripted(vec![
            ChatResponse {
                stop_reason: StopReason::ToolUse,
                content: vec![
                    ContentBlock::ToolUse {
                        id: "toolu_01".to_string(),
                        name: "search_course_content".to_string(),
                        input: serde_json::json!({"query": "a"}),
                    },
                    ContentBlock::ToolUse {
                        id: "toolu_02".to_string(),
                        name: "search_course_content".to_string(),
                        input: serde_json::json!({"query": "b"}),
                    },
                ],
            },
            direct_response("combined"),
        ]));
        let orchestrator = AgentOrchestrator::new(client.clone(), "claude-test", 0.0, 800);
        let tool = Arc::new(RecordingTool::new("out", vec!["Course - Lesson 1"]));
        let registry = registry_with(tool.clone());

        let reply = orchestrator.generate("Q", None, &registry).await.unwrap();

        assert_eq!(tool.calls.lock().unwrap().len(), 2);
        assert_eq!(client.requests().len(), 2);

        let results = &client.requests()[1].messages[2].content;
        assert_eq!(results.len(), 2);
        // Duplicate citations across invocations collapse
        assert_eq!(reply.sources, vec!["Course - Lesson 1".to_string()]);
    }

    #[tokio::test]
    async fn test_sources_threaded_from_tool_to_reply() {
        let client = Arc::new(MockClient::scripted(vec![
            tool_use_response("toolu_01", serde_json::json!({"query": "x"})),
            direct_response("answer"),
        ]));
        let orchestrator = AgentOrchestrator::new(client, "claude-test", 0.0, 800);
        let registry = registry_with(Arc::new(RecordingTool::new(
            "out",
            vec!["<a href=\"https://example.com/1\" target=\"_blank\">Intro - Lesson 1</a>"],
        )));

        let reply = orchestrator.generate("Q", None, &registry).await.unwrap();
        assert_eq!(reply.sources.len(), 1);
        assert!(reply.sources[0].contains("Intro - Lesson 1"));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let client = Arc::new(MockClient::failing());
        let orchestrator = AgentOrchestrator::new(client, "claude-test", 0.0, 800);

        let result = orchestrator.generate("Q", None, &ToolRegistry::new()).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
