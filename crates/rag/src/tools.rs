//! Retrieval tools offered to the agent.
//!
//! Each tool publishes a schema the orchestrator advertises to the model and
//! executes with model-supplied JSON arguments. `execute` returns both the
//! agent-consumable text and the displayable source citations for that
//! invocation; nothing is kept as shared mutable state, so one tool instance
//! is safe across concurrent queries.

use crate::store::CourseStore;
use coursemate_llm::ToolSchema;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Text folded back into the conversation as a tool result
    pub content: String,

    /// Deduplicated, display-ready citations for this invocation
    pub sources: Vec<String>,
}

impl ToolOutput {
    fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

/// A named capability the agent may invoke.
pub trait Tool: Send + Sync {
    /// Schema advertised to the model.
    fn schema(&self) -> ToolSchema;

    /// Execute with model-supplied arguments.
    ///
    /// Tools never fail past this boundary: problems are reported as
    /// ordinary content the model can read.
    fn execute(&self, args: &serde_json::Value) -> ToolOutput;
}

/// Mapping from tool name to capability.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Schemas of all registered tools, in registration order.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Dispatch by name. Unknown names yield an error string as content.
    pub fn execute(&self, name: &str, args: &serde_json::Value) -> ToolOutput {
        match self.tools.iter().find(|t| t.schema().name == name) {
            Some(tool) => {
                tracing::debug!("Executing tool '{}'", name);
                tool.execute(args)
            }
            None => {
                tracing::warn!("Model requested unknown tool '{}'", name);
                ToolOutput::text(format!("Tool '{}' not found", name))
            }
        }
    }
}

/// Render a citation, hyperlinked when a link is available.
fn render_citation(label: &str, link: Option<&str>) -> String {
    match link {
        Some(url) => format!("<a href=\"{}\" target=\"_blank\">{}</a>", url, label),
        None => label.to_string(),
    }
}

/// Searches course content with optional course and lesson filters.
pub struct CourseSearchTool {
    store: Arc<CourseStore>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<CourseStore>) -> Self {
        Self { store }
    }
}

impl Tool for CourseSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_course_content".to_string(),
            description: "Search course materials with smart course name matching and optional lesson filtering".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content",
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches allowed, e.g. 'MCP', 'Introduction')",
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)",
                    },
                },
                "required": ["query"],
            }),
        }
    }

    fn execute(&self, args: &serde_json::Value) -> ToolOutput {
        let query = match args.get("query").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolOutput::text("Tool error: 'query' argument is required"),
        };
        let course_name = args.get("course_name").and_then(|v| v.as_str());
        let lesson_number = args
            .get("lesson_number")
            .and_then(|v| v.as_u64())
            .map(|n| n as u32);

        let results = self.store.search(query, course_name, lesson_number);

        // Store-level failures are propagated to the agent as text, not raised
        if let Some(error) = results.error {
            return ToolOutput::text(error);
        }

        if results.is_empty() {
            let mut message = String::from("No relevant content found");
            if let Some(name) = course_name {
                message.push_str(&format!(" in course '{}'", name));
            }
            if let Some(lesson) = lesson_number {
                message.push_str(&format!(" in lesson {}", lesson));
            }
            return ToolOutput::text(message);
        }

        let mut blocks = Vec::with_capacity(results.documents.len());
        let mut sources = Vec::new();
        let mut seen = HashSet::new();

        for (document, meta) in results.documents.iter().zip(results.metadata.iter()) {
            let header = match meta.lesson_number {
                Some(lesson) => format!("[{} - Lesson {}]", meta.course_title, lesson),
                None => format!("[{}]", meta.course_title),
            };
            blocks.push(format!("{}\n{}", header, document));

            // One citation per distinct (course, lesson), first-seen order
            let key = (meta.course_title.clone(), meta.lesson_number);
            if seen.insert(key) {
                let label = match meta.lesson_number {
                    Some(lesson) => format!("{} - Lesson {}", meta.course_title, lesson),
                    None => meta.course_title.clone(),
                };
                let link = meta
                    .lesson_number
                    .and_then(|lesson| self.store.get_lesson_link(&meta.course_title, lesson));
                sources.push(render_citation(&label, link.as_deref()));
            }
        }

        ToolOutput {
            content: blocks.join("\n\n"),
            sources,
        }
    }
}

/// Returns the outline of a course: title, link, and lesson list.
pub struct CourseOutlineTool {
    store: Arc<CourseStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<CourseStore>) -> Self {
        Self { store }
    }
}

impl Tool for CourseOutlineTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_course_outline".to_string(),
            description: "Get the full outline of a course: title, link, and all lesson numbers and titles".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches allowed)",
                    },
                },
                "required": ["course_name"],
            }),
        }
    }

    fn execute(&self, args: &serde_json::Value) -> ToolOutput {
        let course_name = match args.get("course_name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => return ToolOutput::text("Tool error: 'course_name' argument is required"),
        };

        let course = match self.store.get_course_outline(course_name) {
            Some(course) => course,
            None => {
                return ToolOutput::text(format!("No course found matching '{}'", course_name))
            }
        };

        let mut lines = vec![format!("Course: {}", course.title)];
        if let Some(ref link) = course.course_link {
            lines.push(format!("Course Link: {}", link));
        }
        if let Some(ref instructor) = course.instructor {
            lines.push(format!("Instructor: {}", instructor));
        }
        lines.push(format!("Lessons ({}):", course.lessons.len()));
        for lesson in &course.lessons {
            lines.push(format!("  Lesson {}: {}", lesson.lesson_number, lesson.title));
        }

        let citation = render_citation(&course.title, course.course_link.as_deref());

        ToolOutput {
            content: lines.join("\n"),
            sources: vec![citation],
        }
    }
}
