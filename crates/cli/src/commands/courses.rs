//! Courses command handler.
//!
//! Prints corpus statistics without touching the LLM provider.

use clap::Args;
use coursemate_core::{AppConfig, AppResult};
use coursemate_rag::{loader, CourseStore};
use std::sync::Arc;

/// Show corpus statistics
#[derive(Args, Debug)]
pub struct CoursesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CoursesCommand {
    /// Execute the courses command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing courses command");

        // Analytics need only the store, not a chat client
        let store = Arc::new(CourseStore::with_default_index(config.max_results));
        let stats = loader::load_corpus(&store, &config.data_dir)?;

        if self.json {
            let payload = serde_json::json!({
                "total_courses": store.course_count(),
                "course_titles": store.course_titles(),
                "total_chunks": stats.chunks,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
            return Ok(());
        }

        println!("Courses: {}", store.course_count());
        for title in store.course_titles() {
            println!("  - {}", title);
        }
        println!("Chunks indexed: {}", stats.chunks);

        Ok(())
    }
}
