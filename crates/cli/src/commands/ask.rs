//! Ask command handler.
//!
//! Runs one question through the query pipeline and prints the answer
//! with its sources.

use clap::Args;
use coursemate_core::{AppConfig, AppResult};

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Session id to thread conversation history
    #[arg(short, long)]
    pub session: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let assistant = super::build_assistant(config)?;
        let outcome = assistant
            .query(&self.question, self.session.as_deref())
            .await;

        if self.json {
            let payload = serde_json::json!({
                "answer": outcome.answer,
                "sources": outcome.sources,
                "session_id": outcome.session_id,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
            return Ok(());
        }

        println!("{}", outcome.answer);

        if !outcome.sources.is_empty() {
            println!("\nSources:");
            for source in &outcome.sources {
                println!("  - {}", source);
            }
        }

        // Printed so follow-up invocations can thread history with --session
        println!("\nSession: {}", outcome.session_id);

        Ok(())
    }
}
