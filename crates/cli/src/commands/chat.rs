//! Chat command handler.
//!
//! Interactive multi-turn loop over a single session.

use clap::Args;
use coursemate_core::{AppConfig, AppResult};
use std::io::{BufRead, Write};

/// Interactive multi-turn chat
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Resume an existing session instead of starting a new one
    #[arg(short, long)]
    pub session: Option<String>,
}

impl ChatCommand {
    /// Execute the chat command.
    ///
    /// Reads questions from stdin until EOF or `/quit`; `/clear` drops the
    /// current transcript and starts a fresh session.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let assistant = super::build_assistant(config)?;
        let mut session_id = match self.session {
            Some(ref id) => id.clone(),
            None => assistant.create_session(),
        };

        println!("Coursemate chat (session {}).", session_id);
        println!("Type /clear to reset the conversation, /quit to exit.");

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        loop {
            print!("> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();

            match line {
                "" => continue,
                "/quit" | "/exit" => break,
                "/clear" => {
                    assistant.clear_session(&session_id);
                    session_id = assistant.create_session();
                    println!("Conversation cleared (session {}).", session_id);
                    continue;
                }
                question => {
                    let outcome = assistant.query(question, Some(&session_id)).await;
                    println!("{}", outcome.answer);
                    if !outcome.sources.is_empty() {
                        println!("\nSources:");
                        for source in &outcome.sources {
                            println!("  - {}", source);
                        }
                    }
                    println!();
                }
            }
        }

        Ok(())
    }
}
