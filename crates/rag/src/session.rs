//! Per-session conversation history.
//!
//! Transcripts are in-memory and size-bounded: only the most recent N
//! exchanges are retained, oldest dropped first. The manager is shared
//! across concurrent workers, so all access goes through a mutex.

use coursemate_core::{AppError, AppResult};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One completed user/assistant exchange.
#[derive(Debug, Clone)]
struct Exchange {
    user: String,
    assistant: String,
}

/// Process-wide mapping from session id to a bounded transcript.
pub struct SessionManager {
    max_history: usize,
    sessions: Mutex<HashMap<String, VecDeque<Exchange>>>,
}

impl SessionManager {
    /// Create a manager retaining at most `max_history` exchanges per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Generate a fresh unique session id.
    pub fn create_session(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("Created session {}", id);
        id
    }

    /// Append one exchange to a session, evicting the oldest past the cap.
    ///
    /// The transcript is created on first append, so ids minted by
    /// `create_session` (or supplied by the caller) need no registration.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) -> AppResult<()> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| AppError::Session("session map lock poisoned".to_string()))?;

        let transcript = sessions.entry(session_id.to_string()).or_default();
        transcript.push_back(Exchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
        while transcript.len() > self.max_history {
            transcript.pop_front();
        }

        Ok(())
    }

    /// Formatted transcript for a session, `None` when nothing is recorded.
    ///
    /// Rendering alternates `User:` / `Assistant:` lines in chronological
    /// order; this exact text is embedded in the agent's system prompt.
    pub fn get_history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.lock().ok()?;
        let transcript = sessions.get(session_id)?;
        if transcript.is_empty() {
            return None;
        }

        let lines: Vec<String> = transcript
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.user, e.assistant))
            .collect();
        Some(lines.join("\n"))
    }

    /// Remove a transcript entirely.
    pub fn clear_session(&self, session_id: &str) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(session_id);
            tracing::debug!("Cleared session {}", session_id);
        }
    }
}
