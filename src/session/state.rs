use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Lifecycle state of a dictation session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No recognition stream is open.
    #[default]
    Idle,
    /// Audio is being captured and transcribed.
    Active,
    /// The stream is open but audio delivery is suspended.
    Paused,
}

/// Observable snapshot of a session, published on every state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier (from the session config)
    pub session_id: String,

    /// Current lifecycle state
    pub state: SessionState,

    /// Most recent best transcription; replaced wholesale by each partial
    /// result, never appended to. `None` until the first result arrives.
    pub transcript: Option<String>,

    /// When the current (or most recent) session started
    pub started_at: Option<DateTime<Utc>>,

    /// Most recent failure, if a session ended abnormally
    pub last_error: Option<SessionError>,
}

impl SessionSnapshot {
    pub(crate) fn idle(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            state: SessionState::Idle,
            transcript: None,
            started_at: None,
            last_error: None,
        }
    }

    /// Whether audio is being captured and transcribed right now.
    pub fn is_processing(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Whether the session is open but suspended.
    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }
}
