use serde::{Deserialize, Serialize};

/// Configuration for a dictation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "dictation-4f0c…")
    pub session_id: String,

    /// Seconds of transcription inactivity before the session auto-stops.
    /// Zero or negative disables the silence watchdog.
    pub silence_timeout_secs: f64,

    /// Ask the backend for intermediate (partial) results
    pub report_partials: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("dictation-{}", uuid::Uuid::new_v4()),
            silence_timeout_secs: 5.0,
            report_partials: true,
        }
    }
}
