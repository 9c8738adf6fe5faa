pub mod backend;
pub mod config;
pub mod error;
pub mod session;

pub use backend::{
    BackendCall, OpenStream, RecognitionBackend, RecognitionEvent, RecognitionHandle,
    ScriptedBackend,
};
pub use config::Config;
pub use error::SessionError;
pub use session::{
    SessionConfig, SessionController, SessionSnapshot, SessionState, SilenceWatchdog,
};
