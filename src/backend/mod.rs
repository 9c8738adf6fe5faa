pub mod recognition;
pub mod scripted;

pub use recognition::{OpenStream, RecognitionBackend, RecognitionEvent, RecognitionHandle};
pub use scripted::{BackendCall, ScriptedBackend};
