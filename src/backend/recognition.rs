use anyhow::Result;
use tokio::sync::mpsc;

/// An event delivered by an open recognition stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Intermediate, possibly-revised transcription while speech is ongoing.
    Partial { text: String },
    /// The backend's terminal transcription for the session.
    Final { text: String },
    /// The backend failed mid-stream.
    Error { cause: String },
}

/// A live audio + transcription stream returned by `open_stream`.
///
/// The handle controls delivery and teardown; the receiver carries the
/// backend's partial/final/error events until the stream is closed.
pub struct OpenStream {
    pub handle: Box<dyn RecognitionHandle>,
    pub events: mpsc::UnboundedReceiver<RecognitionEvent>,
}

/// Control surface of an open recognition stream.
#[async_trait::async_trait]
pub trait RecognitionHandle: Send {
    /// Suspend audio delivery. The stream stays open and the recognition
    /// task stays pending, so a final result or error can still arrive.
    async fn pause_delivery(&mut self);

    /// Resume audio delivery after a pause.
    async fn resume_delivery(&mut self) -> Result<()>;

    /// Signal that no more audio will be delivered.
    async fn end_audio(&mut self);

    /// Ask the backend to finalize the pending recognition task.
    async fn finish(&mut self);

    /// Release the stream. Events pushed after this point are lost.
    async fn close(&mut self);
}

/// Speech recognition backend trait
///
/// Implementations wrap whatever actually produces transcriptions:
/// - A platform speech framework (audio tap + recognition task)
/// - A remote STT service
/// - A scripted feed (for testing and demos)
#[async_trait::async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Open an audio capture + transcription stream.
    ///
    /// `report_partials` asks the backend to emit intermediate results as
    /// speech is still ongoing, not only the final transcription.
    async fn open_stream(&self, report_partials: bool) -> Result<OpenStream>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
