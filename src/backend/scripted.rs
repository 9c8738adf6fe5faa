use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::debug;

use super::recognition::{OpenStream, RecognitionBackend, RecognitionEvent, RecognitionHandle};

/// A call made against the backend or one of its handles, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    OpenStream { report_partials: bool },
    PauseDelivery,
    ResumeDelivery,
    EndAudio,
    Finish,
    Close,
}

#[derive(Default)]
struct Shared {
    calls: Vec<BackendCall>,
    feed: Option<mpsc::UnboundedSender<RecognitionEvent>>,
    paused: bool,
}

/// Deterministic in-process recognition backend for tests and demos.
///
/// Events are pushed by the caller instead of arriving from a microphone.
/// Pausing really suspends partial delivery, and every handle call is
/// recorded so tests can assert the teardown sequence.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    shared: Arc<Mutex<Shared>>,
    fail_open: bool,
    fail_resume: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `open_stream` always fails.
    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// A backend whose `resume_delivery` always fails.
    pub fn failing_resume() -> Self {
        Self {
            fail_resume: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Push a partial transcription into the open stream.
    ///
    /// Dropped while delivery is paused or when no stream is open, like
    /// audio that reaches a suspended tap.
    pub fn push_partial(&self, text: &str) {
        let shared = self.lock();
        if shared.paused {
            debug!(text, "dropping partial while delivery is paused");
            return;
        }
        if let Some(feed) = &shared.feed {
            let _ = feed.send(RecognitionEvent::Partial {
                text: text.to_string(),
            });
        }
    }

    /// Push the final transcription.
    ///
    /// Delivered even while paused: the recognition task stays pending
    /// across a pause and may still conclude.
    pub fn push_final(&self, text: &str) {
        if let Some(feed) = &self.lock().feed {
            let _ = feed.send(RecognitionEvent::Final {
                text: text.to_string(),
            });
        }
    }

    /// Push a mid-stream backend error.
    pub fn push_error(&self, cause: &str) {
        if let Some(feed) = &self.lock().feed {
            let _ = feed.send(RecognitionEvent::Error {
                cause: cause.to_string(),
            });
        }
    }

    /// Whether a handle from `open_stream` is currently live.
    pub fn stream_open(&self) -> bool {
        self.lock().feed.is_some()
    }

    /// Every backend/handle call made so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }
}

#[async_trait::async_trait]
impl RecognitionBackend for ScriptedBackend {
    async fn open_stream(&self, report_partials: bool) -> Result<OpenStream> {
        let mut shared = self.lock();
        shared.calls.push(BackendCall::OpenStream { report_partials });

        if self.fail_open {
            bail!("scripted backend configured to refuse streams");
        }

        let (feed, events) = mpsc::unbounded_channel();
        shared.feed = Some(feed);
        shared.paused = false;

        Ok(OpenStream {
            handle: Box::new(ScriptedHandle {
                backend: self.clone(),
            }),
            events,
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedHandle {
    backend: ScriptedBackend,
}

#[async_trait::async_trait]
impl RecognitionHandle for ScriptedHandle {
    async fn pause_delivery(&mut self) {
        let mut shared = self.backend.lock();
        shared.calls.push(BackendCall::PauseDelivery);
        shared.paused = true;
    }

    async fn resume_delivery(&mut self) -> Result<()> {
        let mut shared = self.backend.lock();
        shared.calls.push(BackendCall::ResumeDelivery);
        if self.backend.fail_resume {
            bail!("scripted backend configured to refuse resume");
        }
        shared.paused = false;
        Ok(())
    }

    async fn end_audio(&mut self) {
        self.backend.lock().calls.push(BackendCall::EndAudio);
    }

    async fn finish(&mut self) {
        self.backend.lock().calls.push(BackendCall::Finish);
    }

    async fn close(&mut self) {
        let mut shared = self.backend.lock();
        shared.calls.push(BackendCall::Close);
        // Dropping the sender ends the event stream.
        shared.feed = None;
    }
}
