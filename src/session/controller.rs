use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::state::{SessionSnapshot, SessionState};
use super::watchdog::SilenceWatchdog;
use crate::backend::{RecognitionBackend, RecognitionEvent, RecognitionHandle};
use crate::error::SessionError;

/// A caller-issued command.
#[derive(Debug)]
enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    SetSilenceTimeout(f64),
}

/// Everything that can reach the driver task. Commands, backend events and
/// watchdog fires all funnel through one channel, so state mutation is
/// serialized without locks.
enum Input {
    Command(Command),
    Recognition {
        generation: u64,
        event: RecognitionEvent,
    },
    SilenceElapsed {
        generation: u64,
    },
}

/// Handle to a dictation session driver.
///
/// Commands never block and return no values; outcomes are observed through
/// the published `SessionSnapshot` (poll with [`snapshot`], or subscribe
/// with [`subscribe`] for change notifications).
///
/// [`snapshot`]: SessionController::snapshot
/// [`subscribe`]: SessionController::subscribe
#[derive(Clone)]
pub struct SessionController {
    inputs: mpsc::UnboundedSender<Input>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionController {
    /// Spawn a session driver for the given backend.
    ///
    /// The driver stops the session and releases the backend stream once
    /// every controller handle has been dropped.
    pub fn spawn(backend: Arc<dyn RecognitionBackend>, config: SessionConfig) -> Self {
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::idle(&config.session_id));

        let driver = Driver {
            backend,
            config,
            snapshot_tx,
            inputs: inputs_tx.downgrade(),
            handle: None,
            watchdog: SilenceWatchdog::new(),
            generation: 0,
            state: SessionState::Idle,
            transcript: None,
            started_at: None,
            last_error: None,
        };
        tokio::spawn(driver.run(inputs_rx));

        Self {
            inputs: inputs_tx,
            snapshot_rx,
        }
    }

    /// Start a new session. No-op unless the session is Idle.
    pub fn start(&self) {
        self.send(Command::Start);
    }

    /// Suspend audio delivery. No-op unless the session is Active.
    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    /// Resume audio delivery. No-op unless the session is Paused.
    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    /// Stop the session and release the backend stream. Idempotent.
    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Update the silence timeout. Zero or negative disables auto-stop.
    /// Takes effect the next time the watchdog is armed, not retroactively.
    pub fn set_silence_timeout(&self, secs: f64) {
        self.send(Command::SetSilenceTimeout(secs));
    }

    /// Current observable state of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Whether audio is being captured and transcribed right now.
    pub fn is_processing(&self) -> bool {
        self.snapshot_rx.borrow().is_processing()
    }

    /// Whether the session is open but suspended.
    pub fn is_paused(&self) -> bool {
        self.snapshot_rx.borrow().is_paused()
    }

    /// Most recent best transcription, if any result has arrived.
    pub fn transcript(&self) -> Option<String> {
        self.snapshot_rx.borrow().transcript.clone()
    }

    fn send(&self, command: Command) {
        if self.inputs.send(Input::Command(command)).is_err() {
            warn!("session driver is gone; command dropped");
        }
    }
}

/// The single owner of session state. Runs as one tokio task; every input
/// is handled to completion before the next one is looked at.
struct Driver {
    backend: Arc<dyn RecognitionBackend>,
    config: SessionConfig,
    snapshot_tx: watch::Sender<SessionSnapshot>,

    /// Weak sender back into our own input queue, for the watchdog and the
    /// event pump. Weak so the queue closes once all controller handles drop.
    inputs: mpsc::WeakUnboundedSender<Input>,

    /// Open backend stream; `Some` exactly while state != Idle.
    handle: Option<Box<dyn RecognitionHandle>>,

    watchdog: SilenceWatchdog,

    /// Bumped on every start and stop. Events and watchdog fires carry the
    /// generation they were issued under; anything stale is ignored.
    generation: u64,

    state: SessionState,
    transcript: Option<String>,
    started_at: Option<chrono::DateTime<Utc>>,
    last_error: Option<SessionError>,
}

impl Driver {
    async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<Input>) {
        debug!(backend = self.backend.name(), "session driver started");

        while let Some(input) = inputs.recv().await {
            match input {
                Input::Command(Command::Start) => self.handle_start().await,
                Input::Command(Command::Pause) => self.handle_pause().await,
                Input::Command(Command::Resume) => self.handle_resume().await,
                Input::Command(Command::Stop) => self.stop_session().await,
                Input::Command(Command::SetSilenceTimeout(secs)) => {
                    debug!(secs, "silence timeout updated; applies on next arm");
                    self.config.silence_timeout_secs = secs;
                }
                Input::Recognition { generation, event } => {
                    self.handle_event(generation, event).await
                }
                Input::SilenceElapsed { generation } => self.handle_silence(generation).await,
            }
        }

        // All controller handles dropped; make sure the stream is released.
        self.stop_session().await;
        debug!("session driver exiting");
    }

    async fn handle_start(&mut self) {
        if self.state != SessionState::Idle {
            warn!(state = ?self.state, "start ignored: session already running");
            return;
        }

        info!(
            session_id = %self.config.session_id,
            backend = self.backend.name(),
            "starting dictation session"
        );

        match self.backend.open_stream(self.config.report_partials).await {
            Ok(stream) => {
                self.generation = self.generation.wrapping_add(1);
                self.handle = Some(stream.handle);
                self.spawn_event_pump(stream.events);

                self.transcript = None;
                self.last_error = None;
                self.started_at = Some(Utc::now());
                self.state = SessionState::Active;
                self.arm_watchdog();
                self.publish();
            }
            Err(e) => {
                error!("failed to open recognition stream: {e:#}");
                self.last_error = Some(SessionError::BackendUnavailable(format!("{e:#}")));
                self.publish();
            }
        }
    }

    async fn handle_pause(&mut self) {
        if self.state != SessionState::Active {
            warn!(state = ?self.state, "pause ignored: session not active");
            return;
        }

        if let Some(handle) = self.handle.as_mut() {
            handle.pause_delivery().await;
        }
        self.watchdog.cancel();
        self.state = SessionState::Paused;
        info!("session paused");
        self.publish();
    }

    async fn handle_resume(&mut self) {
        if self.state != SessionState::Paused {
            warn!(state = ?self.state, "resume ignored: session not paused");
            return;
        }

        let resumed = match self.handle.as_mut() {
            Some(handle) => handle.resume_delivery().await,
            None => Ok(()),
        };

        match resumed {
            Ok(()) => {
                self.state = SessionState::Active;
                self.arm_watchdog();
                info!("session resumed");
                self.publish();
            }
            Err(e) => {
                error!("failed to resume audio delivery: {e:#}; stopping session");
                self.last_error = Some(SessionError::ResumeFailed(format!("{e:#}")));
                self.stop_session().await;
            }
        }
    }

    /// Shared terminal transition for caller stop, final result, backend
    /// error and silence timeout. Idempotent: a no-op from Idle.
    async fn stop_session(&mut self) {
        if self.state == SessionState::Idle {
            debug!("stop ignored: session already idle");
            return;
        }

        self.watchdog.cancel();
        // In-flight events and timeouts from this session are now stale.
        self.generation = self.generation.wrapping_add(1);

        if let Some(mut handle) = self.handle.take() {
            handle.end_audio().await;
            handle.finish().await;
            handle.close().await;
        }

        self.state = SessionState::Idle;
        match self.transcript.as_deref() {
            None => info!("session stopped before any transcription arrived"),
            Some("") => info!("session stopped with an empty transcript"),
            Some(text) => {
                info!(chars = text.chars().count(), "session stopped: {text}")
            }
        }
        self.publish();
    }

    async fn handle_event(&mut self, generation: u64, event: RecognitionEvent) {
        if generation != self.generation || self.state == SessionState::Idle {
            debug!("ignoring recognition event from a stale session");
            return;
        }

        match event {
            RecognitionEvent::Partial { text } => {
                debug!(%text, "partial transcription");
                self.transcript = Some(text);
                // The watchdog is only armed while Active; a straggler
                // partial during a pause updates the text but arms nothing.
                if self.state == SessionState::Active {
                    self.arm_watchdog();
                }
                self.publish();
            }
            RecognitionEvent::Final { text } => {
                info!(%text, "final transcription");
                self.transcript = Some(text);
                self.stop_session().await;
            }
            RecognitionEvent::Error { cause } => {
                error!("recognition stream error: {cause}");
                self.last_error = Some(SessionError::Recognition(cause));
                self.stop_session().await;
            }
        }
    }

    async fn handle_silence(&mut self, generation: u64) {
        if generation != self.generation || self.state != SessionState::Active {
            debug!("ignoring stale silence timeout");
            return;
        }

        info!(
            timeout_secs = self.config.silence_timeout_secs,
            "no transcription activity; auto-stopping"
        );
        self.stop_session().await;
    }

    /// Arm (or restart) the watchdog for the full configured duration.
    fn arm_watchdog(&mut self) {
        let inputs = self.inputs.clone();
        let generation = self.generation;
        self.watchdog
            .reset(self.config.silence_timeout_secs, move || {
                if let Some(inputs) = inputs.upgrade() {
                    let _ = inputs.send(Input::SilenceElapsed { generation });
                }
            });
    }

    /// Forward backend events into the input queue, tagged with the
    /// generation they belong to.
    fn spawn_event_pump(&self, mut events: mpsc::UnboundedReceiver<RecognitionEvent>) {
        let inputs = self.inputs.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(inputs) = inputs.upgrade() else { break };
                if inputs.send(Input::Recognition { generation, event }).is_err() {
                    break;
                }
            }
        });
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            session_id: self.config.session_id.clone(),
            state: self.state,
            transcript: self.transcript.clone(),
            started_at: self.started_at,
            last_error: self.last_error.clone(),
        });
    }
}
