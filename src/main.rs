use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dictation_session::{Config, ScriptedBackend, SessionController, SessionState};
use tracing::info;

/// Run a scripted utterance through a dictation session and print the
/// resulting snapshot. The session ends on its own when the silence
/// watchdog fires.
#[derive(Parser, Debug)]
#[command(name = "dictation-session", version)]
struct Args {
    /// Config file (without extension)
    #[arg(long, default_value = "config/dictation-session")]
    config: String,

    /// Override the configured silence timeout (seconds; <= 0 disables auto-stop)
    #[arg(long)]
    silence_timeout: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let mut session_cfg = cfg.session_config();
    if let Some(secs) = args.silence_timeout {
        session_cfg.silence_timeout_secs = secs;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        session_id = %session_cfg.session_id,
        silence_timeout_secs = session_cfg.silence_timeout_secs,
        "starting scripted dictation demo"
    );

    let backend = Arc::new(ScriptedBackend::new());
    let controller = SessionController::spawn(backend.clone(), session_cfg);
    let mut snapshots = controller.subscribe();

    controller.start();

    // Script an utterance: a few partials, then silence. The watchdog is
    // what ends the session.
    let feeder = {
        let backend = backend.clone();
        tokio::spawn(async move {
            while !backend.stream_open() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            for text in ["hel", "hello", "hello there"] {
                tokio::time::sleep(Duration::from_millis(300)).await;
                backend.push_partial(text);
            }
        })
    };

    // Wait until the session has been active and returned to idle.
    let final_snapshot = tokio::time::timeout(Duration::from_secs(30), async {
        let mut saw_active = false;
        loop {
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.is_processing() {
                saw_active = true;
            }
            if saw_active && snapshot.state == SessionState::Idle {
                return anyhow::Ok(snapshot);
            }
            snapshots
                .changed()
                .await
                .context("session driver went away")?;
        }
    })
    .await
    .context("demo session never finished")??;

    feeder.await.context("feeder task panicked")?;

    println!("{}", serde_json::to_string_pretty(&final_snapshot)?);

    Ok(())
}
