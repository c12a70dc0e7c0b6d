// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trajecta show runner
//!
//! Loads a show file, schedules its cues against the wall clock and drives
//! the playback engine at the configured tick rate. Frames go to a
//! [`transport::LogTransport`]; lifecycle events are logged as they arrive.
//!
//! Logs go to stderr so `--json` output on stdout stays machine readable.

mod cli;
mod error;
mod show;
mod transport;

use clap::Parser;
use cli::Cli;
use error::RunnerError;
use show::ShowFile;
use std::io::BufWriter;
use std::sync::mpsc::Receiver;
use tokio::time::MissedTickBehavior;
use trajecta_playback::{EventKind, Orchestrator, PlaybackEvent};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use transport::{LogTransport, OutputFormat};

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trajecta_runner=info,trajecta_playback=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Trajecta runner v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("Runner failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RunnerError> {
    let show = ShowFile::load(&cli.show)?;
    tracing::info!(
        "Loaded {}: {} animations, {} tracks, {} cues",
        cli.show.display(),
        show.animations.len(),
        show.tracks.len(),
        show.cues.len()
    );

    let mut engine = Orchestrator::new(show.engine.clone());
    let events = engine.event_channel(None);
    let start = engine.now();
    show.install(&mut engine, start)?;

    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Log };
    let mut transport = LogTransport::new(format, BufWriter::new(std::io::stdout()));

    let mut interval = tokio::time::interval(engine.config().tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let deadline = cli.seconds.map(|seconds| start + seconds.max(0.0));

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            result = &mut shutdown => {
                match result {
                    Ok(()) => tracing::info!("Interrupted"),
                    Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {e}"),
                }
                break;
            }
        }

        let snapshot = engine.tick();
        transport.send(&snapshot)?;
        log_events(&events);

        if deadline.is_some_and(|deadline| engine.now() >= deadline) {
            tracing::info!("Run time elapsed");
            break;
        }

        if show.exit_when_idle {
            let status = engine.get_status();
            if status.active_playbacks == 0 && status.scheduled_pending == 0 {
                tracing::info!("Show finished");
                break;
            }
        }
    }

    let stopped = engine.stop_all();
    let snapshot = engine.tick();
    transport.send(&snapshot)?;
    log_events(&events);

    let status = engine.get_status();
    tracing::info!(
        "Stopped {} playbacks; {} ticks, {} started, {} completed, {} errors, {} conflicts, {} frames sent",
        stopped,
        status.tick_count,
        status.total_started,
        status.total_completed,
        status.total_errors,
        status.total_conflicts,
        transport.frames_sent()
    );
    Ok(())
}

fn log_events(events: &Receiver<PlaybackEvent>) {
    while let Ok(event) = events.try_recv() {
        match event.kind {
            EventKind::Error => tracing::warn!(
                "Playback {} ({}) failed: {}",
                event.playback_id,
                event.info.animation_id,
                event.message.as_deref().unwrap_or("unknown error")
            ),
            EventKind::Stopped => tracing::info!(
                "Playback {} ({}) stopped: {:?}",
                event.playback_id,
                event.info.animation_id,
                event.reason
            ),
            kind => tracing::info!("Playback {} ({}) {kind}", event.playback_id, event.info.animation_id),
        }
    }
}
