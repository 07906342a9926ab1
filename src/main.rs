mod analysis;
mod audio;
mod cli;
mod config;
mod error;
mod messages;
mod services;
mod source;
mod ui;
mod workflow;

use analysis::HttpAnalyzer;
use audio::{AudioFormat, SpectrumFrame};
use cli::{Args, Mode};
use config::Config;
use services::recorder::chunk_duration;
use services::{Recorder, RecorderHandle};
use ui::TerminalView;
use workflow::{Capabilities, Flow, Workflow};

use anyhow::Result;
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

#[tokio::main]
async fn main() -> Result<()> {
    // The TUI owns stdout; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting vocary analysis client");

    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(api_base) = args.api_base.clone() {
        config.api_base = api_base;
    }
    config.validate()?;

    // LocalSet for !Send futures (the Recorder holds a cpal::Stream).
    let local = tokio::task::LocalSet::new();
    local.run_until(run_app(args, config)).await
}

async fn run_app(args: Args, config: Config) -> Result<()> {
    let format = AudioFormat::mono(config.sample_rate);
    let (spectrum_tx, spectrum_rx) = watch::channel(SpectrumFrame::default());

    let (recorder_tx, recorder_rx) = mpsc::channel(10);
    let recorder = Recorder::new(format, recorder_rx, spectrum_tx);
    tokio::task::spawn_local(recorder.run());
    let recorder_handle = RecorderHandle::new(recorder_tx);

    let backend = HttpAnalyzer::new(
        &config.api_base,
        config.request_timeout(),
        config.max_upload_bytes(),
    )?;

    let interactive = !args.plain;
    let view = TerminalView::new(interactive, config.starfield, config.visualizer)?;

    let (caps, preloads) = match args.mode {
        Mode::Similarity { song, user } => (
            Capabilities::similarity(config.legacy_upload),
            vec![("song", song), ("user", user)],
        ),
        Mode::Pitch { audio } => (Capabilities::pitch(), vec![("audio", audio)]),
        Mode::Timbre { audio } => (Capabilities::timbre(), vec![("audio", audio)]),
    };

    let mut workflow = Workflow::new(caps, recorder_handle, backend, spectrum_rx, view);
    for (field, path) in preloads {
        if let Some(path) = path {
            workflow.preselect(field, &path);
        }
    }

    let mut inputs = ui::input::spawn_input_reader();
    let mut ticker = tokio::time::interval(chunk_duration());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(input) = inputs.recv() => {
                if workflow.handle(input).await == Flow::Quit {
                    break;
                }
            }
            _ = ticker.tick() => {
                workflow.on_tick(chunk_duration());
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                workflow.dispose().await;
                break;
            }
        }
    }

    tracing::info!("vocary shutdown complete");
    Ok(())
}
