use rodio::OutputStreamBuilder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Play an audio file through the default output, fire-and-forget.
///
/// Used to preview the currently selected or freshly recorded source.
/// Failures are logged, never surfaced: preview is a convenience, not part
/// of the analysis workflow.
pub async fn play_preview(path: PathBuf) {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = play_blocking(&path) {
            tracing::warn!("Failed to play {}: {}", path.display(), e);
        }
    })
    .await
    .ok();
}

fn play_blocking(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;

    let stream_handle = OutputStreamBuilder::open_default_stream()?;
    let sink = rodio::play(stream_handle.mixer(), BufReader::new(file))?;
    sink.sleep_until_end();

    Ok(())
}
