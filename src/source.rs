use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::NamedTempFile;

/// Anything that does not look like audio is rejected at selection time.
static AUDIO_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^audio/").unwrap());

/// File name the service expects for microphone captures.
pub const RECORDING_NAME: &str = "recording.wav";

/// A selected or recorded audio payload, ready for preview or submission.
///
/// Immutable once created; a new selection or recording replaces the whole
/// value. A recorded clip owns its temp file, so the data lives exactly as
/// long as the source does.
pub enum AudioSource {
    File {
        path: PathBuf,
        name: String,
        mime: &'static str,
    },
    Recorded {
        clip: NamedTempFile,
    },
}

impl AudioSource {
    pub fn recorded(clip: NamedTempFile) -> Self {
        AudioSource::Recorded { clip }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AudioSource::File { name, .. } => name,
            AudioSource::Recorded { .. } => RECORDING_NAME,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            AudioSource::File { mime, .. } => mime,
            AudioSource::Recorded { .. } => "audio/wav",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            AudioSource::File { path, .. } => path,
            AudioSource::Recorded { clip } => clip.path(),
        }
    }
}

/// Why a candidate file was not accepted into a slot.
#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    NotAudio,
    NotFound,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotAudio => write!(f, "not an audio file"),
            Rejection::NotFound => write!(f, "file does not exist"),
        }
    }
}

/// One upload-selector instance.
///
/// Slots are independent: similarity mode runs two of them (reference song
/// and user take) with no shared state. A rejected candidate leaves the
/// current selection untouched.
pub struct SourceSlot {
    pub field: &'static str,
    pub label: &'static str,
    pub accepts_recording: bool,
    source: Option<AudioSource>,
}

impl SourceSlot {
    pub fn new(field: &'static str, label: &'static str, accepts_recording: bool) -> Self {
        Self {
            field,
            label,
            accepts_recording,
            source: None,
        }
    }

    pub fn source(&self) -> Option<&AudioSource> {
        self.source.as_ref()
    }

    pub fn is_filled(&self) -> bool {
        self.source.is_some()
    }

    /// Status-line text for this slot.
    pub fn display(&self) -> &str {
        self.source
            .as_ref()
            .map(|s| s.display_name())
            .unwrap_or("no file selected")
    }

    /// Accept a candidate file, replacing any previous selection.
    pub fn select_file(&mut self, path: &Path) -> Result<(), Rejection> {
        let mime = guess_mime(path).ok_or(Rejection::NotAudio)?;
        if !AUDIO_PATTERN.is_match(mime) {
            return Err(Rejection::NotAudio);
        }
        if !path.is_file() {
            return Err(Rejection::NotFound);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        tracing::info!("Selected {} for slot '{}'", name, self.field);
        self.source = Some(AudioSource::File {
            path: path.to_path_buf(),
            name,
            mime,
        });
        Ok(())
    }

    /// Install a finished microphone clip, replacing any previous selection.
    pub fn set_recording(&mut self, clip: NamedTempFile) {
        tracing::info!("Recorded clip installed in slot '{}'", self.field);
        self.source = Some(AudioSource::recorded(clip));
    }
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "ogg" | "oga" => Some("audio/ogg"),
        "opus" => Some("audio/opus"),
        "flac" => Some("audio/flac"),
        "m4a" => Some("audio/mp4"),
        "aac" => Some("audio/aac"),
        "webm" => Some("audio/webm"),
        "mp4" => Some("video/mp4"),
        "mkv" => Some("video/x-matroska"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}
