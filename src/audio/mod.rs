pub mod capture;
pub mod format;
pub mod playback;
pub mod sink;
pub mod spectrum;
pub mod wav_sink;

pub use capture::AudioCapture;
pub use format::AudioFormat;
pub use sink::AudioSink;
pub use spectrum::{SpectrumFrame, SpectrumWindow};
pub use wav_sink::WavSink;
