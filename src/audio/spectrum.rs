use spectrum_analyzer::scaling::divide_by_N_sqrt;
use spectrum_analyzer::windows::hann_window;
use spectrum_analyzer::{FrequencyLimit, samples_fft_to_spectrum};

/// FFT window length. Must be a power of two.
pub const WINDOW_SIZE: usize = 1024;
/// Number of bars published to the visualizer.
pub const BIN_COUNT: usize = 32;

/// Analysis band for voice material (Hz). The ceiling stays under the
/// Nyquist frequency of the lowest supported capture rate.
const FREQ_MIN_HZ: f32 = 55.0;
const FREQ_MAX_HZ: f32 = 4000.0;

/// Scales FFT magnitudes into the 0..1 bar range.
const SENSITIVITY: f32 = 12.0;

/// One visualizer frame: normalized magnitudes, one per bar.
///
/// A default (empty) frame means "nothing to draw" and is what the
/// visualizer receives once a recording has stopped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpectrumFrame {
    pub bins: Vec<f32>,
}

impl SpectrumFrame {
    pub fn is_cleared(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Rolling sample window that turns capture chunks into spectrum frames.
pub struct SpectrumWindow {
    samples: Vec<f32>,
    sample_rate: u32,
    filled: usize,
}

impl SpectrumWindow {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; WINDOW_SIZE],
            sample_rate,
            filled: 0,
        }
    }

    /// Append a chunk, keeping only the newest WINDOW_SIZE samples.
    pub fn push(&mut self, chunk: &[f32]) {
        if chunk.len() >= WINDOW_SIZE {
            self.samples.copy_from_slice(&chunk[chunk.len() - WINDOW_SIZE..]);
            self.filled = WINDOW_SIZE;
            return;
        }
        self.samples.rotate_left(chunk.len());
        let start = WINDOW_SIZE - chunk.len();
        self.samples[start..].copy_from_slice(chunk);
        self.filled = (self.filled + chunk.len()).min(WINDOW_SIZE);
    }

    pub fn reset(&mut self) {
        self.samples.fill(0.0);
        self.filled = 0;
    }

    /// Compute the current frame, or `None` until the window is full.
    pub fn frame(&self) -> Option<SpectrumFrame> {
        if self.filled < WINDOW_SIZE {
            return None;
        }

        let windowed = hann_window(&self.samples);
        let spectrum = samples_fft_to_spectrum(
            &windowed,
            self.sample_rate,
            FrequencyLimit::Range(FREQ_MIN_HZ, FREQ_MAX_HZ.min(self.sample_rate as f32 / 2.0)),
            Some(&divide_by_N_sqrt),
        )
        .ok()?;

        let magnitudes: Vec<f32> = spectrum.data().iter().map(|(_, val)| val.val()).collect();
        if magnitudes.is_empty() {
            return None;
        }

        Some(SpectrumFrame {
            bins: group_into_bins(&magnitudes, BIN_COUNT),
        })
    }
}

/// Logarithmic frequency-to-bar mapping: more bars for the low end, where
/// voices live. Each bar averages a small neighborhood of FFT bins and is
/// clamped into 0..1.
fn group_into_bins(magnitudes: &[f32], bin_count: usize) -> Vec<f32> {
    let mut bins = Vec::with_capacity(bin_count);
    for bar_idx in 0..bin_count {
        let normalized_pos = bar_idx as f32 / (bin_count - 1).max(1) as f32;
        let log_normalized = (normalized_pos * 9.0 + 1.0).log10();
        let freq_idx = (log_normalized * magnitudes.len() as f32) as usize;
        let freq_idx = freq_idx.min(magnitudes.len().saturating_sub(1));

        let start = freq_idx.saturating_sub(2);
        let end = (freq_idx + 3).min(magnitudes.len());
        let avg = magnitudes[start..end].iter().sum::<f32>() / (end - start).max(1) as f32;

        bins.push((avg * SENSITIVITY).clamp(0.0, 1.0));
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frame_until_window_full() {
        let mut window = SpectrumWindow::new(16000);
        window.push(&vec![0.1; 800]);
        assert!(window.frame().is_none());
        window.push(&vec![0.1; 800]);
        assert!(window.frame().is_some());
    }

    #[test]
    fn test_frame_has_fixed_bin_count() {
        let mut window = SpectrumWindow::new(16000);
        // A 440 Hz tone filling the window.
        let tone: Vec<f32> = (0..WINDOW_SIZE)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 16000.0).sin())
            .collect();
        window.push(&tone);

        let frame = window.frame().expect("window is full");
        assert_eq!(frame.bins.len(), BIN_COUNT);
        assert!(frame.bins.iter().all(|&b| (0.0..=1.0).contains(&b)));
        // A real tone must light up at least one bar.
        assert!(frame.bins.iter().any(|&b| b > 0.0));
    }

    #[test]
    fn test_reset_empties_window() {
        let mut window = SpectrumWindow::new(16000);
        window.push(&vec![0.5; WINDOW_SIZE]);
        assert!(window.frame().is_some());
        window.reset();
        assert!(window.frame().is_none());
    }

    #[test]
    fn test_silence_is_all_zero_bars() {
        let mut window = SpectrumWindow::new(16000);
        window.push(&vec![0.0; WINDOW_SIZE]);
        let frame = window.frame().expect("window is full");
        assert!(frame.bins.iter().all(|&b| b == 0.0));
    }
}
