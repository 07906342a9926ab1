//! Live frequency bars for the recording session.
//!
//! Purely a function of the most recent spectrum frame: the region is
//! cleared and redrawn on every tick, no history is retained.

use crate::audio::SpectrumFrame;
use crate::ui::screen::Screen;
use crossterm::style::Color;

/// Draw one frame of vertical bars into the given row band.
///
/// Bar height is proportional to the bin magnitude; the hue sweeps from
/// blue to violet across the bins, low frequencies on the left.
pub fn draw(screen: &mut Screen, frame: &SpectrumFrame, top: u16, bottom: u16) {
    screen.clear_rows(top, bottom);
    if frame.is_cleared() || bottom <= top {
        return;
    }

    let (width, _) = screen.size();
    let height = (bottom - top) as usize;
    let bins = frame.bins.len();
    let bar_width = ((width as usize / bins.max(1)).saturating_sub(1)).max(1);

    for (i, &magnitude) in frame.bins.iter().enumerate() {
        let bar_height = (magnitude * height as f32).round() as usize;
        let color = bin_color(i, bins);
        let x0 = i * (bar_width + 1);

        for level in 0..bar_height.min(height) {
            let y = bottom as i32 - 1 - level as i32;
            let peak = level + 1 == bar_height;
            for dx in 0..bar_width {
                screen.set((x0 + dx) as i32, y, '█', Some(color), peak);
            }
        }
    }
}

/// Hue derived from the bin index: 200° (blue) at the low end sweeping to
/// 360° (violet-red) at the top, saturation and value fixed.
fn bin_color(index: usize, total: usize) -> Color {
    let hue = 200.0 + (index as f32 / total.max(1) as f32) * 160.0;
    hsl_to_rgb(hue % 360.0)
}

fn hsl_to_rgb(h: f32) -> Color {
    // S = 1, L = 0.5: chroma is 1 and the match collapses to hue sextants.
    let x = 1.0 - ((h / 60.0) % 2.0 - 1.0).abs();
    let (r, g, b) = match h as i32 {
        0..=59 => (1.0, x, 0.0),
        60..=119 => (x, 1.0, 0.0),
        120..=179 => (0.0, 1.0, x),
        180..=239 => (0.0, x, 1.0),
        240..=299 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    Color::Rgb {
        r: (r * 255.0) as u8,
        g: (g * 255.0) as u8,
        b: (b * 255.0) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hue_sweeps_with_bin_index() {
        let low = bin_color(0, 32);
        let high = bin_color(31, 32);
        assert_ne!(low, high);

        // 200° is in the blue sextant.
        match low {
            Color::Rgb { r, g: _, b } => assert!(b > r),
            other => panic!("expected rgb, got {:?}", other),
        }
    }
}
