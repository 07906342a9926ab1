//! Text panels for analysis results.
//!
//! Everything renders to plain rows so the terminal view can draw them and
//! tests can assert on them. Panel choice follows the payload shape: a line
//! panel for a pitch contour, bars for a note distribution, trait bars for
//! timbre measurements, plain rows for similarity details.

use crate::analysis::AnalysisReport;

const LINE_PANEL_WIDTH: usize = 60;
const LINE_PANEL_HEIGHT: usize = 8;
const BAR_MAX_CELLS: usize = 30;

pub struct RenderedReport {
    pub title: String,
    pub headline: String,
    pub feedback: String,
    pub panels: Vec<Panel>,
}

pub struct Panel {
    pub title: String,
    pub rows: Vec<String>,
}

/// Map a payload to displayable text. Total on partial payloads: every
/// missing field has a fixed fallback.
pub fn render_report(report: &AnalysisReport) -> RenderedReport {
    let title = report
        .title
        .clone()
        .unwrap_or_else(|| "Analysis Results".to_string());

    let (headline, band) = match report.display_score() {
        Some(score) => {
            let band = crate::analysis::Band::from_score(score);
            (
                format!("{:.0}%  {} {}", score, band.icon(), band.label()),
                Some(band),
            )
        }
        None => ("Analysis complete".to_string(), None),
    };

    let feedback = report
        .feedback
        .clone()
        .or_else(|| band.map(|b| b.default_feedback().to_string()))
        .unwrap_or_else(|| "No feedback provided.".to_string());

    let mut panels = Vec::new();

    if let Some(details) = report.details.as_ref().filter(|d| !d.is_empty()) {
        panels.push(Panel {
            title: "Details".to_string(),
            rows: details.iter().map(|d| format!("- {}", d)).collect(),
        });
    }

    if !report.pitches.is_empty() {
        let mut rows = line_rows(&report.pitches, LINE_PANEL_WIDTH, LINE_PANEL_HEIGHT);
        if let Some(mean) = report.mean_pitch {
            rows.push(format!("mean pitch: {:.1} Hz", mean));
        }
        panels.push(Panel {
            title: "Pitch contour".to_string(),
            rows,
        });
    }

    if !report.note_distribution.is_empty() {
        let mut entries: Vec<(String, f64)> = report
            .note_distribution
            .iter()
            .map(|(note, count)| (note.clone(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        panels.push(Panel {
            title: "Note distribution".to_string(),
            rows: bar_rows(&entries),
        });
    }

    if let Some(rate) = report.vibrato_rate {
        panels.push(Panel {
            title: "Vibrato".to_string(),
            rows: vec![format!("Detected vibrato rate: {:.1} Hz", rate)],
        });
    }

    let timbre_rows = timbre_rows(report);
    if !timbre_rows.is_empty() {
        panels.push(Panel {
            title: "Timbre profile".to_string(),
            rows: timbre_rows,
        });
    }

    RenderedReport {
        title,
        headline,
        feedback,
        panels,
    }
}

/// Downsampled dot plot of a value series.
fn line_rows(values: &[f64], width: usize, height: usize) -> Vec<String> {
    let width = width.min(values.len().max(1));
    let sampled: Vec<f64> = (0..width)
        .map(|col| values[col * values.len() / width])
        .collect();

    let min = sampled.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = (max - min).max(f64::EPSILON);

    let mut grid = vec![vec![' '; width]; height];
    for (col, value) in sampled.iter().enumerate() {
        let level = ((value - min) / span * (height - 1) as f64).round() as usize;
        grid[height - 1 - level][col] = '•';
    }

    let mut rows: Vec<String> = grid.into_iter().map(|r| r.into_iter().collect()).collect();
    rows.push(format!("range: {:.1} to {:.1} Hz", min, max));
    rows
}

/// Horizontal bars scaled to the largest entry.
fn bar_rows(entries: &[(String, f64)]) -> Vec<String> {
    let max = entries
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(f64::EPSILON);
    let label_width = entries.iter().map(|(l, _)| l.len()).max().unwrap_or(0);

    entries
        .iter()
        .map(|(label, value)| {
            let cells = ((value / max) * BAR_MAX_CELLS as f64).round() as usize;
            format!(
                "{:>width$} │{}  {}",
                label,
                "█".repeat(cells),
                trim_number(*value),
                width = label_width
            )
        })
        .collect()
}

/// The radar chart's terminal equivalent: one scaled bar per trait.
fn timbre_rows(report: &AnalysisReport) -> Vec<String> {
    let mut rows = Vec::new();

    let traits = [
        ("brightness", report.brightness, 4000.0, " Hz"),
        ("richness", report.richness, 4000.0, " Hz"),
        ("clarity", report.hnr, 30.0, " dB"),
    ];
    for (label, value, scale, unit) in traits {
        if let Some(value) = value {
            let cells = ((value / scale).clamp(0.0, 1.0) * BAR_MAX_CELLS as f64).round() as usize;
            rows.push(format!(
                "{:>10} │{:<width$}│ {}{}",
                label,
                "█".repeat(cells),
                trim_number(value),
                unit,
                width = BAR_MAX_CELLS
            ));
        }
    }

    for (i, formant) in report.formants.iter().enumerate() {
        rows.push(format!("{:>10} │ {:.0} Hz", format!("F{}", i + 1), formant));
    }

    if let Some(voice_type) = &report.voice_type {
        rows.push(format!("voice type: {}", voice_type));
    }

    rows
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}
