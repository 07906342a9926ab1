use crate::audio::SpectrumFrame;
use crate::error::WorkflowError;
use crate::messages::Phase;
use crate::ui::screen::Screen;
use crate::ui::starfield::Starfield;
use crate::ui::{RenderedReport, SlotView, View, visualizer};
use crossterm::style::Color;
use std::io;
use std::time::Duration;

/// Rows reserved at the bottom for slots, status and key hints.
const CHROME_ROWS: u16 = 5;

/// Crossterm-backed [`View`].
///
/// The upper region shows one thing at a time: the starfield while idle,
/// the spectrum bars while recording, the last report or error after a
/// submission. The bottom rows are persistent chrome. In plain mode (no
/// alternate screen) everything degrades to line output, which keeps the
/// workflow usable over a pipe or in a terminal without raw mode.
pub struct TerminalView {
    screen: Screen,
    starfield: Option<Starfield>,
    spectrum_enabled: bool,
    slots: Vec<SlotView>,
    phase: Phase,
    status: String,
    showing_result: bool,
}

impl TerminalView {
    pub fn new(interactive: bool, starfield_enabled: bool, spectrum_enabled: bool) -> io::Result<Self> {
        let screen = Screen::new(interactive)?;
        let (width, height) = screen.size();
        let starfield = (interactive && starfield_enabled)
            .then(|| Starfield::new(width, height.saturating_sub(CHROME_ROWS)));

        Ok(Self {
            screen,
            starfield,
            spectrum_enabled,
            slots: Vec::new(),
            phase: Phase::Idle,
            status: String::new(),
            showing_result: false,
        })
    }

    fn region_bottom(&self) -> u16 {
        self.screen.size().1.saturating_sub(CHROME_ROWS)
    }

    fn draw_chrome(&mut self) {
        let (_, height) = self.screen.size();
        if height < CHROME_ROWS {
            return;
        }
        let base = height - CHROME_ROWS;
        self.screen.clear_rows(base, height);

        for (i, slot) in self.slots.iter().take(2).enumerate() {
            let marker = if slot.focused { '▸' } else { ' ' };
            let record_hint = if slot.records { "  (r records here)" } else { "" };
            let line = format!("{} {}: {}{}", marker, slot.label, slot.value, record_hint);
            self.screen.set_str(
                0,
                (base + i as u16) as i32,
                &line,
                Some(Color::Grey),
                slot.focused,
            );
        }

        let (phase_label, phase_color) = match self.phase {
            Phase::Idle => ("idle", Color::DarkGrey),
            Phase::Recording => ("● recording", Color::Red),
            Phase::Processing => ("⋯ analyzing", Color::Yellow),
        };
        let status_line = format!("[{}] {}", phase_label, self.status);
        self.screen
            .set_str(0, (base + 2) as i32, &status_line, Some(phase_color), false);

        let hints = "r record · p preview · Tab focus · Enter submit · paste or type a path · q quit";
        self.screen
            .set_str(0, (base + 3) as i32, hints, Some(Color::DarkGrey), false);
    }

    fn repaint(&mut self) {
        self.draw_chrome();
        if let Err(e) = self.screen.render() {
            tracing::warn!("Terminal render failed: {}", e);
        }
    }

    fn draw_rows(&mut self, rows: &[(String, Option<Color>, bool)]) {
        let bottom = self.region_bottom();
        self.screen.clear_rows(0, bottom);
        for (i, (text, color, bold)) in rows.iter().enumerate() {
            if i as u16 >= bottom {
                break;
            }
            self.screen.set_str(1, i as i32, text, *color, *bold);
        }
    }
}

impl View for TerminalView {
    fn set_slots(&mut self, slots: &[SlotView]) {
        self.slots = slots.to_vec();
        if self.screen.is_interactive() {
            self.repaint();
        } else {
            for slot in slots {
                println!("{}: {}", slot.label, slot.value);
            }
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if phase == Phase::Recording {
            self.showing_result = false;
        }
        self.phase = phase;
        if self.screen.is_interactive() {
            self.repaint();
        }
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        if self.screen.is_interactive() {
            self.repaint();
        } else if !message.is_empty() {
            println!("{}", message);
        }
    }

    fn show_error(&mut self, err: &WorkflowError) {
        if self.screen.is_interactive() {
            let rows = vec![
                (String::new(), None, false),
                ("Something went wrong".to_string(), Some(Color::Red), true),
                (String::new(), None, false),
                (err.to_string(), Some(Color::Red), false),
            ];
            self.draw_rows(&rows);
            self.showing_result = true;
            self.repaint();
        } else {
            println!("error: {}", err);
        }
    }

    fn show_report(&mut self, report: &RenderedReport) {
        let mut rows: Vec<(String, Option<Color>, bool)> = vec![
            (String::new(), None, false),
            (report.title.clone(), Some(Color::White), true),
            (report.headline.clone(), Some(Color::Cyan), true),
            (report.feedback.clone(), None, false),
        ];
        for panel in &report.panels {
            rows.push((String::new(), None, false));
            rows.push((panel.title.clone(), Some(Color::White), true));
            for row in &panel.rows {
                rows.push((row.clone(), Some(Color::Grey), false));
            }
        }

        if self.screen.is_interactive() {
            self.draw_rows(&rows);
            self.showing_result = true;
            self.repaint();
        } else {
            for (text, _, _) in rows {
                println!("{}", text);
            }
        }
    }

    fn draw_spectrum(&mut self, frame: &SpectrumFrame) {
        if !self.screen.is_interactive() || !self.spectrum_enabled {
            return;
        }
        let bottom = self.region_bottom();
        visualizer::draw(&mut self.screen, frame, 0, bottom);
        self.repaint();
    }

    fn clear_spectrum(&mut self) {
        if !self.screen.is_interactive() {
            return;
        }
        let bottom = self.region_bottom();
        self.screen.clear_rows(0, bottom);
        self.repaint();
    }

    fn tick(&mut self, dt: Duration) {
        if !self.screen.is_interactive() || self.phase != Phase::Idle || self.showing_result {
            return;
        }
        let bottom = self.region_bottom();
        let Some(starfield) = self.starfield.as_mut() else {
            return;
        };
        starfield.tick(dt);
        self.screen.clear_rows(0, bottom);
        starfield.draw(&mut self.screen, 0, bottom);
        self.repaint();
    }
}
