pub mod charts;
pub mod input;
pub mod screen;
pub mod starfield;
pub mod terminal;
pub mod visualizer;

pub use charts::{Panel, RenderedReport, render_report};
pub use terminal::TerminalView;

use crate::audio::SpectrumFrame;
use crate::error::WorkflowError;
use crate::messages::Phase;
use std::path::PathBuf;

/// Everything the user can do, independent of how it arrived (key press,
/// pasted path, dropped file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowInput {
    ToggleRecording,
    SelectPath(PathBuf),
    FocusNext,
    Preview,
    Submit,
    Quit,
}

/// Status-line snapshot of one source slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub label: String,
    pub value: String,
    pub focused: bool,
    pub records: bool,
}

/// Presentation seam for the workflow.
///
/// The workflow never touches the terminal directly; it talks to this
/// trait, which keeps it unit-testable with a recording fake. All errors
/// land here and are rendered in place of results.
pub trait View {
    fn set_slots(&mut self, slots: &[SlotView]);
    fn set_phase(&mut self, phase: Phase);
    fn set_status(&mut self, message: &str);
    fn show_error(&mut self, err: &WorkflowError);
    fn show_report(&mut self, report: &RenderedReport);
    fn draw_spectrum(&mut self, frame: &SpectrumFrame);
    fn clear_spectrum(&mut self);
    /// Periodic callback for decoration; no workflow state changes here.
    fn tick(&mut self, dt: std::time::Duration);
}
