//! Terminal event reader.
//!
//! A dedicated blocking thread polls crossterm and translates raw events
//! into [`WorkflowInput`] values on a channel, the same background-listener
//! shape used for the recorder commands. File selection arrives two ways:
//! a bracketed paste (how terminals deliver drag-and-drop) is applied
//! immediately; otherwise characters that look like the start of a path
//! open a typing buffer that Enter applies.

use crate::ui::WorkflowInput;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, poll, read};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

pub fn spawn_input_reader() -> mpsc::Receiver<WorkflowInput> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        let mut buffer = String::new();
        loop {
            match poll(Duration::from_millis(100)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::error!("Terminal event poll failed: {}", e);
                    break;
                }
            }

            let event = match read() {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!("Terminal event read failed: {}", e);
                    break;
                }
            };

            if let Some(input) = translate(&event, &mut buffer) {
                if tx.blocking_send(input).is_err() {
                    break;
                }
            }
        }
    });

    rx
}

/// Characters that open the path-typing buffer. Hotkeys stay live until
/// one of these is seen, so "r" records but "./take.wav" types.
fn starts_path(c: char) -> bool {
    matches!(c, '/' | '~' | '.' | '"' | '\'')
}

fn translate(event: &Event, buffer: &mut String) -> Option<WorkflowInput> {
    match event {
        Event::Paste(text) => clean_path(text).map(WorkflowInput::SelectPath),
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Some(WorkflowInput::Quit);
            }
            match key.code {
                KeyCode::Enter => {
                    if buffer.is_empty() {
                        Some(WorkflowInput::Submit)
                    } else {
                        let typed = std::mem::take(buffer);
                        clean_path(&typed).map(WorkflowInput::SelectPath)
                    }
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    None
                }
                KeyCode::Esc => {
                    if buffer.is_empty() {
                        Some(WorkflowInput::Quit)
                    } else {
                        buffer.clear();
                        None
                    }
                }
                KeyCode::Tab => {
                    buffer.clear();
                    Some(WorkflowInput::FocusNext)
                }
                KeyCode::Char(c) => {
                    if !buffer.is_empty() {
                        buffer.push(c);
                        return None;
                    }
                    match c {
                        'q' => Some(WorkflowInput::Quit),
                        'r' => Some(WorkflowInput::ToggleRecording),
                        'p' => Some(WorkflowInput::Preview),
                        c if starts_path(c) => {
                            buffer.push(c);
                            None
                        }
                        _ => None,
                    }
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Normalize a pasted or typed path: trim, strip quoting, expand `~/`.
fn clean_path(raw: &str) -> Option<PathBuf> {
    let mut text = raw.trim();
    for quote in ['"', '\''] {
        text = text
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
            .unwrap_or(text);
    }
    if text.is_empty() {
        return None;
    }

    if let Some(rest) = text.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Some(PathBuf::from(home).join(rest));
        }
    }
    Some(PathBuf::from(text))
}
