use std::error::Error;
use std::fmt;

/// Recoverable failures surfaced at the workflow boundary.
///
/// Every variant is rendered in place of results and leaves the session
/// usable; none of them tear the application down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Microphone access was denied or no input device is available.
    Permission(String),
    /// A required audio slot is still empty. Blocks submission before any
    /// network activity.
    MissingInput(String),
    /// The analysis service reported a semantic failure. The message is
    /// server-supplied and shown verbatim.
    Remote(String),
    /// The request never produced a usable response: connection failure,
    /// timeout, or an unparseable body.
    Transport(String),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::Permission(msg) => {
                write!(f, "microphone unavailable: {}", msg)
            }
            WorkflowError::MissingInput(what) => {
                write!(f, "missing input: {}", what)
            }
            WorkflowError::Remote(msg) => write!(f, "analysis failed: {}", msg),
            WorkflowError::Transport(msg) => {
                write!(f, "could not reach the analysis service: {}", msg)
            }
        }
    }
}

impl Error for WorkflowError {}
