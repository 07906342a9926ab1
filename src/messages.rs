use crate::error::WorkflowError;
use tempfile::NamedTempFile;
use tokio::sync::oneshot;

/// Commands for the Recorder service
pub enum RecorderCommand {
    Start(oneshot::Sender<Result<(), WorkflowError>>),
    /// Stop replies with the finished clip, or `None` when nothing was
    /// recording (stop is idempotent).
    Stop(oneshot::Sender<Result<Option<NamedTempFile>, WorkflowError>>),
}

/// Workflow state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Recording,
    /// A submission is in flight; the submit trigger stays disabled until
    /// the call resolves, on every outcome.
    Processing,
}
