use crate::analysis::{AnalysisBackend, AnalysisRequest, Endpoint, SubmissionPart};
use crate::audio::SpectrumFrame;
use crate::audio::playback;
use crate::error::WorkflowError;
use crate::messages::Phase;
use crate::services::RecorderHandle;
use crate::source::SourceSlot;
use crate::ui::{SlotView, View, WorkflowInput, render_report};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::watch;

/// What one analysis mode needs from the workflow: the endpoint and the
/// slot layout. This is the whole difference between the modes.
pub struct Capabilities {
    pub endpoint: Endpoint,
    pub slots: Vec<SlotSpec>,
}

pub struct SlotSpec {
    pub field: &'static str,
    pub label: &'static str,
    pub records: bool,
}

impl Capabilities {
    pub fn similarity(legacy_upload: bool) -> Self {
        Self {
            endpoint: if legacy_upload {
                Endpoint::LegacyUpload
            } else {
                Endpoint::Similarity
            },
            slots: vec![
                SlotSpec {
                    field: "song",
                    label: "Reference song",
                    records: false,
                },
                SlotSpec {
                    field: "user",
                    label: "Your take",
                    records: true,
                },
            ],
        }
    }

    pub fn pitch() -> Self {
        Self {
            endpoint: Endpoint::Pitch,
            slots: vec![SlotSpec {
                field: "audio",
                label: "Your audio",
                records: true,
            }],
        }
    }

    pub fn timbre() -> Self {
        Self {
            endpoint: Endpoint::Timbre,
            slots: vec![SlotSpec {
                field: "audio",
                label: "Your audio",
                records: true,
            }],
        }
    }
}

/// Microphone seam, so the workflow is testable without an audio device.
#[async_trait(?Send)]
pub trait CaptureControl {
    async fn start(&self) -> Result<(), WorkflowError>;
    async fn stop(&self) -> Result<Option<NamedTempFile>, WorkflowError>;
}

#[async_trait(?Send)]
impl CaptureControl for RecorderHandle {
    async fn start(&self) -> Result<(), WorkflowError> {
        RecorderHandle::start(self).await
    }

    async fn stop(&self) -> Result<Option<NamedTempFile>, WorkflowError> {
        RecorderHandle::stop(self).await
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The one workflow behind every analysis mode.
///
/// Owns the source slots and the phase machine; recording, scoring and
/// presentation sit behind seams. Lifecycle is explicit: construct, feed
/// inputs, dispose. Disposal stops a live session so no stream or timer
/// outlives the workflow.
pub struct Workflow<V, C, B> {
    endpoint: Endpoint,
    slots: Vec<SourceSlot>,
    focus: usize,
    phase: Phase,
    recorder: C,
    backend: B,
    spectrum_rx: watch::Receiver<SpectrumFrame>,
    view: V,
}

impl<V: View, C: CaptureControl, B: AnalysisBackend> Workflow<V, C, B> {
    pub fn new(
        caps: Capabilities,
        recorder: C,
        backend: B,
        spectrum_rx: watch::Receiver<SpectrumFrame>,
        mut view: V,
    ) -> Self {
        let slots: Vec<SourceSlot> = caps
            .slots
            .into_iter()
            .map(|s| SourceSlot::new(s.field, s.label, s.records))
            .collect();

        view.set_status("select audio, then press Enter to analyze");

        let mut workflow = Self {
            endpoint: caps.endpoint,
            slots,
            focus: 0,
            phase: Phase::Idle,
            recorder,
            backend,
            spectrum_rx,
            view,
        };
        workflow.sync_slots();
        workflow
    }

    /// Apply a path from the command line to a named slot.
    pub fn preselect(&mut self, field: &'static str, path: &Path) {
        if let Some(index) = self.slots.iter().position(|s| s.field == field) {
            self.focus = index;
            self.select_focused(path);
        }
    }

    pub async fn handle(&mut self, input: WorkflowInput) -> Flow {
        tracing::debug!("Workflow input: {:?} in {:?}", input, self.phase);
        match input {
            WorkflowInput::Quit => {
                self.dispose().await;
                return Flow::Quit;
            }
            WorkflowInput::ToggleRecording => self.toggle_recording().await,
            WorkflowInput::SelectPath(path) => self.select_focused(&path),
            WorkflowInput::FocusNext => {
                self.focus = (self.focus + 1) % self.slots.len().max(1);
                self.sync_slots();
            }
            WorkflowInput::Preview => self.preview(),
            WorkflowInput::Submit => self.submit().await,
        }
        Flow::Continue
    }

    /// Periodic callback from the event loop: live bars while recording,
    /// decoration otherwise.
    pub fn on_tick(&mut self, dt: Duration) {
        if self.phase == Phase::Recording {
            let frame = self.spectrum_rx.borrow().clone();
            self.view.draw_spectrum(&frame);
        } else {
            self.view.tick(dt);
        }
    }

    /// Stop anything still running. Safe to call twice.
    pub async fn dispose(&mut self) {
        if self.phase == Phase::Recording {
            tracing::info!("Disposing while recording, stopping the session");
            if let Err(e) = self.recorder.stop().await {
                tracing::warn!("Failed to stop recording on dispose: {}", e);
            }
            self.view.clear_spectrum();
        }
        self.phase = Phase::Idle;
    }

    async fn toggle_recording(&mut self) {
        match self.phase {
            Phase::Processing => {
                tracing::debug!("Busy, ignoring record toggle");
            }
            Phase::Idle => self.start_recording().await,
            Phase::Recording => self.stop_recording().await,
        }
    }

    async fn start_recording(&mut self) {
        if !self.slots.iter().any(|s| s.accepts_recording) {
            self.view.set_status("this mode takes files only");
            return;
        }

        match self.recorder.start().await {
            Ok(()) => {
                self.phase = Phase::Recording;
                self.view.set_phase(self.phase);
                self.view.set_status("recording (press r to stop)");
            }
            Err(e) => {
                // Stay idle; microphone trouble is recoverable by retry.
                self.view.show_error(&e);
            }
        }
    }

    async fn stop_recording(&mut self) {
        let result = self.recorder.stop().await;

        self.phase = Phase::Idle;
        self.view.set_phase(self.phase);
        self.view.clear_spectrum();

        match result {
            Ok(Some(clip)) => {
                if let Some(slot) = self.slots.iter_mut().find(|s| s.accepts_recording) {
                    slot.set_recording(clip);
                }
                self.sync_slots();
                self.view.set_status("recorded clip ready (p to preview)");
            }
            Ok(None) => {
                self.view.set_status("nothing was recording");
            }
            Err(e) => self.view.show_error(&e),
        }
    }

    fn select_focused(&mut self, path: &Path) {
        if self.phase != Phase::Idle {
            self.view.set_status("finish the current action first");
            return;
        }

        let slot = &mut self.slots[self.focus];
        match slot.select_file(path) {
            Ok(()) => {
                self.sync_slots();
                self.view.set_status("");
            }
            Err(rejection) => {
                // Previous selection, if any, stays in place.
                tracing::warn!("Rejected {}: {}", path.display(), rejection);
                self.view
                    .set_status(&format!("{}: {}", path.display(), rejection));
            }
        }
    }

    fn preview(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        match self.slots[self.focus].source() {
            Some(source) => {
                let path = source.path().to_path_buf();
                self.view
                    .set_status(&format!("playing {}", source.display_name()));
                tokio::spawn(playback::play_preview(path));
            }
            None => self.view.set_status("nothing selected to play"),
        }
    }

    async fn submit(&mut self) {
        match self.phase {
            Phase::Recording => {
                self.view.set_status("stop recording before analyzing");
                return;
            }
            Phase::Processing => return,
            Phase::Idle => {}
        }

        // Every slot is required; fail before any network activity.
        if let Some(empty) = self.slots.iter().find(|s| !s.is_filled()) {
            self.view
                .show_error(&WorkflowError::MissingInput(empty.label.to_string()));
            return;
        }

        let request = match self.build_request().await {
            Ok(request) => request,
            Err(e) => {
                self.view.show_error(&e);
                return;
            }
        };

        // The submit trigger stays disabled until the call resolves, on
        // every outcome.
        self.phase = Phase::Processing;
        self.view.set_phase(self.phase);
        self.view.set_status("analyzing…");

        let result = self.backend.submit(request).await;

        self.phase = Phase::Idle;
        self.view.set_phase(self.phase);

        match result {
            Ok(report) => {
                tracing::info!("Analysis complete, score {:?}", report.display_score());
                self.view.set_status("");
                self.view.show_report(&render_report(&report));
            }
            Err(e) => {
                tracing::warn!("Analysis failed: {}", e);
                self.view.show_error(&e);
            }
        }
    }

    async fn build_request(&self) -> Result<AnalysisRequest, WorkflowError> {
        let mut parts = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let source = slot
                .source()
                .ok_or_else(|| WorkflowError::MissingInput(slot.label.to_string()))?;
            let bytes = tokio::fs::read(source.path()).await.map_err(|e| {
                WorkflowError::Transport(format!(
                    "failed to read {}: {}",
                    source.display_name(),
                    e
                ))
            })?;
            parts.push(SubmissionPart {
                field: slot.field,
                file_name: source.display_name().to_string(),
                mime: source.mime().to_string(),
                bytes,
            });
        }

        Ok(AnalysisRequest {
            endpoint: self.endpoint,
            parts,
        })
    }

    fn sync_slots(&mut self) {
        let slots: Vec<SlotView> = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| SlotView {
                label: slot.label.to_string(),
                value: slot.display().to_string(),
                focused: i == self.focus,
                records: slot.accepts_recording,
            })
            .collect();
        self.view.set_slots(&slots);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisReport;
    use crate::ui::RenderedReport;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeViewState {
        phases: Vec<Phase>,
        statuses: Vec<String>,
        errors: Vec<WorkflowError>,
        reports: Vec<String>,
        slots: Vec<Vec<SlotView>>,
        spectrum_cleared: usize,
    }

    #[derive(Clone, Default)]
    struct FakeView(Rc<RefCell<FakeViewState>>);

    impl View for FakeView {
        fn set_slots(&mut self, slots: &[SlotView]) {
            self.0.borrow_mut().slots.push(slots.to_vec());
        }
        fn set_phase(&mut self, phase: Phase) {
            self.0.borrow_mut().phases.push(phase);
        }
        fn set_status(&mut self, message: &str) {
            self.0.borrow_mut().statuses.push(message.to_string());
        }
        fn show_error(&mut self, err: &WorkflowError) {
            self.0.borrow_mut().errors.push(err.clone());
        }
        fn show_report(&mut self, report: &RenderedReport) {
            self.0.borrow_mut().reports.push(report.headline.clone());
        }
        fn draw_spectrum(&mut self, _frame: &SpectrumFrame) {}
        fn clear_spectrum(&mut self) {
            self.0.borrow_mut().spectrum_cleared += 1;
        }
        fn tick(&mut self, _dt: Duration) {}
    }

    #[derive(Clone, Default)]
    struct FakeRecorder {
        starts: Rc<Cell<usize>>,
        stops: Rc<Cell<usize>>,
        deny: bool,
    }

    #[async_trait(?Send)]
    impl CaptureControl for FakeRecorder {
        async fn start(&self) -> Result<(), WorkflowError> {
            if self.deny {
                return Err(WorkflowError::Permission("denied".into()));
            }
            self.starts.set(self.starts.get() + 1);
            Ok(())
        }

        async fn stop(&self) -> Result<Option<NamedTempFile>, WorkflowError> {
            self.stops.set(self.stops.get() + 1);
            let clip = NamedTempFile::new().unwrap();
            fs::write(clip.path(), b"wav-bytes").unwrap();
            Ok(Some(clip))
        }
    }

    #[derive(Clone)]
    struct FakeBackend {
        calls: Rc<Cell<usize>>,
        response: Rc<RefCell<Result<AnalysisReport, WorkflowError>>>,
    }

    impl FakeBackend {
        fn replying(json: &str) -> Self {
            Self {
                calls: Rc::new(Cell::new(0)),
                response: Rc::new(RefCell::new(Ok(serde_json::from_str(json).unwrap()))),
            }
        }

        fn failing(err: WorkflowError) -> Self {
            Self {
                calls: Rc::new(Cell::new(0)),
                response: Rc::new(RefCell::new(Err(err))),
            }
        }
    }

    #[async_trait(?Send)]
    impl AnalysisBackend for FakeBackend {
        async fn submit(&self, _request: AnalysisRequest) -> Result<AnalysisReport, WorkflowError> {
            self.calls.set(self.calls.get() + 1);
            self.response.borrow().clone()
        }
    }

    fn workflow(
        caps: Capabilities,
        recorder: FakeRecorder,
        backend: FakeBackend,
    ) -> (Workflow<FakeView, FakeRecorder, FakeBackend>, FakeView) {
        let view = FakeView::default();
        let (_tx, rx) = watch::channel(SpectrumFrame::default());
        let workflow = Workflow::new(caps, recorder, backend, rx, view.clone());
        (workflow, view)
    }

    fn audio_file(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"audio-bytes").unwrap();
        path
    }

    #[tokio::test]
    async fn test_toggle_never_opens_two_sessions() {
        let recorder = FakeRecorder::default();
        let (mut wf, _view) = workflow(
            Capabilities::pitch(),
            recorder.clone(),
            FakeBackend::replying("{}"),
        );

        wf.handle(WorkflowInput::ToggleRecording).await;
        // The second toggle is a stop, not a second start.
        wf.handle(WorkflowInput::ToggleRecording).await;

        assert_eq!(recorder.starts.get(), 1);
        assert_eq!(recorder.stops.get(), 1);
    }

    #[tokio::test]
    async fn test_stopped_recording_fills_the_slot() {
        let (mut wf, view) = workflow(
            Capabilities::pitch(),
            FakeRecorder::default(),
            FakeBackend::replying("{}"),
        );

        wf.handle(WorkflowInput::ToggleRecording).await;
        wf.handle(WorkflowInput::ToggleRecording).await;

        let state = view.0.borrow();
        let last_slots = state.slots.last().unwrap();
        assert_eq!(last_slots[0].value, "recording.wav");
        assert!(state.spectrum_cleared > 0);
    }

    #[tokio::test]
    async fn test_denied_microphone_stays_idle() {
        let recorder = FakeRecorder {
            deny: true,
            ..FakeRecorder::default()
        };
        let (mut wf, view) = workflow(
            Capabilities::pitch(),
            recorder.clone(),
            FakeBackend::replying("{}"),
        );

        wf.handle(WorkflowInput::ToggleRecording).await;

        assert_eq!(wf.phase, Phase::Idle);
        assert!(matches!(
            view.0.borrow().errors.last(),
            Some(WorkflowError::Permission(_))
        ));
        // Next toggle is a fresh start attempt, not a stop.
        assert_eq!(recorder.stops.get(), 0);
    }

    #[tokio::test]
    async fn test_missing_source_blocks_submission() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::replying(r#"{"score": 92}"#);
        let (mut wf, view) = workflow(
            Capabilities::similarity(false),
            FakeRecorder::default(),
            backend.clone(),
        );

        wf.preselect("song", &audio_file(dir.path(), "song.mp3"));
        wf.handle(WorkflowInput::Submit).await;

        assert_eq!(backend.calls.get(), 0, "no network call may be issued");
        assert_eq!(
            view.0.borrow().errors.last(),
            Some(&WorkflowError::MissingInput("Your take".into()))
        );
    }

    #[tokio::test]
    async fn test_remote_error_restores_idle_phase() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::failing(WorkflowError::Remote("x".into()));
        let (mut wf, view) = workflow(Capabilities::pitch(), FakeRecorder::default(), backend);

        wf.preselect("audio", &audio_file(dir.path(), "take.wav"));
        wf.handle(WorkflowInput::Submit).await;

        let state = view.0.borrow();
        assert_eq!(
            state.errors.last(),
            Some(&WorkflowError::Remote("x".into()))
        );
        // Busy went on, then off, on the failure path too.
        assert_eq!(
            state.phases,
            vec![Phase::Processing, Phase::Idle]
        );
        assert_eq!(wf.phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_successful_submission_renders_band() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::replying(r#"{"score": 92, "feedback": "Nice"}"#);
        let (mut wf, view) = workflow(
            Capabilities::similarity(false),
            FakeRecorder::default(),
            backend.clone(),
        );

        wf.preselect("song", &audio_file(dir.path(), "song.mp3"));
        // Record the user take instead of uploading one.
        wf.handle(WorkflowInput::ToggleRecording).await;
        wf.handle(WorkflowInput::ToggleRecording).await;
        wf.handle(WorkflowInput::Submit).await;

        assert_eq!(backend.calls.get(), 1);
        let state = view.0.borrow();
        let headline = state.reports.last().unwrap();
        assert!(headline.contains("92%"));
        assert!(headline.contains("excellent"));
    }

    #[tokio::test]
    async fn test_rejected_file_keeps_previous_selection() {
        let dir = tempfile::tempdir().unwrap();
        let (mut wf, view) = workflow(
            Capabilities::pitch(),
            FakeRecorder::default(),
            FakeBackend::replying("{}"),
        );

        let good = audio_file(dir.path(), "take.wav");
        let bad = dir.path().join("notes.txt");
        fs::write(&bad, b"text").unwrap();

        wf.handle(WorkflowInput::SelectPath(good)).await;
        wf.handle(WorkflowInput::SelectPath(bad)).await;

        let state = view.0.borrow();
        assert_eq!(state.slots.last().unwrap()[0].value, "take.wav");
        assert!(state.statuses.last().unwrap().contains("not an audio file"));
    }

    #[tokio::test]
    async fn test_dispose_stops_live_recording() {
        let recorder = FakeRecorder::default();
        let (mut wf, _view) = workflow(
            Capabilities::pitch(),
            recorder.clone(),
            FakeBackend::replying("{}"),
        );

        wf.handle(WorkflowInput::ToggleRecording).await;
        wf.dispose().await;

        assert_eq!(recorder.stops.get(), 1);
        assert_eq!(wf.phase, Phase::Idle);
    }
}
