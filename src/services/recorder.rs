use crate::audio::capture::CHUNK_SECONDS;
use crate::audio::{AudioCapture, AudioFormat, AudioSink, SpectrumFrame, SpectrumWindow, WavSink};
use crate::error::WorkflowError;
use crate::messages::RecorderCommand;
use tempfile::NamedTempFile;
use tokio::sync::{mpsc, watch};

/// Coordinates one microphone session at a time.
///
/// This service:
/// - Opens and owns the capture stream between start and stop
/// - Streams chunks to an AudioSink for WAV encoding
/// - Publishes a spectrum frame per chunk for the live visualizer
/// - Replies to start/stop commands, with stop being idempotent
///
/// Note: holds cpal::Stream which is !Send, so it must be spawned on a
/// LocalSet using tokio::task::spawn_local.
pub struct Recorder {
    format: AudioFormat,
    cmd_rx: mpsc::Receiver<RecorderCommand>,
    audio_rx: mpsc::Receiver<Vec<f32>>,
    audio_tx: mpsc::Sender<Vec<f32>>,
    spectrum_tx: watch::Sender<SpectrumFrame>,
    window: SpectrumWindow,
    sink: Option<Box<dyn AudioSink + Send>>,
    stream: Option<cpal::Stream>,
    temp_file: Option<NamedTempFile>,
    recording: bool,
}

impl Recorder {
    pub fn new(
        format: AudioFormat,
        cmd_rx: mpsc::Receiver<RecorderCommand>,
        spectrum_tx: watch::Sender<SpectrumFrame>,
    ) -> Self {
        let (audio_tx, audio_rx) = mpsc::channel(100);
        Self {
            format,
            cmd_rx,
            audio_rx,
            audio_tx,
            spectrum_tx,
            window: SpectrumWindow::new(format.sample_rate),
            sink: None,
            stream: None,
            temp_file: None,
            recording: false,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }

                Some(chunk) = self.audio_rx.recv(), if self.recording => {
                    self.handle_chunk(chunk);
                }
            }
        }
    }

    fn handle_chunk(&mut self, chunk: Vec<f32>) {
        self.window.push(&chunk);
        if let Some(frame) = self.window.frame() {
            let _ = self.spectrum_tx.send(frame);
        }

        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.write_chunk(chunk) {
                tracing::error!("Failed to write audio chunk: {}", e);
                self.recording = false;
            }
        }
    }

    async fn handle_command(&mut self, cmd: RecorderCommand) {
        match cmd {
            RecorderCommand::Start(reply) => {
                let _ = reply.send(self.start());
            }
            RecorderCommand::Stop(reply) => {
                let _ = reply.send(self.stop().await);
            }
        }
    }

    fn start(&mut self) -> Result<(), WorkflowError> {
        if self.stream.is_some() {
            // The workflow guards the trigger; a second start here would
            // open a concurrent stream, so refuse it outright.
            tracing::warn!("Start ignored: a recording session is already live");
            return Ok(());
        }

        let temp_file = tempfile::Builder::new()
            .prefix("vocary-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| WorkflowError::Permission(format!("temp file: {}", e)))?;

        let sink = WavSink::create(temp_file.path().to_path_buf(), self.format)
            .map_err(|e| WorkflowError::Permission(e.to_string()))?;

        let stream = AudioCapture::start(self.format, self.audio_tx.clone())?;

        self.temp_file = Some(temp_file);
        self.sink = Some(Box::new(sink));
        self.stream = Some(stream);
        self.window.reset();
        self.recording = true;
        tracing::info!("Recording started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<Option<NamedTempFile>, WorkflowError> {
        if self.stream.is_none() {
            // Idempotent: stopping an idle recorder changes nothing.
            tracing::debug!("Stop on idle recorder, nothing to do");
            return Ok(None);
        }

        self.recording = false;

        // Release the hardware first. The cleared spectrum frame below must
        // go out only after the stream is gone, so the visualizer never
        // draws from a dead source.
        self.stream = None;

        // Drain whatever the bridge already queued.
        while let Ok(chunk) = self.audio_rx.try_recv() {
            if let Some(sink) = self.sink.as_mut() {
                if let Err(e) = sink.write_chunk(chunk) {
                    tracing::error!("Failed to write audio chunk during drain: {}", e);
                    break;
                }
            }
        }

        // Swap in a fresh audio channel; the old receiver drops, the bridge
        // task's send fails and it exits cleanly.
        let (new_audio_tx, new_audio_rx) = mpsc::channel(100);
        self.audio_tx = new_audio_tx;
        self.audio_rx = new_audio_rx;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let _ = self.spectrum_tx.send(SpectrumFrame::default());
        self.window.reset();

        let finalize_result = match self.sink.as_mut() {
            Some(sink) => sink.finalize().await,
            None => Ok(()),
        };
        self.sink = None;

        let result = match finalize_result {
            Ok(()) => self
                .temp_file
                .take()
                .map(Some)
                .ok_or_else(|| WorkflowError::Permission("temp file was not created".into())),
            Err(e) => Err(WorkflowError::Permission(e.to_string())),
        };

        tracing::info!("Recording stopped");
        result
    }
}

/// Handle for communicating with the Recorder
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<RecorderCommand>,
}

impl RecorderHandle {
    pub fn new(tx: mpsc::Sender<RecorderCommand>) -> Self {
        Self { tx }
    }

    pub async fn start(&self) -> Result<(), WorkflowError> {
        let (reply, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(RecorderCommand::Start(reply))
            .await
            .map_err(|_| WorkflowError::Permission("recorder service is gone".into()))?;
        rx.await
            .map_err(|_| WorkflowError::Permission("recorder did not reply".into()))?
    }

    /// Stop the current session, returning the clip, or `None` when idle.
    pub async fn stop(&self) -> Result<Option<NamedTempFile>, WorkflowError> {
        let (reply, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(RecorderCommand::Stop(reply))
            .await
            .map_err(|_| WorkflowError::Permission("recorder service is gone".into()))?;
        rx.await
            .map_err(|_| WorkflowError::Permission("recorder did not reply".into()))?
    }
}

/// Expected chunk cadence, for sizing the recorder's channels.
pub fn chunk_duration() -> std::time::Duration {
    std::time::Duration::from_secs_f32(CHUNK_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Stop before any start must not touch the audio device, so this runs
    // fine on machines with no microphone.
    #[tokio::test]
    async fn test_stop_on_idle_recorder_is_a_no_op() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let (spectrum_tx, _spectrum_rx) = watch::channel(SpectrumFrame::default());
                let (cmd_tx, cmd_rx) = mpsc::channel(10);
                let recorder = Recorder::new(AudioFormat::default(), cmd_rx, spectrum_tx);
                tokio::task::spawn_local(recorder.run());

                let handle = RecorderHandle::new(cmd_tx);
                assert!(handle.stop().await.unwrap().is_none());
                // Idempotent: a second stop is just as quiet.
                assert!(handle.stop().await.unwrap().is_none());
            })
            .await;
    }
}
