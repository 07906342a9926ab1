use super::format::AudioFormat;
use crate::error::WorkflowError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use ringbuf::{HeapRb, traits::*};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};

/// Length of the chunks handed to the recorder, in seconds. Matches the
/// visualizer cadence so every chunk can become one spectrum frame.
pub const CHUNK_SECONDS: f32 = 0.05;

pub struct AudioCapture;

impl AudioCapture {
    /// Open the default input device and start capturing.
    ///
    /// Returns the stream, which must be kept alive for capture to continue;
    /// dropping it releases the hardware. Chunks are delivered via chunk_tx.
    ///
    /// Fails with [`WorkflowError::Permission`] when no input device exists
    /// or the stream cannot be opened (denied, busy, unsupported format).
    pub fn start(
        format: AudioFormat,
        chunk_tx: mpsc::Sender<Vec<f32>>,
    ) -> Result<cpal::Stream, WorkflowError> {
        let ring = HeapRb::<f32>::new(format.samples_for_duration(60.0));
        let (mut producer, consumer) = ring.split();

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| WorkflowError::Permission("no input device available".into()))?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let notify = Arc::new(Notify::new());
        let notify_callback = notify.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    producer.push_slice(data);
                    notify_callback.notify_one();
                },
                move |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| WorkflowError::Permission(e.to_string()))?;

        stream
            .play()
            .map_err(|e| WorkflowError::Permission(e.to_string()))?;

        let chunk_size = format.samples_for_duration(CHUNK_SECONDS);
        tokio::task::spawn_local(Self::bridge_task(consumer, chunk_tx, chunk_size, notify));

        tracing::info!("Audio capture started at {} Hz", format.sample_rate);
        Ok(stream)
    }

    async fn bridge_task(
        mut consumer: impl Consumer<Item = f32>,
        tx: mpsc::Sender<Vec<f32>>,
        chunk_size: usize,
        notify: Arc<Notify>,
    ) {
        loop {
            notify.notified().await;

            // Drain in chunk-sized pieces so a burst of samples does not
            // collapse into one oversized frame.
            while consumer.occupied_len() >= chunk_size {
                let mut chunk = vec![0.0f32; chunk_size];
                let n = consumer.pop_slice(&mut chunk);
                chunk.truncate(n);

                if tx.send(chunk).await.is_err() {
                    return;
                }
            }
        }
    }
}
