use anyhow::Result;
use async_trait::async_trait;

/// Streaming destination for captured samples.
///
/// Implementations encode audio as it arrives (WAV today, other containers
/// if the service ever accepts them) instead of buffering a whole take.
#[async_trait]
pub trait AudioSink: Send {
    /// Write one chunk of samples. The Vec is moved to avoid copying.
    fn write_chunk(&mut self, samples: Vec<f32>) -> Result<()>;

    /// Flush and close the underlying encoder.
    async fn finalize(&mut self) -> Result<()>;
}
