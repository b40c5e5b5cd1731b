use crate::core::Frame;
use crate::error::Result;
use async_trait::async_trait;

/// Supplier of a growing frame sequence
///
/// Polled periodically by the `Player` while streaming is available.
/// Implementations:
/// - `FileFollower` re-reading a recording still being written
#[async_trait]
pub trait FrameSource<P>: Send {
    /// Name of this source, for logs
    fn name(&self) -> &str;

    /// Return the complete new sequence if it grew since the last poll
    async fn poll_frames(&mut self) -> Result<Option<Vec<Frame<P>>>>;
}
