use crate::core::Frame;
use crate::error::Result;
use crate::input::{parse_frames, Record};
use crate::runtime::FrameSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Progressive source re-reading a recording that is still being written
///
/// Yields the whole sequence again whenever it holds more frames than the
/// last one handed out.
pub struct FileFollower {
    path: PathBuf,
    name: String,
    known_frames: usize,
}

impl FileFollower {
    /// Follow `path`, of which `known_frames` frames are already loaded
    pub fn new(path: impl AsRef<Path>, known_frames: usize) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: path.display().to_string(),
            path,
            known_frames,
        }
    }

    pub fn known_frames(&self) -> usize {
        self.known_frames
    }
}

#[async_trait]
impl FrameSource<Record> for FileFollower {
    fn name(&self) -> &str {
        &self.name
    }

    async fn poll_frames(&mut self) -> Result<Option<Vec<Frame<Record>>>> {
        let data = tokio::fs::read(&self.path).await?;
        let frames = parse_frames(&self.path, &data)?;
        if frames.len() <= self.known_frames {
            return Ok(None);
        }

        debug!(
            "{} grew from {} to {} frames",
            self.name,
            self.known_frames,
            frames.len()
        );
        self.known_frames = frames.len();
        Ok(Some(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_yields_only_growth() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "time,value").unwrap();
        writeln!(file, "0,a").unwrap();
        file.flush().unwrap();

        let mut follower = FileFollower::new(file.path(), 1);
        assert!(follower.poll_frames().await.unwrap().is_none());

        writeln!(file, "100,b").unwrap();
        writeln!(file, "250,c").unwrap();
        file.flush().unwrap();

        let frames = follower.poll_frames().await.unwrap().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].time, 250);
        assert_eq!(follower.known_frames(), 3);

        assert!(follower.poll_frames().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut follower = FileFollower::new(dir.path().join("gone.csv"), 0);
        assert!(follower.poll_frames().await.is_err());
    }
}
