pub mod csv;
pub mod follow;
pub mod jsonl;

pub use self::csv::read_csv;
pub use follow::FileFollower;
pub use jsonl::read_jsonl;

use crate::core::Frame;
use crate::error::{ReplayError, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Payload of a frame loaded from a file: its non-time fields
pub type Record = Map<String, Value>;

/// Input format detection result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    JsonLines,
    Unknown,
}

/// Detect the format of a recording from its extension, then its content
pub fn detect_format(path: &Path, data: &[u8]) -> InputFormat {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("csv") => return InputFormat::Csv,
        Some("jsonl") | Some("ndjson") | Some("json") => return InputFormat::JsonLines,
        _ => {}
    }

    if is_json_lines(data) {
        return InputFormat::JsonLines;
    }
    if is_csv(data) {
        return InputFormat::Csv;
    }
    InputFormat::Unknown
}

fn is_json_lines(data: &[u8]) -> bool {
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'{')
}

fn is_csv(data: &[u8]) -> bool {
    // A text header line with at least a time column and one more
    let sample = &data[..data.len().min(500)];
    match std::str::from_utf8(sample) {
        Ok(text) => text.lines().next().is_some_and(|line| line.contains(',')),
        // The sample may end inside a multi-byte character
        Err(e) => e.valid_up_to() > 0 && {
            let text = String::from_utf8_lossy(&sample[..e.valid_up_to()]);
            text.lines().next().is_some_and(|line| line.contains(','))
        },
    }
}

/// Parse recording contents already read into memory
pub fn parse_frames(path: &Path, data: &[u8]) -> Result<Vec<Frame<Record>>> {
    let frames = match detect_format(path, data) {
        InputFormat::Csv => read_csv(data)?,
        InputFormat::JsonLines => read_jsonl(data)?,
        InputFormat::Unknown => return Err(ReplayError::UnknownFormat(path.to_path_buf())),
    };
    check_order(&frames)?;
    Ok(frames)
}

/// Load a recording, auto-detecting its format
pub fn load_file(path: &Path) -> Result<Vec<Frame<Record>>> {
    let data = std::fs::read(path)?;
    let frames = parse_frames(path, &data)?;
    debug!("Loaded {} frames from {}", frames.len(), path.display());
    Ok(frames)
}

/// Reject recordings whose timestamps go backwards
pub fn check_order<P>(frames: &[Frame<P>]) -> Result<()> {
    for (i, pair) in frames.windows(2).enumerate() {
        if pair[1].time < pair[0].time {
            return Err(ReplayError::InvalidTime {
                record: i + 2,
                reason: format!(
                    "time {} is before the previous frame's {}",
                    pair[1].time, pair[0].time
                ),
            });
        }
    }
    Ok(())
}
