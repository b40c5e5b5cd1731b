use crate::core::Frame;
use crate::error::{ReplayError, Result};
use crate::input::Record;
use std::io::{BufRead, BufReader, Read};

/// Read frames from JSON Lines: one object per line with a `time` (or
/// `Time`) field in milliseconds. Blank lines are skipped.
pub fn read_jsonl<R: Read>(reader: R) -> Result<Vec<Frame<Record>>> {
    let mut frames = Vec::new();
    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = serde_json::from_str::<Frame<Record>>(&line)
            .map_err(|source| ReplayError::JsonLine { line: i + 1, source })?;
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_read_jsonl() {
        let data = concat!(
            "{\"Time\": 0, \"event\": \"boot\"}\n",
            "\n",
            "{\"time\": 40, \"event\": \"fix\", \"sats\": 7}\n",
        );
        let frames = read_jsonl(data.as_bytes()).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload["event"], Value::from("boot"));
        assert_eq!(frames[1].time, 40);
        assert_eq!(frames[1].payload["sats"], Value::from(7));
    }

    #[test]
    fn test_reports_bad_line() {
        let data = "{\"time\": 0}\n{\"value\": 1}\n";
        match read_jsonl(data.as_bytes()) {
            Err(ReplayError::JsonLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
