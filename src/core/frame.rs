use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A recorded frame: a timestamp plus an opaque payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame<P> {
    /// Milliseconds since the start of the recording
    #[serde(alias = "Time")]
    pub time: i64,

    /// Recorded data, never inspected by the engine
    #[serde(flatten)]
    pub payload: P,
}

/// Shared, replaceable frame list handed to the engine by the host
pub type FrameSequence<P> = Arc<Vec<Frame<P>>>;

impl<P> Frame<P> {
    /// Create a new frame
    pub fn new(time: i64, payload: P) -> Self {
        Self { time, payload }
    }

    /// Milliseconds between this frame and a later one
    pub fn gap_to(&self, next: &Frame<P>) -> i64 {
        next.time - self.time
    }

    /// Format the timestamp as `mm:ss.mmm`
    pub fn time_label(&self) -> String {
        format_millis(self.time)
    }
}

/// Format a millisecond offset as `mm:ss.mmm`, keeping the sign
pub fn format_millis(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let ms = ms.unsigned_abs();
    format!("{}{:02}:{:02}.{:03}", sign, ms / 60_000, (ms / 1000) % 60, ms % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    #[test]
    fn test_gap_to() {
        let a = Frame::new(100, ());
        let b = Frame::new(350, ());
        assert_eq!(a.gap_to(&b), 250);
    }

    #[test]
    fn test_time_label() {
        assert_eq!(Frame::new(0, ()).time_label(), "00:00.000");
        assert_eq!(Frame::new(61_005, ()).time_label(), "01:01.005");
        assert_eq!(format_millis(-1500), "-00:01.500");
    }

    #[test]
    fn test_deserialize_capitalized_time() {
        let frame: Frame<Map<String, Value>> =
            serde_json::from_str(r#"{"Time": 42, "lat": 1.5}"#).unwrap();
        assert_eq!(frame.time, 42);
        assert_eq!(frame.payload.get("lat"), Some(&Value::from(1.5)));
        assert!(!frame.payload.contains_key("Time"));
    }
}
