use crate::core::Frame;
use crate::error::{ReplayError, Result};
use crate::input::Record;
use serde_json::Value;
use std::io::Read;

const TIME_COLUMNS: &[&str] = &["time", "timestamp", "t", "ts"];

/// Read frames from CSV
///
/// The time column (`time`, `timestamp`, `t` or `ts`) holds milliseconds
/// since the start of the recording; fractional values are truncated.
/// Every other column becomes a string field of the payload.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Frame<Record>>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let time_idx = find_column(&headers, TIME_COLUMNS)?;

    let mut frames = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let raw = record.get(time_idx).unwrap_or_default().trim();
        let time = parse_time(raw).ok_or_else(|| ReplayError::InvalidTime {
            record: i + 1,
            reason: format!("'{}' is not a number of milliseconds", raw),
        })?;

        let payload: Record = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(idx, _)| *idx != time_idx)
            .map(|(_, (name, value))| (name.to_string(), Value::String(value.to_string())))
            .collect();

        frames.push(Frame::new(time, payload));
    }

    Ok(frames)
}

fn parse_time(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|ms| ms.is_finite())
            .map(|ms| ms as i64)
    })
}

/// Find a column by checking possible names
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize> {
    for (idx, header) in headers.iter().enumerate() {
        let header_lower = header.trim().to_lowercase();
        if names.iter().any(|&name| header_lower == name) {
            return Ok(idx);
        }
    }

    Err(ReplayError::MissingColumn(
        names.iter().map(|n| n.to_string()).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv() {
        let data = "Timestamp,lat,lon\n0,45.1,7.6\n1500.7,45.2,7.7\n";
        let frames = read_csv(data.as_bytes()).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].time, 0);
        assert_eq!(frames[1].time, 1500);
        assert_eq!(frames[1].payload["lat"], Value::from("45.2"));
        assert!(!frames[1].payload.contains_key("Timestamp"));
    }

    #[test]
    fn test_time_column_anywhere() {
        let data = "id,ts\na,10\nb,20\n";
        let frames = read_csv(data.as_bytes()).unwrap();
        assert_eq!(frames[1].time, 20);
        assert_eq!(frames[1].payload["id"], Value::from("b"));
    }

    #[test]
    fn test_missing_time_column() {
        let data = "lat,lon\n1,2\n";
        assert!(matches!(
            read_csv(data.as_bytes()),
            Err(ReplayError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_bad_time_value() {
        let data = "time,value\n0,a\nsoon,b\n";
        match read_csv(data.as_bytes()) {
            Err(ReplayError::InvalidTime { record, .. }) => assert_eq!(record, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
