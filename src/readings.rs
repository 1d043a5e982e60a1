//! Reading ingestion
//!
//! Parses biometric readings from JSON arrays or NDJSON streams, and offers an
//! advisory range check. The scoring core accepts any real values; range
//! checking is only surfaced by tooling that asks for it.

use crate::error::ComputeError;
use crate::types::BiometricReading;
use serde::Serialize;

/// Lower bound of the dashboard signal scale
pub const SIGNAL_SCALE_MIN: f64 = 0.0;

/// Upper bound of the dashboard signal scale
pub const SIGNAL_SCALE_MAX: f64 = 100.0;

/// Reading parser for JSON and NDJSON inputs
pub struct ReadingParser;

impl ReadingParser {
    /// Parse a JSON array of readings
    pub fn parse_array(json: &str) -> Result<Vec<BiometricReading>, ComputeError> {
        let readings: Vec<BiometricReading> = serde_json::from_str(json)?;
        Ok(readings)
    }

    /// Parse NDJSON (one reading per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<BiometricReading>, ComputeError> {
        let mut readings = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let reading = serde_json::from_str::<BiometricReading>(trimmed).map_err(|e| {
                ComputeError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            readings.push(reading);
        }
        Ok(readings)
    }

    /// List readings with a signal outside the 0-100 dashboard scale
    pub fn out_of_scale(readings: &[BiometricReading]) -> Vec<RangeIssue> {
        let mut issues = Vec::new();
        for (index, reading) in readings.iter().enumerate() {
            for (signal, value) in [
                ("hrv", reading.hrv),
                ("gsr", reading.gsr),
                ("facialCalm", reading.facial_calm),
            ] {
                if !(SIGNAL_SCALE_MIN..=SIGNAL_SCALE_MAX).contains(&value) {
                    issues.push(RangeIssue {
                        index,
                        signal,
                        value,
                    });
                }
            }
        }
        issues
    }
}

/// A signal value outside the dashboard scale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeIssue {
    pub index: usize,
    pub signal: &'static str,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() {
        let readings = ReadingParser::parse_array(
            r#"[{"hrv": 80, "gsr": 20, "facialCalm": 90}, {"hrv": 60.5, "gsr": 35, "facialCalm": 70}]"#,
        )
        .unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].hrv, 60.5);
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = "{\"hrv\": 80, \"gsr\": 20, \"facialCalm\": 90}\n\n{\"hrv\": 70, \"gsr\": 30, \"facialCalm\": 80}\n";
        let readings = ReadingParser::parse_ndjson(input).unwrap();
        assert_eq!(readings.len(), 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let input = "{\"hrv\": 80, \"gsr\": 20, \"facialCalm\": 90}\nnot json\n";
        let err = ReadingParser::parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        assert!(ReadingParser::parse_array(r#"[{"hrv": 80, "gsr": 20}]"#).is_err());
    }

    #[test]
    fn test_out_of_scale() {
        let readings = vec![
            BiometricReading::new(50.0, 50.0, 50.0),
            BiometricReading::new(120.0, 50.0, -1.0),
        ];
        let issues = ReadingParser::out_of_scale(&readings);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].index, 1);
        assert_eq!(issues[0].signal, "hrv");
        assert_eq!(issues[1].signal, "facialCalm");
    }
}
