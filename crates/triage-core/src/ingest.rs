//! Failure record ingestion.
//!
//! Reads newline-delimited JSON records into [`Incident`] values. Blank lines
//! are skipped silently; malformed lines are skipped with a warning and never
//! abort ingestion.

use std::io::BufRead;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{Incident, RecordParseWarning, Result};

/// Incidents parsed from a record stream, in input order, plus the lines
/// that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub incidents: Vec<Incident>,
    pub warnings: Vec<RecordParseWarning>,
}

impl IngestReport {
    pub fn skipped(&self) -> usize {
        self.warnings.len()
    }
}

/// Parse one line. `Ok(None)` means the line was blank.
///
/// Only JSON objects are records; arrays and scalars are rejected even
/// though serde could bind an array positionally.
pub fn parse_record(line: &str) -> std::result::Result<Option<Incident>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(trimmed)?;
    if !value.is_object() {
        return Err(serde::de::Error::custom(format!(
            "expected a JSON object, found {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map(Some)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ingest already-materialized lines.
pub fn ingest_lines<I, S>(lines: I) -> IngestReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = IngestReport::default();
    for (idx, line) in lines.into_iter().enumerate() {
        accept_line(&mut report, idx + 1, line.as_ref());
    }
    report
}

/// Ingest a record stream line by line.
///
/// # Errors
///
/// Only I/O failures of the underlying reader are returned; malformed
/// records are recorded in [`IngestReport::warnings`].
pub fn ingest_reader<R: BufRead>(reader: R) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    for (idx, line) in reader.lines().enumerate() {
        accept_line(&mut report, idx + 1, &line?);
    }
    Ok(report)
}

fn accept_line(report: &mut IngestReport, line_no: usize, line: &str) {
    match parse_record(line) {
        Ok(Some(incident)) => report.incidents.push(incident),
        Ok(None) => {}
        Err(e) => {
            let warning = RecordParseWarning {
                line: line_no,
                reason: e.to_string(),
            };
            warn!(event = "record.skipped", line = line_no, error = %e, "skipping malformed record");
            report.warnings.push(warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tracing_test::traced_test;

    #[test]
    fn test_valid_lines_become_incidents_in_order() {
        let report = ingest_lines([
            r#"{"test_id": "t1", "module": "auth", "impacted_layers": ["UI"]}"#,
            r#"{"test_id": "t2", "module": "payment"}"#,
        ]);
        assert!(report.warnings.is_empty());
        assert_eq!(report.incidents.len(), 2);
        assert_eq!(report.incidents[0].module.as_deref(), Some("auth"));
        assert_eq!(report.incidents[1].module.as_deref(), Some("payment"));
        assert!(report.incidents[1].impacted_layers.is_empty());
    }

    #[test]
    fn test_blank_lines_are_skipped_silently() {
        let report = ingest_lines(["", "   ", "\t", r#"{"module": "auth"}"#]);
        assert_eq!(report.incidents.len(), 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped_with_line_numbers() {
        let report = ingest_lines([
            r#"{"module": "auth"}"#,
            "",
            "{not json",
            r#"{"module": "payment"}"#,
            "[1, 2, 3]",
        ]);
        assert_eq!(report.incidents.len(), 2);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.warnings[0].line, 3);
        assert_eq!(report.warnings[1].line, 5);
        assert!(!report.warnings[0].reason.is_empty());
    }

    #[test]
    fn test_wrongly_typed_field_is_a_malformed_record() {
        let report = ingest_lines([r#"{"module": "auth", "impacted_layers": "UI"}"#]);
        assert!(report.incidents.is_empty());
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let report = ingest_lines(["   {\"module\": \"auth\"}   "]);
        assert_eq!(report.incidents.len(), 1);
    }

    #[test]
    fn test_reader_ingestion_matches_line_ingestion() {
        let raw = "{\"module\": \"auth\"}\n\nbroken\n{\"module\": \"report\"}\n";
        let from_reader = ingest_reader(Cursor::new(raw)).expect("read");
        let from_lines = ingest_lines(raw.lines());
        assert_eq!(from_reader, from_lines);
        assert_eq!(from_reader.warnings[0].line, 3);
    }

    #[test]
    fn test_non_object_records_are_rejected() {
        let report = ingest_lines(["[]", "42", "null", "\"auth\""]);
        assert!(report.incidents.is_empty());
        assert_eq!(report.skipped(), 4);
        assert!(report.warnings[0].reason.contains("array"));
    }

    #[traced_test]
    #[test]
    fn test_malformed_line_emits_warning_with_line_number() {
        ingest_lines([r#"{"module": "auth"}"#, "{oops"]);
        assert!(logs_contain("record.skipped"));
        assert!(logs_contain("line=2"));
    }

    #[test]
    fn test_reader_failure_is_an_io_error() {
        let raw = vec![b'{', b'"', 0xff, b'"', b'}', b'\n'];
        let err = ingest_reader(Cursor::new(raw)).unwrap_err();
        assert!(matches!(err, crate::domain::TriageError::Io(_)));
    }

    #[test]
    fn test_parse_record_blank_is_none() {
        assert!(parse_record("  ").expect("blank parses").is_none());
    }
}
