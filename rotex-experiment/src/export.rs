//! Record-per-trial export.

use std::io::{self, Write};

use rotex_core::TrialRecord;
use serde::Serialize;

pub const CSV_HEADER: [&str; 10] = [
    "trial",
    "stage",
    "character",
    "angle",
    "version",
    "condition",
    "response",
    "correct",
    "response_time_ms",
    "timestamp",
];

/// One exported row. The response time is empty for timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub trial: usize,
    pub stage: String,
    pub character: String,
    pub angle: u16,
    pub version: String,
    pub condition: String,
    pub response: String,
    pub correct: bool,
    pub response_time_ms: Option<u64>,
    pub timestamp: String,
}

impl From<&TrialRecord> for ExportRow {
    fn from(record: &TrialRecord) -> Self {
        Self {
            trial: record.trial,
            stage: record.stage.key().to_string(),
            character: record.character.to_string(),
            angle: record.angle,
            version: record.version.as_str().to_string(),
            condition: record.condition.label(),
            response: record.response.as_str().to_string(),
            correct: record.correct,
            response_time_ms: (!record.is_timeout()).then_some(record.response_time_ms),
            timestamp: record.timestamp.to_rfc3339(),
        }
    }
}

impl ExportRow {
    fn fields(&self) -> [String; 10] {
        [
            self.trial.to_string(),
            self.stage.clone(),
            self.character.clone(),
            self.angle.to_string(),
            self.version.clone(),
            self.condition.clone(),
            self.response.clone(),
            self.correct.to_string(),
            self.response_time_ms
                .map(|ms| ms.to_string())
                .unwrap_or_default(),
            self.timestamp.clone(),
        ]
    }
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write_csv<W: Write>(records: &[TrialRecord], mut out: W) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER.join(","))?;
    for record in records {
        let row = ExportRow::from(record);
        let line: Vec<String> = row.fields().iter().map(|f| escape(f)).collect();
        writeln!(out, "{}", line.join(","))?;
    }
    out.flush()
}

pub fn to_json(records: &[TrialRecord]) -> serde_json::Result<String> {
    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    serde_json::to_string_pretty(&rows)
}
