use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::path::Path;
use crate::program::ProgramId;
use crate::question::{QuestionId, QuestionType};

/// One question's answer, flattened for review screens and exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerData {
    pub program_id: ProgramId,
    pub block_id: String,
    pub question_index: usize,
    pub question_id: QuestionId,
    pub question_type: QuestionType,
    pub context_path: Path,
    pub question_text: String,
    pub answer_text: String,
    pub is_answered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_in_program: Option<i64>,
}

impl AnswerData {
    /// Stable key for one rendered answer: block id plus question position.
    pub fn key(&self) -> String {
        format!("{}-{}", self.block_id, self.question_index)
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at.and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// Answered while applying to a different program; review screens flag these.
    pub fn answered_elsewhere(&self) -> bool {
        self.updated_in_program
            .is_some_and(|stored| !self.program_id.is_stamped_as(stored))
    }
}

#[derive(Debug)]
pub enum SummaryExportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for SummaryExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryExportError::Io(err) => write!(f, "failed to write summary: {}", err),
            SummaryExportError::Csv(err) => write!(f, "failed to encode summary CSV: {}", err),
        }
    }
}

impl std::error::Error for SummaryExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SummaryExportError::Io(err) => Some(err),
            SummaryExportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SummaryExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SummaryExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    key: String,
    block_id: &'a str,
    question_id: u64,
    question_type: &'static str,
    path: String,
    entity_name: &'a str,
    question: &'a str,
    answer: &'a str,
    answered: bool,
    updated_at: String,
    updated_in_program: String,
}

/// Write one CSV row per summary entry, with a header.
pub fn write_csv<W: Write>(rows: &[AnswerData], writer: W) -> Result<(), SummaryExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(SummaryRecord {
            key: row.key(),
            block_id: &row.block_id,
            question_id: row.question_id.0,
            question_type: row.question_type.label(),
            path: row.context_path.to_string(),
            entity_name: row.entity_name.as_deref().unwrap_or(""),
            question: &row.question_text,
            answer: &row.answer_text,
            answered: row.is_answered,
            updated_at: row
                .updated_at_utc()
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
            updated_in_program: row
                .updated_in_program
                .map(|program| program.to_string())
                .unwrap_or_default(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> AnswerData {
        AnswerData {
            program_id: ProgramId(7),
            block_id: "2-1".to_string(),
            question_index: 0,
            question_id: QuestionId(4),
            question_type: QuestionType::Name,
            context_path: Path::parse("applicant.members[1].name").expect("valid"),
            question_text: "Member name".to_string(),
            answer_text: "Grace Hopper".to_string(),
            is_answered: true,
            entity_name: Some("Grace".to_string()),
            updated_at: Some(1_700_000_000_000),
            updated_in_program: Some(3),
        }
    }

    #[test]
    fn flags_answers_from_other_programs() {
        let mut answer = row();
        assert_eq!(answer.key(), "2-1-0");
        assert!(answer.answered_elsewhere());
        answer.updated_in_program = Some(7);
        assert!(!answer.answered_elsewhere());
    }

    #[test]
    fn writes_csv_with_rfc3339_timestamps() {
        let mut buffer = Vec::new();
        write_csv(&[row()], &mut buffer).expect("csv written");
        let output = String::from_utf8(buffer).expect("utf8");
        let mut lines = output.lines();

        assert_eq!(
            lines.next(),
            Some("key,block_id,question_id,question_type,path,entity_name,question,answer,answered,updated_at,updated_in_program")
        );
        assert_eq!(
            lines.next(),
            Some("2-1-0,2-1,4,name,applicant.members[1].name,Grace,Member name,Grace Hopper,true,2023-11-14T22:13:20+00:00,3")
        );
    }
}
