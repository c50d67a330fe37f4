use std::io::Write;

use chrono::SecondsFormat;
use serde::Serialize;

use super::domain::Applicant;
use super::ranking::merit_order;

pub const APPLICANTS_CSV_FILENAME: &str = "applicants.csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write applicant CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush applicant CSV: {0}")]
    Io(#[from] std::io::Error),
}

pub const APPLICANTS_CSV_HEADER: [&str; 8] = [
    "Rank",
    "Name",
    "Email",
    "Marks",
    "Stream",
    "Course",
    "Status",
    "Applied At",
];

#[derive(Debug, Serialize)]
struct ApplicantRow<'a> {
    rank: usize,
    name: &'a str,
    email: &'a str,
    marks: String,
    stream: &'static str,
    course: &'a str,
    status: &'static str,
    applied_at: String,
}

/// Write every applicant, in merit order, as a ranked CSV sheet. The header row is
/// always present, even for an empty store.
pub fn write_applicants_csv<W: Write>(
    writer: W,
    applicants: &[Applicant],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(APPLICANTS_CSV_HEADER)?;

    for (index, applicant) in merit_order(applicants).into_iter().enumerate() {
        csv_writer.serialize(ApplicantRow {
            rank: index + 1,
            name: &applicant.name,
            email: &applicant.email,
            marks: format_marks(applicant.marks),
            stream: applicant.resolved_stream().label(),
            course: &applicant.course,
            status: applicant.status_label(),
            applied_at: applicant
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn applicants_csv(applicants: &[Applicant]) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    write_applicants_csv(&mut buffer, applicants)?;
    Ok(buffer)
}

/// Whole marks print without a trailing `.0`.
pub fn format_marks(marks: f64) -> String {
    if marks.is_finite() && marks.fract() == 0.0 {
        format!("{marks:.0}")
    } else {
        marks.to_string()
    }
}
