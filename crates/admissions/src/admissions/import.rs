use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::warn;

use super::domain::{ApplicationSubmission, MarksInput};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read applicant CSV: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid applicant CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Row layout accepted for bulk loads: `name,email,marks,stream,course`.
#[derive(Debug, Deserialize)]
struct SubmissionRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    marks: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    stream: Option<String>,
    #[serde(
        default,
        alias = "preferredCourse",
        deserialize_with = "empty_string_as_none"
    )]
    course: Option<String>,
}

impl From<SubmissionRow> for ApplicationSubmission {
    fn from(row: SubmissionRow) -> Self {
        ApplicationSubmission {
            name: row.name,
            email: row.email,
            marks: row.marks.map(MarksInput::Text),
            stream: row.stream,
            course: row.course,
        }
    }
}

/// A data row the CSV layer could not turn into a submission.
#[derive(Debug)]
pub struct MalformedRow {
    /// One-based data row, the header excluded.
    pub row: usize,
    pub error: csv::Error,
}

/// Outcome of reading a CSV cohort. Each submission keeps its one-based data row.
#[derive(Debug, Default)]
pub struct SubmissionImport {
    pub rows: Vec<(usize, ApplicationSubmission)>,
    pub malformed: Vec<MalformedRow>,
}

impl SubmissionImport {
    pub fn into_submissions(self) -> Vec<ApplicationSubmission> {
        self.rows.into_iter().map(|(_, submission)| submission).collect()
    }
}

/// Parse submissions from CSV. Rows are returned unvalidated so they go through the
/// same intake rules as the web form. A row that does not parse is set aside in
/// [`SubmissionImport::malformed`]; only an unreadable source or header fails the import.
pub fn read_submissions<R: Read>(reader: R) -> Result<SubmissionImport, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut import = SubmissionImport::default();
    for (index, record) in csv_reader.records().enumerate() {
        let row = index + 1;
        let parsed =
            record.and_then(|record| record.deserialize::<SubmissionRow>(Some(&headers)));
        match parsed {
            Ok(parsed) => import.rows.push((row, parsed.into())),
            Err(error) if error.is_io_error() => return Err(error.into()),
            Err(error) => {
                warn!(row, error = %error, "malformed applicant CSV row skipped");
                import.malformed.push(MalformedRow { row, error });
            }
        }
    }

    Ok(import)
}

pub fn read_submissions_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<SubmissionImport, ImportError> {
    let file = std::fs::File::open(path)?;
    read_submissions(file)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
