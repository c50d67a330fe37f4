use chrono::{DateTime, Utc};

use super::domain::{ApplicationStatus, ApplicationSubmission, MarksInput, NewApplicant, Stream};

pub const MAX_NAME_CHARS: usize = 100;
pub const MIN_MARKS: f64 = 0.0;
pub const MAX_MARKS: f64 = 100.0;

/// Reasons a submission is turned away at intake.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("name is required")]
    MissingName,
    #[error("name cannot exceed {max} characters")]
    NameTooLong { max: usize },
    #[error("email is required")]
    MissingEmail,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("marks are required")]
    MissingMarks,
    #[error("marks must be numeric (found '{0}')")]
    NonNumericMarks(String),
    #[error("marks must be between 0 and 100 (found {0})")]
    MarksOutOfRange(f64),
    #[error("invalid stream '{0}': must be Science, Arts, or Commerce")]
    UnknownStream(String),
    #[error("a student with email '{0}' has already applied")]
    DuplicateEmail(String),
}

/// Turns raw form submissions into normalized applicants.
///
/// Rules run in a fixed order and stop at the first failure, so the submitter always
/// sees the earliest problem with their form. Email uniqueness needs the store and is
/// checked by the service afterwards.
#[derive(Debug, Clone)]
pub struct IntakeGuard {
    max_name_chars: usize,
}

impl Default for IntakeGuard {
    fn default() -> Self {
        Self {
            max_name_chars: MAX_NAME_CHARS,
        }
    }
}

impl IntakeGuard {
    pub fn validate(
        &self,
        submission: ApplicationSubmission,
        received_at: DateTime<Utc>,
    ) -> Result<NewApplicant, IntakeViolation> {
        let ApplicationSubmission {
            name,
            email,
            marks,
            stream,
            course,
        } = submission;

        let name = self.validate_name(name.as_deref())?;
        let email = validate_email(email.as_deref())?;
        let marks = validate_marks(marks)?;
        let stream = validate_stream(stream.as_deref())?;
        let course = course
            .map(|value| value.trim().to_string())
            .unwrap_or_default();

        Ok(NewApplicant {
            name,
            email,
            marks,
            stream,
            course,
            status: ApplicationStatus::Pending,
            created_at: received_at,
        })
    }

    fn validate_name(&self, raw: Option<&str>) -> Result<String, IntakeViolation> {
        let name = raw.map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(IntakeViolation::MissingName);
        }
        if name.chars().count() > self.max_name_chars {
            return Err(IntakeViolation::NameTooLong {
                max: self.max_name_chars,
            });
        }
        Ok(name.to_string())
    }
}

/// Trim and lower-case an email so uniqueness checks compare like with like.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_email(raw: Option<&str>) -> Result<String, IntakeViolation> {
    let email = raw.map(normalize_email).unwrap_or_default();
    if email.is_empty() {
        return Err(IntakeViolation::MissingEmail);
    }
    if !is_valid_email(&email) {
        return Err(IntakeViolation::InvalidEmail(email));
    }
    Ok(email)
}

/// `local@domain.tld` shape: no whitespace, something before the `@`, and a dot in the
/// domain with characters on both sides.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    email.match_indices('@').any(|(at, _)| {
        let domain = &email[at + 1..];
        at > 0
            && domain
                .match_indices('.')
                .any(|(dot, _)| dot > 0 && dot + 1 < domain.len())
    })
}

fn validate_marks(raw: Option<MarksInput>) -> Result<f64, IntakeViolation> {
    let marks = match raw {
        None => return Err(IntakeViolation::MissingMarks),
        Some(MarksInput::Number(value)) => value,
        Some(MarksInput::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(IntakeViolation::MissingMarks);
            }
            match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => return Err(IntakeViolation::NonNumericMarks(trimmed.to_string())),
            }
        }
    };

    if !(MIN_MARKS..=MAX_MARKS).contains(&marks) {
        return Err(IntakeViolation::MarksOutOfRange(marks));
    }

    Ok(marks)
}

fn validate_stream(raw: Option<&str>) -> Result<Stream, IntakeViolation> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Stream::Science),
        Some(value) => {
            Stream::parse(value).ok_or_else(|| IntakeViolation::UnknownStream(value.to_string()))
        }
    }
}
