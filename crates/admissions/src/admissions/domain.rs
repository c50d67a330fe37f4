use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier for an applicant record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantId(pub String);

/// Application number handed back to the student as a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

/// Academic stream an applicant is ranked under.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Stream {
    #[default]
    Science,
    Arts,
    Commerce,
}

impl Stream {
    pub const fn label(self) -> &'static str {
        match self {
            Stream::Science => "Science",
            Stream::Arts => "Arts",
            Stream::Commerce => "Commerce",
        }
    }

    pub const fn ordered() -> [Stream; 3] {
        [Stream::Science, Stream::Arts, Stream::Commerce]
    }

    /// Case-insensitive match against the three recognised streams.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|stream| stream.label().eq_ignore_ascii_case(trimmed))
    }

    /// Resolve a stored stream value, folding anything unrecognised into Science.
    pub fn resolve(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Stream::Science)
    }
}

/// Review lifecycle of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Selects which stored applicants take part in the public merit list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeritStatusFilter {
    /// Only records still pending review, or carrying no status at all.
    #[default]
    PendingOnly,
    All,
}

impl MeritStatusFilter {
    pub const fn label(self) -> &'static str {
        match self {
            MeritStatusFilter::PendingOnly => "pending",
            MeritStatusFilter::All => "all",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "pending_only" => Some(Self::PendingOnly),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn admits(self, applicant: &Applicant) -> bool {
        match self {
            MeritStatusFilter::All => true,
            MeritStatusFilter::PendingOnly => {
                matches!(applicant.status, None | Some(ApplicationStatus::Pending))
            }
        }
    }
}

/// Marks as posted by the form: browsers send either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarksInput {
    Number(f64),
    Text(String),
}

impl From<f64> for MarksInput {
    fn from(value: f64) -> Self {
        MarksInput::Number(value)
    }
}

/// Raw, unvalidated submission from the application form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub marks: Option<MarksInput>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default, alias = "preferredCourse")]
    pub course: Option<String>,
}

/// Normalized applicant ready to be persisted; the store assigns identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplicant {
    pub name: String,
    pub email: String,
    pub marks: f64,
    pub stream: Stream,
    pub course: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// A stored applicant record.
///
/// `stream` keeps the value exactly as persisted. Records written through intake always
/// carry a canonical label, but rows loaded from older stores may not, so readers go
/// through [`Applicant::resolved_stream`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: ApplicantId,
    pub application_id: ApplicationId,
    pub name: String,
    pub email: String,
    pub marks: f64,
    pub stream: String,
    #[serde(default)]
    pub course: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    pub created_at: DateTime<Utc>,
}

impl Applicant {
    pub fn resolved_stream(&self) -> Stream {
        Stream::resolve(&self.stream)
    }

    pub fn has_recognised_stream(&self) -> bool {
        Stream::parse(&self.stream).is_some()
    }

    pub fn status_label(&self) -> &'static str {
        self.status.unwrap_or(ApplicationStatus::Pending).label()
    }
}
