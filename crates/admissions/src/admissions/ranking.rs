//! Stream-wise merit ranking.
//!
//! [`compute_merit_list`] is a pure function of the applicants it is handed: it never
//! reads the store, never filters by status, and never mutates its input. Callers decide
//! which records take part (see [`MeritStatusFilter`](super::MeritStatusFilter)).

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::domain::{Applicant, ApplicantId, ApplicationId, Stream};

/// One ranked applicant as published on the merit list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeritEntry {
    pub id: ApplicantId,
    pub application_id: ApplicationId,
    pub name: String,
    pub marks: f64,
    pub course: String,
    pub stream: Stream,
    pub stream_rank: usize,
    pub overall_rank: usize,
    pub created_at: DateTime<Utc>,
}

/// Ranked applicants per stream, the combined ranking, and summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeritList {
    #[serde(rename = "Science")]
    pub science: Vec<MeritEntry>,
    #[serde(rename = "Arts")]
    pub arts: Vec<MeritEntry>,
    #[serde(rename = "Commerce")]
    pub commerce: Vec<MeritEntry>,
    pub overall: Vec<MeritEntry>,
    pub stats: MeritStats,
}

impl MeritList {
    pub fn stream(&self, stream: Stream) -> &[MeritEntry] {
        match stream {
            Stream::Science => &self.science,
            Stream::Arts => &self.arts,
            Stream::Commerce => &self.commerce,
        }
    }

    fn stream_mut(&mut self, stream: Stream) -> &mut Vec<MeritEntry> {
        match stream {
            Stream::Science => &mut self.science,
            Stream::Arts => &mut self.arts,
            Stream::Commerce => &mut self.commerce,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeritStats {
    pub total_count: usize,
    pub stream_counts: StreamCounts,
    pub average_marks: f64,
    pub max_marks: f64,
    pub min_marks: f64,
    pub mark_distribution: MarkDistribution,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamCounts {
    #[serde(rename = "Science")]
    pub science: usize,
    #[serde(rename = "Arts")]
    pub arts: usize,
    #[serde(rename = "Commerce")]
    pub commerce: usize,
}

impl StreamCounts {
    pub fn get(&self, stream: Stream) -> usize {
        match stream {
            Stream::Science => self.science,
            Stream::Arts => self.arts,
            Stream::Commerce => self.commerce,
        }
    }
}

/// Applicants per score band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MarkDistribution {
    pub excellent: usize,
    pub good: usize,
    pub average: usize,
    pub below: usize,
}

/// Score bands used on the merit page: 90+, 75-89, 60-74 and under 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkBand {
    Excellent,
    Good,
    Average,
    Below,
}

impl MarkBand {
    pub fn classify(marks: f64) -> Self {
        if marks >= 90.0 {
            MarkBand::Excellent
        } else if marks >= 75.0 {
            MarkBand::Good
        } else if marks >= 60.0 {
            MarkBand::Average
        } else {
            MarkBand::Below
        }
    }
}

impl MarkDistribution {
    fn record(&mut self, marks: f64) {
        match MarkBand::classify(marks) {
            MarkBand::Excellent => self.excellent += 1,
            MarkBand::Good => self.good += 1,
            MarkBand::Average => self.average += 1,
            MarkBand::Below => self.below += 1,
        }
    }
}

/// Merit order: marks descending, then earlier submission first.
///
/// Uses a total order on floats so malformed marks cannot panic the sort.
pub fn merit_cmp(a: &Applicant, b: &Applicant) -> Ordering {
    b.marks
        .total_cmp(&a.marks)
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Applicants in merit order. Records that compare equal keep their input order.
pub fn merit_order(applicants: &[Applicant]) -> Vec<&Applicant> {
    let mut ordered: Vec<&Applicant> = applicants.iter().collect();
    ordered.sort_by(|a, b| merit_cmp(a, b));
    ordered
}

/// Rank `applicants` per stream and overall.
///
/// Every input record appears exactly once in `overall` and exactly once in one stream
/// bucket. A stream value outside Science/Arts/Commerce is ranked under Science.
pub fn compute_merit_list(applicants: &[Applicant]) -> MeritList {
    let mut merit = MeritList {
        science: Vec::new(),
        arts: Vec::new(),
        commerce: Vec::new(),
        overall: Vec::with_capacity(applicants.len()),
        stats: summarize(applicants),
    };

    // Filtering a stable sort keeps each bucket in the same order a per-bucket sort
    // would produce, so one pass yields both rankings.
    for (position, applicant) in merit_order(applicants).into_iter().enumerate() {
        if !applicant.has_recognised_stream() {
            warn!(
                applicant_id = %applicant.id.0,
                stream = %applicant.stream,
                "unknown stream ranked under Science"
            );
        }

        let stream = applicant.resolved_stream();
        let bucket = merit.stream_mut(stream);
        let entry = MeritEntry {
            id: applicant.id.clone(),
            application_id: applicant.application_id.clone(),
            name: applicant.name.clone(),
            marks: applicant.marks,
            course: applicant.course.clone(),
            stream,
            stream_rank: bucket.len() + 1,
            overall_rank: position + 1,
            created_at: applicant.created_at,
        };
        bucket.push(entry.clone());
        merit.overall.push(entry);
    }

    merit
}

fn summarize(applicants: &[Applicant]) -> MeritStats {
    let mut stream_counts = StreamCounts::default();
    let mut mark_distribution = MarkDistribution::default();
    let mut total_marks = 0.0;
    let mut max_marks = f64::NEG_INFINITY;
    let mut min_marks = f64::INFINITY;

    for applicant in applicants {
        match applicant.resolved_stream() {
            Stream::Science => stream_counts.science += 1,
            Stream::Arts => stream_counts.arts += 1,
            Stream::Commerce => stream_counts.commerce += 1,
        }
        mark_distribution.record(applicant.marks);
        total_marks += applicant.marks;
        max_marks = max_marks.max(applicant.marks);
        min_marks = min_marks.min(applicant.marks);
    }

    let total_count = applicants.len();
    if total_count == 0 {
        return MeritStats {
            total_count,
            stream_counts,
            average_marks: 0.0,
            max_marks: 0.0,
            min_marks: 0.0,
            mark_distribution,
        };
    }

    MeritStats {
        total_count,
        stream_counts,
        average_marks: round_to_hundredths(total_marks / total_count as f64),
        max_marks,
        min_marks,
        mark_distribution,
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
