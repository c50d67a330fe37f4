use crate::infra::{load_submissions, sample_submissions, LoadOutcome};
use admissions::admissions::{
    read_submissions_from_path, AdmissionsService, ApplicationSubmission,
    InMemoryApplicantRepository, MalformedRow, MarksInput, MeritList, MeritStatusFilter, Stream,
};
use admissions::error::AppError;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct MeritReportArgs {
    /// CSV file with name, email, marks, stream, and course columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Which applicants to rank: pending (default) or all
    #[arg(long, value_parser = crate::infra::parse_status_filter)]
    pub(crate) status: Option<MeritStatusFilter>,
    /// Print the merit list as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_merit_report(args: MeritReportArgs) -> Result<(), AppError> {
    let MeritReportArgs { csv, status, json } = args;

    let import = read_submissions_from_path(&csv)?;
    let service = in_memory_service(status.unwrap_or_default());
    let outcome = load_submissions(&service, import.rows)?;
    let rejections = rejection_lines(&import.malformed, &outcome);
    let merit = service.merit_list()?;

    if json {
        let rendered = serde_json::to_string_pretty(&merit).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        println!("Merit list for {}", csv.display());
        render_load_outcome(outcome.accepted, &rejections);
        render_merit_list(&merit);
    }

    Ok(())
}

pub(crate) fn run_demo() -> Result<(), AppError> {
    let service = in_memory_service(MeritStatusFilter::PendingOnly);
    let seeded = load_submissions(&service, (1..).zip(sample_submissions()))?;
    println!("Seeded {} sample applicants", seeded.accepted);

    let walk_in = ApplicationSubmission {
        name: Some("Meera Kulkarni".to_string()),
        email: Some("meera@example.com".to_string()),
        marks: Some(MarksInput::Text("94.5".to_string())),
        stream: Some("commerce".to_string()),
        course: Some("Economics".to_string()),
    };
    let applicant = service.submit(walk_in)?;
    println!(
        "Accepted {} ({}) as {} with {} marks",
        applicant.name, applicant.email, applicant.application_id.0, applicant.marks
    );

    let duplicate = ApplicationSubmission {
        name: Some("Meera K".to_string()),
        email: Some("MEERA@example.com".to_string()),
        marks: Some(MarksInput::Number(99.0)),
        stream: Some("Science".to_string()),
        course: None,
    };
    if let Err(err) = service.submit(duplicate) {
        println!("Second submission refused: {err}");
    }

    println!();
    render_merit_list(&service.merit_list()?);
    Ok(())
}

fn in_memory_service(
    filter: MeritStatusFilter,
) -> AdmissionsService<InMemoryApplicantRepository> {
    AdmissionsService::new(Arc::new(InMemoryApplicantRepository::new()), filter)
}

/// Unparseable rows and intake rejections, merged in file order.
fn rejection_lines(malformed: &[MalformedRow], outcome: &LoadOutcome) -> Vec<String> {
    let mut lines: Vec<(usize, String)> = malformed
        .iter()
        .map(|skipped| (skipped.row, skipped.error.to_string()))
        .chain(
            outcome
                .rejected
                .iter()
                .map(|(row, violation)| (*row, violation.to_string())),
        )
        .collect();
    lines.sort_by_key(|(row, _)| *row);
    lines
        .into_iter()
        .map(|(row, reason)| format!("row {row}: {reason}"))
        .collect()
}

fn render_load_outcome(accepted: usize, rejections: &[String]) {
    println!("Accepted {accepted} rows, rejected {}", rejections.len());
    for line in rejections {
        println!("  {line}");
    }
    println!();
}

pub(crate) fn render_merit_list(merit: &MeritList) {
    for stream in Stream::ordered() {
        let entries = merit.stream(stream);
        println!("{} ({})", stream.label(), entries.len());
        if entries.is_empty() {
            println!("  no applicants");
        }
        for entry in entries {
            println!(
                "  {:>3}. {:<28} {:>6.2}  overall #{:<3} {}",
                entry.stream_rank, entry.name, entry.marks, entry.overall_rank, entry.course
            );
        }
        println!();
    }

    let stats = &merit.stats;
    println!(
        "Total {} | average {:.2} | highest {:.2} | lowest {:.2}",
        stats.total_count, stats.average_marks, stats.max_marks, stats.min_marks
    );
    let bands = &stats.mark_distribution;
    println!(
        "90+: {}  75-89: {}  60-74: {}  below 60: {}",
        bands.excellent, bands.good, bands.average, bands.below
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_FILES: AtomicUsize = AtomicUsize::new(0);

    fn write_temp_csv(contents: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        let sequence = TEMP_FILES.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("admissions-merit-{nanos}-{sequence}.csv"));
        fs::write(&path, contents).expect("write csv");
        path
    }

    #[test]
    fn merit_report_ranks_csv_rows() {
        let path = write_temp_csv(
            "name,email,marks,stream,course\n\
             Asha,asha@example.com,91,Arts,History\n\
             Broken,broken@example.com,abc,Arts,History\n",
        );

        let result = run_merit_report(MeritReportArgs {
            csv: path.clone(),
            status: Some(MeritStatusFilter::All),
            json: true,
        });
        let _ = fs::remove_file(&path);

        assert!(result.is_ok());
    }

    #[test]
    fn rejections_cover_malformed_and_invalid_rows_in_order() {
        let path = write_temp_csv(
            "name,email,marks,stream,course\n\
             Asha,asha@example.com,91,Arts,History\n\
             Ragged,ragged@example.com,80,Arts,History,extra\n\
             Broken,broken@example.com,abc,Arts,History\n\
             Dev,dev@example.com,78,Science,Physics\n",
        );
        let import = read_submissions_from_path(&path).expect("csv readable");
        let _ = fs::remove_file(&path);

        let service = in_memory_service(MeritStatusFilter::All);
        let outcome = load_submissions(&service, import.rows).expect("store available");
        let lines = rejection_lines(&import.malformed, &outcome);

        assert_eq!(outcome.accepted, 2);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("row 2:"));
        assert!(lines[1].starts_with("row 3:"));
        assert_eq!(service.merit_list().expect("merit list").stats.total_count, 2);
    }

    #[test]
    fn merit_report_surfaces_missing_file() {
        let result = run_merit_report(MeritReportArgs {
            csv: PathBuf::from("/nonexistent/cohort.csv"),
            status: None,
            json: false,
        });

        assert!(matches!(result, Err(AppError::Import(_))));
    }

    #[test]
    fn demo_runs_end_to_end() {
        assert!(run_demo().is_ok());
    }
}
