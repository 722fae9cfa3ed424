//! Report emitter.
//!
//! Text mode writes the failure list followed by the summary line. JSON mode
//! writes the whole report as one document. Both go to the given writer so
//! stdout carries nothing but the report.

use std::io::{self, Write};

use batchrun_core::{RunReport, TaskOutcome};
use serde::Serialize;

use crate::tasks::HttpDetail;

/// Write the report as pretty-printed JSON.
pub fn write_json<W: Write, D: Serialize>(mut out: W, report: &RunReport<D>) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)
}

/// Write the failure list and the summary line.
///
/// `describe` renders one failed outcome as a single line.
pub fn write_text<W, D, F>(mut out: W, report: &RunReport<D>, describe: F) -> io::Result<()>
where
    W: Write,
    F: Fn(&TaskOutcome<D>) -> String,
{
    if !report.failed.is_empty() {
        writeln!(out, "The following items failed:")?;
        for outcome in &report.failed {
            writeln!(out, "{}", describe(outcome))?;
        }
        writeln!(out)?;
    }
    write_summary(&mut out, report)
}

/// Per-request lines and the average, followed by the failure list and
/// summary.
///
/// Expects a report that retained its successes.
pub fn write_probe<W: Write>(mut out: W, report: &RunReport<HttpDetail>) -> io::Result<()> {
    let mut outcomes: Vec<_> = report.successes.iter().chain(&report.failed).collect();
    outcomes.sort_by_key(|outcome| outcome.index);

    for outcome in outcomes {
        match &outcome.error {
            Some(error) => writeln!(
                out,
                "Request {} failed in {:.2?}: {}",
                outcome.index, outcome.elapsed, error
            )?,
            None => writeln!(
                out,
                "Request {} returned {} in {:.2?}",
                outcome.index, outcome.detail.status, outcome.elapsed
            )?,
        }
    }
    if let Some(mean) = report.mean_task_time() {
        writeln!(out, "Average time spent on each request: {mean:.2?}")?;
    }
    writeln!(out)?;

    write_text(out, report, |outcome| describe_http("Request", outcome.index, outcome))
}

/// One line for a failed HTTP outcome: the error if there is one, else the
/// status and body.
pub fn describe_http(
    label: &str,
    id: impl std::fmt::Display,
    outcome: &TaskOutcome<HttpDetail>,
) -> String {
    match &outcome.error {
        Some(error) => format!("{label} {id}: {error}"),
        None => format!(
            "{label} {id}: status {} {}",
            outcome.detail.status,
            outcome.detail.body.trim()
        ),
    }
}

fn write_summary<W: Write, D>(out: &mut W, report: &RunReport<D>) -> io::Result<()> {
    writeln!(
        out,
        "All done! Success rate was {}% and elapsed time was {:.2?}",
        report.success_rate(),
        report.elapsed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use batchrun_core::{FailureKind, RunId};
    use chrono::Utc;

    fn detail(status: u16, body: &str) -> HttpDetail {
        HttpDetail {
            status,
            body: body.to_string(),
        }
    }

    fn report() -> RunReport<HttpDetail> {
        let mut report = RunReport::new(RunId::new("report"), Utc::now(), 4);
        report.succeeded = 2;
        report.elapsed = Duration::from_millis(1500);
        report.failed.push(TaskOutcome::failure(3, detail(500, "boom\n"), None));
        report.failed.push(TaskOutcome::failed(
            1,
            FailureKind::DeadlineExceeded,
            "run deadline exceeded",
        ));
        report
    }

    fn render<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_lists_failures_then_summary() {
        let report = report();
        let text = render(|buf| {
            write_text(buf, &report, |o| describe_http("Row", o.index + 1, o))
        });

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "The following items failed:");
        assert_eq!(lines[1], "Row 4: status 500 boom");
        assert!(lines[2].starts_with("Row 2: "));
        assert!(lines[2].contains("run deadline exceeded"));
        assert_eq!(lines[3], "");
        assert_eq!(
            lines[4],
            "All done! Success rate was 50% and elapsed time was 1.50s"
        );
    }

    #[test]
    fn test_text_without_failures_is_summary_only() {
        let mut report: RunReport<HttpDetail> = RunReport::new(RunId::new("ok"), Utc::now(), 0);
        report.elapsed = Duration::from_millis(10);
        let text = render(|buf| write_text(buf, &report, |_| unreachable!()));

        assert_eq!(
            text,
            "All done! Success rate was 100% and elapsed time was 10.00ms\n"
        );
    }

    #[test]
    fn test_request_lines_in_index_order() {
        let mut report: RunReport<HttpDetail> = RunReport::new(RunId::new("probe"), Utc::now(), 2);
        report.succeeded = 2;
        report.total_task_time = Duration::from_millis(30);
        report.successes.push(
            TaskOutcome::success(1, detail(200, "")).with_elapsed(Duration::from_millis(20)),
        );
        report.successes.push(
            TaskOutcome::success(0, detail(204, "")).with_elapsed(Duration::from_millis(10)),
        );

        let text = render(|buf| write_probe(buf, &report));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Request 0 returned 204 in 10.00ms");
        assert_eq!(lines[1], "Request 1 returned 200 in 20.00ms");
        assert_eq!(lines[2], "Average time spent on each request: 15.00ms");
        assert!(lines[4].starts_with("All done! Success rate was 100%"));
    }

    #[test]
    fn test_json_is_one_document() {
        let report = report();
        let text = render(|buf| write_json(buf, &report));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["total"], 4);
        assert_eq!(value["succeeded"], 2);
        assert_eq!(value["failed"].as_array().unwrap().len(), 2);
        assert_eq!(value["failed"][1]["error"]["kind"], "DEADLINE_EXCEEDED");
    }
}
