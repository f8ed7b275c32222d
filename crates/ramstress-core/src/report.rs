//! End-of-run summary and the failure report artifact.

use crate::error_log::{count_by_test, ErrorRecord};
use crate::reporter::{throughput_gbps, Snapshot, WorkerRow};
use crate::units::{binary8, format_hms, gib, group_thousands};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

const RULE: &str = "══════════════════════════════════════════════════════════════════════════";

/// Fixed advice appended to every failure report.
pub const RECOMMENDATIONS: [&str; 4] = [
    "Check your RAM modules (try Memtest86+)",
    "Test modules in different slots",
    "Check RAM voltage and timings in BIOS",
    "If errors persist, replace the defective RAM",
];

/// File name for a failure report generated at `now`.
#[must_use]
pub fn report_file_name(now: DateTime<Local>) -> String {
    format!("RAM_Error_Report_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum FinalReport {
    /// No mismatches.
    Success(SuccessSummary),
    /// At least one mismatch.
    Failure(FailureReport),
}

impl FinalReport {
    /// Pick the branch from the final snapshot.
    ///
    /// `records` is the complete error log; it is sorted here.
    #[must_use]
    pub fn from_snapshot(
        snapshot: &Snapshot,
        mut records: Vec<ErrorRecord>,
        generated: DateTime<Local>,
    ) -> Self {
        if snapshot.total_errors == 0 {
            return Self::Success(SuccessSummary {
                duration: snapshot.elapsed,
                tested_bytes: snapshot.allocated,
                total_cycles: snapshot.total_cycles,
                bytes_processed: snapshot.bytes_processed,
                avg_throughput_gbps: throughput_gbps(snapshot.bytes_processed, snapshot.elapsed),
            });
        }

        records.sort_by_key(|r| r.timestamp);
        Self::Failure(FailureReport {
            generated,
            duration: snapshot.elapsed,
            tested_bytes: snapshot.allocated,
            total_errors: snapshot.total_errors,
            workers: snapshot.workers.clone(),
            by_test: count_by_test(&records),
            records,
        })
    }

    /// True for the success branch.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Figures shown after a clean run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessSummary {
    /// Wall-clock duration.
    pub duration: Duration,
    /// Bytes under test.
    pub tested_bytes: u64,
    /// Completed cycles over all workers.
    pub total_cycles: u64,
    /// Logical bytes processed.
    pub bytes_processed: u64,
    /// Average GiB/s.
    pub avg_throughput_gbps: f64,
}

/// Everything the failure artifact contains.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    /// When the report was produced.
    pub generated: DateTime<Local>,
    /// Wall-clock duration.
    pub duration: Duration,
    /// Bytes under test.
    pub tested_bytes: u64,
    /// Total mismatches.
    pub total_errors: u64,
    /// Every worker, including clean ones.
    pub workers: Vec<WorkerRow>,
    /// Mismatch count per test, largest first.
    pub by_test: Vec<(&'static str, u64)>,
    /// All records, oldest first.
    pub records: Vec<ErrorRecord>,
}

impl FailureReport {
    /// Workers that recorded at least one mismatch.
    pub fn failing_workers(&self) -> impl Iterator<Item = &WorkerRow> {
        self.workers.iter().filter(|w| w.errors > 0)
    }

    /// Render the plain-text artifact.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "{RULE}")?;
        writeln!(out, "  RAM ERROR REPORT - DETAILED ANALYSIS")?;
        writeln!(out, "{RULE}")?;
        writeln!(out)?;
        writeln!(out, "Report Date    : {}", self.generated.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(out, "Duration       : {}", format_hms(self.duration))?;
        writeln!(out, "Tested Memory  : {:.2} GB", gib(self.tested_bytes))?;
        writeln!(out, "Total Errors   : {}", group_thousands(self.total_errors))?;
        writeln!(out)?;

        section(out, "THREAD STATISTICS")?;
        for w in self.failing_workers() {
            writeln!(
                out,
                "Thread {}: {} errors | {} cycles | {:.2} GB processed",
                w.id,
                group_thousands(w.errors),
                group_thousands(w.cycles),
                gib(w.bytes_processed)
            )?;
        }
        writeln!(out)?;

        section(out, "ERRORS BY TEST TYPE")?;
        for (test, count) in &self.by_test {
            writeln!(out, "{test:<30}: {:>8} errors", group_thousands(*count))?;
        }
        writeln!(out)?;

        section(
            out,
            &format!("ALL ERRORS ({})", group_thousands(self.total_errors)),
        )?;
        writeln!(out)?;
        for (n, r) in self.records.iter().enumerate() {
            writeln!(out, "[{}] {}", n + 1, r.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"))?;
            writeln!(out, "    Thread       : {}", r.worker)?;
            writeln!(out, "    Test         : {}", r.test)?;
            writeln!(out, "    Address      : 0x{:016X}", r.address)?;
            writeln!(
                out,
                "    Expected     : 0x{:02X} (Binary: {})",
                r.expected,
                binary8(r.expected)
            )?;
            writeln!(
                out,
                "    Actual       : 0x{:02X} (Binary: {})",
                r.actual,
                binary8(r.actual)
            )?;
            writeln!(out, "    Bad Bits     : {}", r.bit_diff)?;
            if let Some(info) = r.context.as_deref().filter(|c| !c.is_empty()) {
                writeln!(out, "    Info         : {info}")?;
            }
            writeln!(out)?;
        }

        section(out, "RECOMMENDATIONS")?;
        for line in RECOMMENDATIONS {
            writeln!(out, "* {line}")?;
        }
        Ok(())
    }
}

fn section(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out, "{RULE}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{RULE}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{names, Fault};
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, secs).unwrap()
    }

    fn record(secs: u32, worker: usize, test: &'static str, context: Option<&str>) -> ErrorRecord {
        ErrorRecord::new(
            at(secs),
            worker,
            Fault {
                test,
                address: 0x1F,
                expected: 0x1F,
                actual: 0x1B,
                context: context.map(str::to_string),
            },
        )
        .unwrap()
    }

    fn row(id: usize, errors: u64) -> WorkerRow {
        WorkerRow {
            id,
            status: "Stopped".into(),
            stopped: true,
            cycles: 3,
            bytes_processed: 3 << 30,
            errors,
            matrix_ops: 15,
        }
    }

    fn snapshot(total_errors: u64, workers: Vec<WorkerRow>) -> Snapshot {
        Snapshot {
            elapsed: Duration::from_secs(3725),
            allocated: 4 << 30,
            total_cycles: 6,
            bytes_processed: 6 << 30,
            throughput_gbps: 0.0,
            matrix_ops: 30,
            total_errors,
            workers,
            recent_errors: Vec::new(),
        }
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name(at(7)), "RAM_Error_Report_20240309_140507.txt");
    }

    #[test]
    fn test_success_branch() {
        let report = FinalReport::from_snapshot(&snapshot(0, vec![row(0, 0)]), Vec::new(), at(0));
        assert!(report.is_success());
        let FinalReport::Success(summary) = report else {
            unreachable!()
        };
        assert_eq!(summary.total_cycles, 6);
        assert_eq!(summary.tested_bytes, 4 << 30);
        assert!((summary.avg_throughput_gbps - 6.0 / 3725.0).abs() < 1e-12);
    }

    #[test]
    fn test_failure_branch_sorts_and_groups() {
        let records = vec![
            record(30, 1, names::ADDRESS, Some("Addr: 0x0000001F")),
            record(10, 1, names::INVERSE_1, None),
            record(20, 1, names::ADDRESS, None),
        ];
        let report =
            FinalReport::from_snapshot(&snapshot(3, vec![row(0, 0), row(1, 3)]), records, at(59));
        let FinalReport::Failure(failure) = report else {
            panic!("expected failure branch");
        };
        let order: Vec<u32> = failure
            .records
            .iter()
            .map(|r| chrono::Timelike::second(&r.timestamp))
            .collect();
        assert_eq!(order, vec![10, 20, 30]);
        assert_eq!(failure.by_test, vec![(names::ADDRESS, 2), (names::INVERSE_1, 1)]);
        assert_eq!(failure.failing_workers().count(), 1);
    }

    #[test]
    fn test_render_layout() {
        let records = vec![
            record(10, 1, names::INVERSE_1, None),
            record(20, 1, names::ADDRESS, Some("Addr: 0x0000001F")),
        ];
        let report =
            FinalReport::from_snapshot(&snapshot(2, vec![row(0, 0), row(1, 2)]), records, at(59));
        let FinalReport::Failure(failure) = report else {
            panic!("expected failure branch");
        };
        let text = failure.render();

        assert!(text.contains("Report Date    : 2024-03-09 14:05:59"));
        assert!(text.contains("Duration       : 01:02:05"));
        assert!(text.contains("Tested Memory  : 4.00 GB"));
        assert!(text.contains("Thread 1: 2 errors | 3 cycles | 3.00 GB processed"));
        assert!(!text.contains("Thread 0:"));
        assert!(text.contains(&format!("{:<30}: {:>8} errors", "Address Test", "1")));
        assert!(text.contains("ALL ERRORS (2)"));
        assert!(text.contains("[1] 2024-03-09 14:05:10.000"));
        assert!(text.contains("    Address      : 0x000000000000001F"));
        assert!(text.contains("    Expected     : 0x1F (Binary: 00011111)"));
        assert!(text.contains("    Actual       : 0x1B (Binary: 00011011)"));
        assert!(text.contains("    Bad Bits     : 00000100"));
        assert!(text.contains("    Info         : Addr: 0x0000001F"));
        assert_eq!(text.matches("    Info").count(), 1);

        let tests_at = text.find("ERRORS BY TEST TYPE").unwrap();
        let all_at = text.find("ALL ERRORS").unwrap();
        let advice_at = text.find("RECOMMENDATIONS").unwrap();
        assert!(tests_at < all_at && all_at < advice_at);
        assert!(text.trim_end().ends_with(RECOMMENDATIONS[3]));
    }

    #[test]
    fn test_report_serializes_with_tag() {
        let report = FinalReport::from_snapshot(&snapshot(0, Vec::new()), Vec::new(), at(0));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"result\":\"success\""));
    }
}
