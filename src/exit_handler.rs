//! Exit code logic for the importer process.
//!
//! Single responsibility: map a batch report to the process exit outcome.

use url_importer::ImportReport;

use crate::ProcessExit;

/// Determines the process exit outcome from succeeded and failed item counts.
pub(crate) fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// A cancelled run always fails; otherwise counts decide.
pub(crate) fn exit_for_report(report: &ImportReport) -> ProcessExit {
    if report.cancelled {
        return ProcessExit::Failure;
    }
    determine_exit_outcome(report.succeeded(), report.failures.len())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_exit_outcome_success_when_no_failures() {
        assert_eq!(determine_exit_outcome(3, 0), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_success_when_zero_succeeded_zero_failed() {
        assert_eq!(determine_exit_outcome(0, 0), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_partial_when_mixed() {
        assert_eq!(determine_exit_outcome(2, 1), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_failure_when_all_failed() {
        assert_eq!(determine_exit_outcome(0, 2), ProcessExit::Failure);
    }

    #[test]
    fn test_cancelled_report_is_failure() {
        let report = ImportReport {
            downloaded: vec![PathBuf::from("/m/a.mkv")],
            cancelled: true,
            ..ImportReport::default()
        };
        assert_eq!(exit_for_report(&report), ProcessExit::Failure);
    }
}
