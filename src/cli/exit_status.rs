use std::process::ExitCode;

use super::run::RunResult;

/// Exit status for CLI commands, following common conventions for linter tools.
///
/// - `Success` (0): Command completed successfully, no findings
/// - `Failure` (1): Command completed but found actionable issues
/// - `Error` (2): Command failed due to internal error (parse error, config error, etc.)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}

pub fn exit_status_from_result(result: &RunResult) -> ExitStatus {
    match result {
        RunResult::Sync(summary) => {
            if !summary.ok() || summary.has_findings() {
                ExitStatus::Failure
            } else {
                ExitStatus::Success
            }
        }
        RunResult::Lint(lint) => {
            if lint.findings.is_empty() {
                ExitStatus::Success
            } else {
                ExitStatus::Failure
            }
        }
        // Informational commands never fail on content.
        RunResult::Keys(_) | RunResult::Init(_) => ExitStatus::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::from(ExitStatus::Success), ExitCode::from(0));
        assert_eq!(ExitCode::from(ExitStatus::Failure), ExitCode::from(1));
        assert_eq!(ExitCode::from(ExitStatus::Error), ExitCode::from(2));
    }
}
