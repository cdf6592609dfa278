use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{ReportError, Result};

/// The outcome of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Errored,
}

impl TestStatus {
    /// Returns `true` for statuses that carry failure information.
    pub fn is_failure(&self) -> bool {
        matches!(self, TestStatus::Failed | TestStatus::Errored)
    }

    /// Short upper-case label used by the text formats.
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "PASS",
            TestStatus::Failed => "FAIL",
            TestStatus::Skipped => "SKIP",
            TestStatus::Errored => "ERROR",
        }
    }
}

/// The result of one test case, in execution order within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub name: String,
    pub class_name: String,
    pub status: TestStatus,
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
}

impl TestCaseResult {
    pub fn passed(name: impl Into<String>, class_name: impl Into<String>, duration_seconds: f64) -> Self {
        Self::without_failure(name, class_name, TestStatus::Passed, duration_seconds)
    }

    pub fn skipped(name: impl Into<String>, class_name: impl Into<String>, duration_seconds: f64) -> Self {
        Self::without_failure(name, class_name, TestStatus::Skipped, duration_seconds)
    }

    pub fn failed(
        name: impl Into<String>,
        class_name: impl Into<String>,
        duration_seconds: f64,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::with_failure(name, class_name, TestStatus::Failed, duration_seconds, message, detail)
    }

    pub fn errored(
        name: impl Into<String>,
        class_name: impl Into<String>,
        duration_seconds: f64,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::with_failure(name, class_name, TestStatus::Errored, duration_seconds, message, detail)
    }

    fn without_failure(
        name: impl Into<String>,
        class_name: impl Into<String>,
        status: TestStatus,
        duration_seconds: f64,
    ) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            status,
            duration_seconds,
            failure_message: None,
            failure_detail: None,
        }
    }

    fn with_failure(
        name: impl Into<String>,
        class_name: impl Into<String>,
        status: TestStatus,
        duration_seconds: f64,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            failure_message: Some(message.into()),
            failure_detail: Some(detail.into()),
            ..Self::without_failure(name, class_name, status, duration_seconds)
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !self.duration_seconds.is_finite() || self.duration_seconds < 0.0 {
            return Err(format!(
                "test '{}' has invalid duration {}",
                self.name, self.duration_seconds
            ));
        }

        // Failing tests need a message; the detail is optional.
        let has_message = self.failure_message.as_deref().is_some_and(|m| !m.is_empty());

        if self.status.is_failure() {
            if !has_message {
                return Err(format!(
                    "test '{}' is {:?} but lacks a failure message",
                    self.name, self.status
                ));
            }
        } else if self.failure_message.is_some() || self.failure_detail.is_some() {
            return Err(format!(
                "test '{}' is {:?} but carries failure information",
                self.name, self.status
            ));
        }

        Ok(())
    }
}

/// Aggregate counts for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub suite_name: String,
    pub total_count: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    pub errored_count: usize,
    pub skipped_count: usize,
    pub total_duration_seconds: f64,
    pub started_at: DateTime<Utc>,
}

impl RunSummary {
    /// Percentage of passed tests, `None` for an empty run.
    pub fn pass_rate(&self) -> Option<f64> {
        if self.total_count == 0 {
            None
        } else {
            Some(self.passed_count as f64 * 100.0 / self.total_count as f64)
        }
    }

    /// Pass rate formatted with one decimal, or `n/a`.
    pub fn pass_rate_display(&self) -> String {
        match self.pass_rate() {
            Some(rate) => format!("{:.1}%", rate),
            None => "n/a".to_string(),
        }
    }
}

/// A complete, immutable snapshot of one test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultModel {
    pub summary: RunSummary,
    pub results: Vec<TestCaseResult>,
}

impl ResultModel {
    /// Build a model whose summary is derived from `results`.
    pub fn from_results(
        suite_name: impl Into<String>,
        started_at: DateTime<Utc>,
        results: Vec<TestCaseResult>,
    ) -> Self {
        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();

        let summary = RunSummary {
            suite_name: suite_name.into(),
            total_count: results.len(),
            passed_count: count(TestStatus::Passed),
            failed_count: count(TestStatus::Failed),
            errored_count: count(TestStatus::Errored),
            skipped_count: count(TestStatus::Skipped),
            total_duration_seconds: results.iter().map(|r| r.duration_seconds).sum(),
            started_at,
        };

        Self { summary, results }
    }

    /// Check the summary against the results and each result's own invariants.
    pub fn validate(&self) -> Result<()> {
        let s = &self.summary;
        let counted = s.passed_count + s.failed_count + s.errored_count + s.skipped_count;

        if s.total_count != counted {
            return Err(ReportError::InvalidModel(format!(
                "total count {} does not equal the sum of status counts {}",
                s.total_count, counted
            )));
        }

        if s.total_count != self.results.len() {
            return Err(ReportError::InvalidModel(format!(
                "total count {} does not match {} results",
                s.total_count,
                self.results.len()
            )));
        }

        if !s.total_duration_seconds.is_finite() || s.total_duration_seconds < 0.0 {
            return Err(ReportError::InvalidModel(format!(
                "invalid total duration {}",
                s.total_duration_seconds
            )));
        }

        for result in &self.results {
            result.validate().map_err(ReportError::InvalidModel)?;
        }

        Ok(())
    }
}
