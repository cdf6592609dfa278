use std::io::Write;
use chrono::SecondsFormat;

use crate::core::config::OutputFormat;
use crate::core::error::RenderError;
use crate::core::model::ResultModel;
use crate::reporters::Reporter;

/// Markdown reporter, suitable for PR comments and job summaries
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// Create a new Markdown reporter
    pub fn new() -> Self {
        Self
    }

    /// Make text safe inside a table cell.
    fn cell(text: &str) -> String {
        Self::single_line(&text.replace('\\', "\\\\").replace('|', "\\|"))
    }

    /// Make text safe inside a heading or emphasis: one line, and no
    /// characters Markdown would read as markup.
    fn inline(text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in Self::single_line(text).chars() {
            if matches!(c, '\\' | '*' | '_' | '`' | '#' | '[' | ']' | '<' | '>' | '|') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    fn single_line(text: &str) -> String {
        text.replace("\r\n", " ").replace(['\n', '\r'], " ")
    }
}

impl Reporter for MarkdownReporter {
    fn report(&self, sink: &mut dyn Write, model: &ResultModel) -> Result<(), RenderError> {
        let summary = &model.summary;

        writeln!(sink, "# Test Report")?;
        writeln!(sink)?;

        writeln!(sink, "## Summary")?;
        writeln!(sink)?;
        writeln!(sink, "| Field | Value |")?;
        writeln!(sink, "|-------|-------|")?;
        writeln!(sink, "| Suite | {} |", Self::cell(&summary.suite_name))?;
        writeln!(sink, "| Started | {} |", summary.started_at.to_rfc3339_opts(SecondsFormat::Secs, true))?;
        writeln!(sink, "| Total | {} |", summary.total_count)?;
        writeln!(sink, "| Passed | {} |", summary.passed_count)?;
        writeln!(sink, "| Failed | {} |", summary.failed_count)?;
        writeln!(sink, "| Errored | {} |", summary.errored_count)?;
        writeln!(sink, "| Skipped | {} |", summary.skipped_count)?;
        writeln!(sink, "| Duration | {:.3}s |", summary.total_duration_seconds)?;
        writeln!(sink, "| Pass rate | {} |", summary.pass_rate_display())?;
        writeln!(sink)?;

        writeln!(sink, "## Results")?;
        writeln!(sink)?;

        if model.results.is_empty() {
            writeln!(sink, "_No tests were run._")?;
            return Ok(());
        }

        writeln!(sink, "| Test | Group | Status | Duration | Message |")?;
        writeln!(sink, "|------|-------|--------|----------|---------|")?;
        for result in &model.results {
            writeln!(
                sink,
                "| {} | {} | {} | {:.3}s | {} |",
                Self::cell(&result.name),
                Self::cell(&result.class_name),
                result.status.label(),
                result.duration_seconds,
                result.failure_message.as_deref().map(Self::cell).unwrap_or_default()
            )?;
        }

        let failures: Vec<_> = model.results.iter().filter(|r| r.status.is_failure()).collect();
        if !failures.is_empty() {
            writeln!(sink)?;
            writeln!(sink, "## Failures")?;
            for result in failures {
                writeln!(sink)?;
                writeln!(sink, "### {} ({})", Self::inline(&result.name), result.status.label())?;
                writeln!(sink)?;
                if let Some(message) = &result.failure_message {
                    writeln!(sink, "**{}**", Self::inline(message))?;
                    writeln!(sink)?;
                }
                if let Some(detail) = &result.failure_detail {
                    // A fence longer than any backtick run in the detail.
                    let longest = detail
                        .split(|c| c != '`')
                        .map(str::len)
                        .max()
                        .unwrap_or(0);
                    let fence = "`".repeat(longest.max(2) + 1);
                    writeln!(sink, "{}", fence)?;
                    writeln!(sink, "{}", detail)?;
                    writeln!(sink, "{}", fence)?;
                }
            }
        }

        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}
