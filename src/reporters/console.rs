use std::io::Write;
use std::time::Duration;

use crate::core::config::OutputFormat;
use crate::core::error::RenderError;
use crate::core::model::ResultModel;
use crate::core::style::{AnsiStyle, PlainStyle, StyleProvider};
use crate::reporters::Reporter;

/// Console reporter for terminal output
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    color_enabled: bool,
    show_details: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    /// Create a new console reporter with color on and details off
    pub fn new() -> Self {
        Self { color_enabled: true, show_details: false }
    }

    /// Toggle ANSI colors. Callers turn this off when the sink is not a terminal.
    pub fn with_color(mut self, color_enabled: bool) -> Self {
        self.color_enabled = color_enabled;
        self
    }

    /// Also print failure details under each failing test
    pub fn with_details(mut self, show_details: bool) -> Self {
        self.show_details = show_details;
        self
    }

    pub fn color_enabled(&self) -> bool {
        self.color_enabled
    }

    fn style(&self) -> &'static dyn StyleProvider {
        if self.color_enabled {
            &AnsiStyle
        } else {
            &PlainStyle
        }
    }

    /// Format a duration in a human-readable format, to millisecond precision
    fn format_duration(seconds: f64) -> String {
        match Duration::try_from_secs_f64(seconds) {
            Ok(duration) => {
                let millis = Duration::from_millis(duration.as_millis() as u64);
                humantime::format_duration(millis).to_string()
            }
            Err(_) => format!("{}s", seconds),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, sink: &mut dyn Write, model: &ResultModel) -> Result<(), RenderError> {
        let style = self.style();
        let summary = &model.summary;

        style.title(sink, &format!("TEST RUN: {}", summary.suite_name))?;
        writeln!(sink, "Started: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(sink)?;

        let max_name_len = model.results.iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0);

        for result in &model.results {
            write!(sink, "  ")?;
            style.status_marker(sink, result.status)?;
            let padding = max_name_len - result.name.chars().count();
            writeln!(
                sink,
                "{}  {}{}  ({})",
                " ".repeat(5 - result.status.label().len()),
                result.name,
                " ".repeat(padding),
                Self::format_duration(result.duration_seconds)
            )?;

            if let Some(message) = &result.failure_message {
                writeln!(sink, "      {}", message)?;
            }
            if self.show_details {
                if let Some(detail) = &result.failure_detail {
                    for line in detail.lines() {
                        writeln!(sink, "        {}", line)?;
                    }
                }
            }
        }

        if !model.results.is_empty() {
            writeln!(sink)?;
        }

        write!(
            sink,
            "{} tests: {} passed, {} failed, {} errored, {} skipped in {} | pass rate {} ",
            summary.total_count,
            summary.passed_count,
            summary.failed_count,
            summary.errored_count,
            summary.skipped_count,
            Self::format_duration(summary.total_duration_seconds),
            summary.pass_rate_display()
        )?;
        style.progress(sink, summary.passed_count, summary.total_count)?;
        writeln!(sink)?;

        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}
