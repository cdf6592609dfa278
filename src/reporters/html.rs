use std::io::Write;
use chrono::SecondsFormat;
use indoc::{indoc, writedoc};

use crate::core::config::OutputFormat;
use crate::core::error::RenderError;
use crate::core::model::{ResultModel, TestCaseResult};
use crate::core::style::{escape_html, HtmlStyle, StyleProvider};
use crate::reporters::{format_seconds, Reporter};

const STYLESHEET: &str = indoc! {"
    body { font-family: -apple-system, Segoe UI, Helvetica, Arial, sans-serif; margin: 2rem; color: #24292f; }
    h1 { margin-bottom: 0.25rem; }
    .meta { color: #57606a; margin-top: 0; }
    table { border-collapse: collapse; width: 100%; margin-bottom: 1.5rem; }
    th, td { border: 1px solid #d0d7de; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }
    th { background: #f6f8fa; }
    .summary td.count { font-weight: bold; }
    .status { font-weight: bold; white-space: nowrap; }
    .status.passed { color: #1a7f37; }
    .status.failed { color: #cf222e; }
    .status.errored { color: #8250df; }
    .status.skipped { color: #9a6700; }
    tr.failed, tr.errored { background: #ffebe9; }
    tr.skipped { background: #fff8c5; }
    .progress { background: #cf222e; height: 0.75rem; width: 20rem; border-radius: 0.375rem; overflow: hidden; }
    .progress-fill { background: #1a7f37; height: 100%; }
    pre { background: #f6f8fa; padding: 0.5rem; overflow-x: auto; white-space: pre-wrap; margin: 0.25rem 0 0; }
    .empty { color: #57606a; font-style: italic; }
"};

/// Self-contained HTML reporter
///
/// Everything, including the stylesheet, is inlined so the file can be
/// archived as a CI artifact and opened anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlReporter;

impl HtmlReporter {
    /// Create a new HTML reporter
    pub fn new() -> Self {
        Self
    }

    fn write_summary(&self, sink: &mut dyn Write, model: &ResultModel) -> Result<(), RenderError> {
        let summary = &model.summary;

        writeln!(sink, r#"<section class="summary">"#)?;
        writeln!(sink, "<h2>Summary</h2>")?;
        writeln!(sink, "<table>")?;
        writeln!(sink, "<tr><th>Total</th><th>Passed</th><th>Failed</th><th>Errored</th><th>Skipped</th><th>Duration</th><th>Pass rate</th></tr>")?;
        writeln!(
            sink,
            r#"<tr><td class="count">{}</td><td class="count">{}</td><td class="count">{}</td><td class="count">{}</td><td class="count">{}</td><td>{}s</td><td>{}</td></tr>"#,
            summary.total_count,
            summary.passed_count,
            summary.failed_count,
            summary.errored_count,
            summary.skipped_count,
            format_seconds(summary.total_duration_seconds),
            summary.pass_rate_display()
        )?;
        writeln!(sink, "</table>")?;
        HtmlStyle.progress(sink, summary.passed_count, summary.total_count)?;
        writeln!(sink)?;
        writeln!(sink, "</section>")?;

        Ok(())
    }

    fn write_result_row(&self, sink: &mut dyn Write, result: &TestCaseResult) -> Result<(), RenderError> {
        write!(sink, r#"<tr class="{}"><td>"#, HtmlStyle::status_class(result.status))?;
        HtmlStyle.status_marker(sink, result.status)?;
        write!(
            sink,
            "</td><td>{}</td><td>{}</td><td>{}s</td><td>",
            escape_html(&result.name),
            escape_html(&result.class_name),
            format_seconds(result.duration_seconds)
        )?;

        if let Some(message) = &result.failure_message {
            write!(sink, "{}", escape_html(message))?;
        }
        if let Some(detail) = &result.failure_detail {
            write!(sink, "<details><summary>Details</summary><pre>{}</pre></details>", escape_html(detail))?;
        }

        writeln!(sink, "</td></tr>")?;
        Ok(())
    }

    fn write_results(&self, sink: &mut dyn Write, model: &ResultModel) -> Result<(), RenderError> {
        writeln!(sink, r#"<section class="results">"#)?;
        writeln!(sink, "<h2>Results</h2>")?;

        if model.results.is_empty() {
            writeln!(sink, r#"<p class="empty">No tests were run.</p>"#)?;
        } else {
            writeln!(sink, "<table>")?;
            writeln!(sink, "<tr><th>Status</th><th>Test</th><th>Group</th><th>Duration</th><th>Message</th></tr>")?;
            for result in &model.results {
                self.write_result_row(sink, result)?;
            }
            writeln!(sink, "</table>")?;
        }

        writeln!(sink, "</section>")?;
        Ok(())
    }
}

impl Reporter for HtmlReporter {
    fn report(&self, sink: &mut dyn Write, model: &ResultModel) -> Result<(), RenderError> {
        let summary = &model.summary;
        let suite = escape_html(&summary.suite_name);

        writedoc!(
            sink,
            r#"
            <!DOCTYPE html>
            <html lang="en">
            <head>
            <meta charset="utf-8">
            <title>Test Report: {suite}</title>
            <style>
            {stylesheet}</style>
            </head>
            <body>
            <header>
            "#,
            suite = suite,
            stylesheet = STYLESHEET,
        )?;
        HtmlStyle.title(sink, &format!("Test Report: {}", summary.suite_name))?;
        writeln!(
            sink,
            r#"<p class="meta">Started {}</p>"#,
            summary.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        writeln!(sink, "</header>")?;

        self.write_summary(sink, model)?;
        self.write_results(sink, model)?;

        writeln!(sink, "</body>")?;
        writeln!(sink, "</html>")?;

        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::render_to_vec;
    use chrono::{TimeZone, Utc};

    fn render(model: &ResultModel) -> String {
        String::from_utf8(render_to_vec(&HtmlReporter::new(), model).unwrap()).unwrap()
    }

    fn started() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_document_reflects_model() {
        let model = ResultModel::from_results(
            "web <ui>",
            started(),
            vec![
                TestCaseResult::passed("renders", "ui::button", 0.01),
                TestCaseResult::failed("clicks", "ui::button", 0.02, "expected <b>", "stack & trace"),
            ],
        );
        let out = render(&model);

        assert!(out.starts_with("<!DOCTYPE html>\n"));
        assert!(out.contains("<title>Test Report: web &lt;ui&gt;</title>"));
        assert!(out.contains("<h1>Test Report: web &lt;ui&gt;</h1>"));
        assert!(out.contains("<style>\nbody {"));
        assert!(out.contains(r#"<td class="count">2</td><td class="count">1</td><td class="count">1</td>"#));
        assert!(out.contains("<td>50.0%</td>"));
        assert!(out.contains(r#"<tr class="passed">"#));
        assert!(out.contains(r#"<tr class="failed">"#));
        assert!(out.contains("<td>renders</td>"));
        assert!(out.contains("expected &lt;b&gt;"));
        assert!(out.contains("<pre>stack &amp; trace</pre>"));
        assert!(out.contains(r#"style="width: 50.0%""#));
        assert!(out.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_errored_result() {
        let model = ResultModel::from_results(
            "s",
            started(),
            vec![TestCaseResult::errored("db", "storage", 1.25, "connection refused", "os error 111")],
        );
        let out = render(&model);
        assert!(out.contains(r#"<tr class="errored"><td><span class="status errored">! ERROR</span></td><td>db</td>"#));
        assert!(out.contains("<td>1.250s</td><td>connection refused<details>"));
        assert!(out.contains("<pre>os error 111</pre>"));
        assert!(out.contains(r#"<td class="count">1</td><td class="count">0</td><td class="count">0</td><td class="count">1</td>"#));
    }

    #[test]
    fn test_no_external_resources() {
        let model = ResultModel::from_results("s", started(), vec![TestCaseResult::passed("a", "m", 0.1)]);
        let out = render(&model);
        assert!(!out.contains("<link"));
        assert!(!out.contains("<script"));
        assert!(!out.contains("http://"));
        assert!(!out.contains("https://"));
    }

    #[test]
    fn test_empty_run_renders_sections() {
        let out = render(&ResultModel::from_results("empty", started(), vec![]));
        assert!(out.contains("<h2>Summary</h2>"));
        assert!(out.contains("<h2>Results</h2>"));
        assert!(out.contains("No tests were run."));
        assert!(out.contains("<td>n/a</td>"));
    }
}
