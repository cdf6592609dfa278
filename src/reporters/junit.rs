use std::io::Write;
use chrono::SecondsFormat;

use crate::core::config::OutputFormat;
use crate::core::error::RenderError;
use crate::core::model::{ResultModel, TestCaseResult, TestStatus};
use crate::reporters::{format_seconds, Reporter};

/// JUnit XML reporter for CI systems
///
/// Emits a single `<testsuite>` root. Failed and errored cases carry a
/// `<failure>` child, skipped cases a `<skipped/>` marker.
#[derive(Debug, Default, Clone, Copy)]
pub struct JunitReporter;

impl JunitReporter {
    /// Create a new JUnit reporter
    pub fn new() -> Self {
        Self
    }

    /// `time` attributes must be plain non-negative decimals.
    fn time_attr(seconds: f64, what: &str) -> Result<String, RenderError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(RenderError::EncodingFailed(format!(
                "{} has invalid duration {}",
                what, seconds
            )));
        }
        Ok(format_seconds(seconds))
    }

    fn failure_type(status: TestStatus) -> &'static str {
        match status {
            TestStatus::Errored => "error",
            _ => "failure",
        }
    }

    fn write_testcase(sink: &mut dyn Write, result: &TestCaseResult) -> Result<(), RenderError> {
        let time = Self::time_attr(result.duration_seconds, &format!("test '{}'", result.name))?;

        write!(
            sink,
            r#"  <testcase name="{}" classname="{}" time="{}""#,
            escape_xml_attr(&result.name),
            escape_xml_attr(&result.class_name),
            time
        )?;

        match result.status {
            TestStatus::Passed => {
                writeln!(sink, "/>")?;
            }
            TestStatus::Skipped => {
                writeln!(sink, ">")?;
                writeln!(sink, "    <skipped/>")?;
                writeln!(sink, "  </testcase>")?;
            }
            TestStatus::Failed | TestStatus::Errored => {
                writeln!(sink, ">")?;
                write!(
                    sink,
                    r#"    <failure message="{}" type="{}""#,
                    escape_xml_attr(result.failure_message.as_deref().unwrap_or_default()),
                    Self::failure_type(result.status)
                )?;
                match result.failure_detail.as_deref() {
                    Some(detail) if !detail.is_empty() => {
                        writeln!(sink, ">{}</failure>", escape_xml(detail))?;
                    }
                    _ => {
                        writeln!(sink, "/>")?;
                    }
                }
                writeln!(sink, "  </testcase>")?;
            }
        }

        Ok(())
    }
}

impl Reporter for JunitReporter {
    fn report(&self, sink: &mut dyn Write, model: &ResultModel) -> Result<(), RenderError> {
        let summary = &model.summary;
        let time = Self::time_attr(summary.total_duration_seconds, "test suite")?;

        writeln!(sink, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        write!(
            sink,
            r#"<testsuite name="{}" tests="{}" failures="{}" errors="{}" skipped="{}" time="{}" timestamp="{}""#,
            escape_xml_attr(&summary.suite_name),
            summary.total_count,
            summary.failed_count,
            summary.errored_count,
            summary.skipped_count,
            time,
            summary.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;

        if model.results.is_empty() {
            writeln!(sink, "/>")?;
            return Ok(());
        }

        writeln!(sink, ">")?;
        for result in &model.results {
            Self::write_testcase(sink, result)?;
        }
        writeln!(sink, "</testsuite>")?;

        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Junit
    }
}

/// Escape text for XML element content.
///
/// Characters XML 1.0 cannot carry at all are written as a visible
/// `\u{XXXX}` sequence so the text is never silently shortened.
pub fn escape_xml(text: &str) -> String {
    escape(text, false)
}

/// Escape text for a double-quoted attribute value. Line breaks and tabs
/// become character references, otherwise parsers normalize them to spaces.
pub fn escape_xml_attr(text: &str) -> String {
    escape(text, true)
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' if attribute => escaped.push_str(&format!("&#{};", c as u32)),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if is_xml_char(c) => escaped.push(c),
            c => escaped.push_str(&format!("\\u{{{:04X}}}", c as u32)),
        }
    }
    escaped
}

fn is_xml_char(c: char) -> bool {
    matches!(c as u32, 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF)
}
