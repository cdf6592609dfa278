//! Styling primitives shared by the human-facing reporters.
//!
//! Reporters never emit escape codes or markup for emphasis themselves; they
//! ask a [`StyleProvider`] to write titles, status markers and progress bars
//! straight into the sink. Swapping the provider changes the look without
//! touching the layout logic.

use std::io::{self, Write};
use termcolor::{Ansi, Color, ColorSpec, WriteColor};

use crate::core::model::TestStatus;

const PROGRESS_WIDTH: usize = 20;

pub trait StyleProvider: Send + Sync {
    /// Write a heading.
    fn title(&self, out: &mut dyn Write, text: &str) -> io::Result<()>;

    /// Write the glyph and label for a test status.
    fn status_marker(&self, out: &mut dyn Write, status: TestStatus) -> io::Result<()>;

    /// Write a bar showing `done` out of `total`.
    fn progress(&self, out: &mut dyn Write, done: usize, total: usize) -> io::Result<()>;
}

fn glyph(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "✓",
        TestStatus::Failed => "✗",
        TestStatus::Skipped => "○",
        TestStatus::Errored => "!",
    }
}

fn filled_cells(done: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        done.min(total) * PROGRESS_WIDTH / total
    }
}

fn text_bar(done: usize, total: usize) -> String {
    let filled = filled_cells(done, total);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(PROGRESS_WIDTH - filled))
}

/// Plain text, no escape codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainStyle;

impl StyleProvider for PlainStyle {
    fn title(&self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        writeln!(out, "{}", text)?;
        writeln!(out, "{}", "=".repeat(text.chars().count()))
    }

    fn status_marker(&self, out: &mut dyn Write, status: TestStatus) -> io::Result<()> {
        write!(out, "{} {}", glyph(status), status.label())
    }

    fn progress(&self, out: &mut dyn Write, done: usize, total: usize) -> io::Result<()> {
        write!(out, "{}", text_bar(done, total))
    }
}

/// ANSI colored terminal output.
///
/// Escape codes are always emitted; deciding whether the destination can
/// display them is up to whoever picks the style.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsiStyle;

impl AnsiStyle {
    fn status_color(status: TestStatus) -> Color {
        match status {
            TestStatus::Passed => Color::Green,
            TestStatus::Failed => Color::Red,
            TestStatus::Skipped => Color::Yellow,
            TestStatus::Errored => Color::Magenta,
        }
    }

    fn painted(out: &mut dyn Write, spec: &ColorSpec, text: &str) -> io::Result<()> {
        let mut ansi = Ansi::new(out);
        ansi.set_color(spec)?;
        ansi.write_all(text.as_bytes())?;
        ansi.reset()
    }
}

impl StyleProvider for AnsiStyle {
    fn title(&self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        Self::painted(out, ColorSpec::new().set_bold(true), text)?;
        writeln!(out)?;
        writeln!(out, "{}", "=".repeat(text.chars().count()))
    }

    fn status_marker(&self, out: &mut dyn Write, status: TestStatus) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Self::status_color(status))).set_bold(true);
        Self::painted(out, &spec, &format!("{} {}", glyph(status), status.label()))
    }

    fn progress(&self, out: &mut dyn Write, done: usize, total: usize) -> io::Result<()> {
        let filled = filled_cells(done, total);
        write!(out, "[")?;
        Self::painted(out, ColorSpec::new().set_fg(Some(Color::Green)), &"#".repeat(filled))?;
        Self::painted(
            out,
            ColorSpec::new().set_fg(Some(Color::Red)),
            &"-".repeat(PROGRESS_WIDTH - filled),
        )?;
        write!(out, "]")
    }
}

/// HTML markup with CSS classes; the HTML reporter ships the matching stylesheet.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlStyle;

impl HtmlStyle {
    pub fn status_class(status: TestStatus) -> &'static str {
        match status {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::Errored => "errored",
        }
    }
}

impl StyleProvider for HtmlStyle {
    fn title(&self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        writeln!(out, "<h1>{}</h1>", escape_html(text))
    }

    fn status_marker(&self, out: &mut dyn Write, status: TestStatus) -> io::Result<()> {
        write!(
            out,
            r#"<span class="status {}">{} {}</span>"#,
            Self::status_class(status),
            glyph(status),
            status.label()
        )
    }

    fn progress(&self, out: &mut dyn Write, done: usize, total: usize) -> io::Result<()> {
        let percent = if total == 0 { 0.0 } else { done.min(total) as f64 * 100.0 / total as f64 };
        write!(
            out,
            r#"<div class="progress"><div class="progress-fill" style="width: {:.1}%"></div></div>"#,
            percent
        )
    }
}

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
