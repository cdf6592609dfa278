pub mod console;
pub mod html;
pub mod json;
pub mod junit;
pub mod markdown;

use std::io::Write;
use log::debug;

use crate::core::config::OutputFormat;
use crate::core::error::{RenderError, Result};
use crate::core::model::ResultModel;

use self::console::ConsoleReporter;
use self::html::HtmlReporter;
use self::json::JsonReporter;
use self::junit::JunitReporter;
use self::markdown::MarkdownReporter;

/// Reporter trait for rendering a finished test run.
///
/// Implementations hold configuration only, so one instance can render any
/// number of models, from any number of threads.
pub trait Reporter {
    /// Render `model` into `sink`.
    ///
    /// Writes go straight to the sink without assuming it buffers; a failed
    /// write aborts rendering and is returned as [`RenderError::SinkWriteFailed`].
    fn report(&self, sink: &mut dyn Write, model: &ResultModel) -> std::result::Result<(), RenderError>;

    /// The format this reporter produces.
    fn format(&self) -> OutputFormat;
}

/// Caller-side knobs handed to the registry.
#[derive(Debug, Clone, Copy)]
pub struct ReporterOptions {
    pub color_enabled: bool,
    /// Print failure details in the console format.
    pub show_details: bool,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self { color_enabled: true, show_details: false }
    }
}

/// Build the reporter for `format`.
pub fn create_reporter(format: OutputFormat, options: &ReporterOptions) -> Box<dyn Reporter + Send + Sync> {
    debug!("Creating {} reporter (color: {}, details: {})", format, options.color_enabled, options.show_details);

    match format {
        OutputFormat::Json => Box::new(JsonReporter::new()),
        OutputFormat::Junit => Box::new(JunitReporter::new()),
        OutputFormat::Html => Box::new(HtmlReporter::new()),
        OutputFormat::Markdown => Box::new(MarkdownReporter::new()),
        OutputFormat::Console => Box::new(
            ConsoleReporter::new()
                .with_color(options.color_enabled)
                .with_details(options.show_details),
        ),
    }
}

/// Look a reporter up by its format name (`json`, `junit`, `html`, `markdown`, `console`).
pub fn reporter_for_name(name: &str, options: &ReporterOptions) -> Result<Box<dyn Reporter + Send + Sync>> {
    let format: OutputFormat = name.parse()?;
    Ok(create_reporter(format, options))
}

/// Render into an in-memory buffer.
pub fn render_to_vec(reporter: &dyn Reporter, model: &ResultModel) -> std::result::Result<Vec<u8>, RenderError> {
    let mut buf = Vec::new();
    reporter.report(&mut buf, model)?;
    Ok(buf)
}

/// Duration in seconds with millisecond precision, as used by the JUnit and
/// HTML reporters.
pub(crate) fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds)
}
