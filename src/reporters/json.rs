use std::io::Write;

use crate::core::config::OutputFormat;
use crate::core::error::RenderError;
use crate::core::model::ResultModel;
use crate::reporters::Reporter;

/// JSON reporter for machine-readable output
///
/// The document has two top-level fields, `summary` and `results`, and is
/// pretty-printed with a two-space indent. Absent failure fields are omitted.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self
    }

    /// JSON has no representation for NaN or infinity; serde_json would
    /// quietly write `null` instead.
    fn check_numbers(model: &ResultModel) -> Result<(), RenderError> {
        let total = model.summary.total_duration_seconds;
        if !total.is_finite() {
            return Err(RenderError::EncodingFailed(format!(
                "total duration {} is not a finite number",
                total
            )));
        }

        if let Some(result) = model.results.iter().find(|r| !r.duration_seconds.is_finite()) {
            return Err(RenderError::EncodingFailed(format!(
                "duration of '{}' is not a finite number",
                result.name
            )));
        }

        Ok(())
    }
}

impl Reporter for JsonReporter {
    fn report(&self, sink: &mut dyn Write, model: &ResultModel) -> Result<(), RenderError> {
        Self::check_numbers(model)?;

        serde_json::to_writer_pretty(&mut *sink, model)?;
        writeln!(sink)?;

        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}
