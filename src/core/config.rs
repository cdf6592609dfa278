use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::error::{ReportError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub formats: Vec<OutputFormat>,
    pub output_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,

    /// `None` lets the caller decide from the output target.
    pub color: Option<bool>,
    pub verbose: bool,
    pub quiet: bool,

    /// Failure details under each failing test in console output.
    pub details: bool,
    pub suite_name: Option<String>,
}

/// The report formats the registry can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Junit,
    Html,
    Markdown,
    Console,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Json,
        OutputFormat::Junit,
        OutputFormat::Html,
        OutputFormat::Markdown,
        OutputFormat::Console,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Junit => "junit",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Console => "console",
        }
    }

    /// File extension used when writing into an output directory.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Junit => "xml",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Console => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.name() == s)
            .ok_or_else(|| ReportError::UnknownFormat(s.to_string()))
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            formats: vec![OutputFormat::Console],
            output_file: None,
            output_dir: None,
            color: None,
            verbose: false,
            quiet: false,
            details: false,
            suite_name: None,
        }
    }
}

impl ReportConfig {
    /// Load a config file; `.toml` files are parsed as TOML, everything else as JSON.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::Config(format!("Config file not found: {}", path.display())));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ReportError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse(&contents, path.extension().and_then(|ext| ext.to_str()) == Some("toml"))
    }

    /// The requested formats in order, each listed once.
    pub fn unique_formats(&self) -> Vec<OutputFormat> {
        let mut seen = HashSet::new();
        self.formats.iter().copied().filter(|format| seen.insert(*format)).collect()
    }

    fn parse(contents: &str, is_toml: bool) -> Result<Self> {
        let config = if is_toml {
            toml::from_str::<Self>(contents)
                .map_err(|e| ReportError::Config(format!("Failed to parse TOML config: {}", e)))?
        } else {
            serde_json::from_str::<Self>(contents)
                .map_err(|e| ReportError::Config(format!("Failed to parse JSON config: {}", e)))?
        };

        if config.formats.is_empty() {
            return Err(ReportError::Config("At least one output format is required".to_string()));
        }
        if config.formats.len() > 1 && config.output_file.is_some() {
            return Err(ReportError::Config(
                "output_file cannot be used with several formats; set output_dir instead".to_string(),
            ));
        }

        Ok(config)
    }
}
