use std::fs::{self, File};
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use log::{debug, error, info};
use rayon::prelude::*;
use simple_logger::SimpleLogger;

use testreport::core::config::{OutputFormat, ReportConfig};
use testreport::core::model::ResultModel;
use testreport::reporters::{create_reporter, Reporter, ReporterOptions};


#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}


#[derive(Subcommand)]
enum Commands {
    /// Render a JSON result model into one or more report formats
    Render {
        /// Result model as written by the json format
        #[arg(short, long)]
        input: PathBuf,

        /// Output format, may be repeated
        #[arg(short = 'f', long = "format", value_enum)]
        formats: Vec<OutputFormat>,

        /// Output file for a single format (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory receiving report.<ext> for each format
        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[arg(long)]
        no_color: bool,

        /// Print failure details in console output
        #[arg(long)]
        details: bool,

        /// Override the suite name stored in the model
        #[arg(long)]
        suite_name: Option<String>,
    },

    /// List the recognized format names
    Formats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ReportConfig::default(),
    };
    config.verbose |= cli.verbose;
    config.quiet |= cli.quiet;

    let log_level = if config.verbose {
        log::LevelFilter::Debug
    } else if config.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };

    SimpleLogger::new()
        .with_level(log_level)
        .init()
        .context("Failed to initialize logger")?;

    debug!("Testreport v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Formats => {
            for format in OutputFormat::ALL {
                println!("{:<10} report.{}", format.name().bold(), format.extension());
            }
            Ok(())
        }

        Commands::Render { input, formats, output, out_dir, no_color, details, suite_name } => {
            if !formats.is_empty() {
                config.formats = formats;
            }
            if output.is_some() {
                config.output_file = output;
            }
            if out_dir.is_some() {
                config.output_dir = out_dir;
            }
            if no_color {
                config.color = Some(false);
            }
            config.details |= details;
            if suite_name.is_some() {
                config.suite_name = suite_name;
            }

            let unique = config.unique_formats();
            if unique.len() != config.formats.len() {
                debug!("Ignoring repeated formats in {:?}", config.formats);
            }
            config.formats = unique;

            run_render(&input, &config)
        }
    }
}


fn load_model(path: &Path, suite_name: Option<&str>) -> Result<ResultModel> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read result model {}", path.display()))?;

    let mut model: ResultModel = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse result model {}", path.display()))?;

    if let Some(name) = suite_name {
        model.summary.suite_name = name.to_string();
    }

    model.validate()?;

    info!(
        "Loaded {} results for suite '{}'",
        model.results.len(),
        model.summary.suite_name
    );
    Ok(model)
}


fn run_render(input: &Path, config: &ReportConfig) -> Result<()> {
    let model = load_model(input, config.suite_name.as_deref())?;

    if let Some(dir) = &config.output_dir {
        if config.output_file.is_some() {
            bail!("--output and --out-dir cannot be combined");
        }
        return render_to_dir(&model, config, dir);
    }

    if config.formats.len() > 1 {
        bail!("Rendering several formats requires --out-dir");
    }

    let format = config.formats.first().copied().unwrap_or(OutputFormat::Console);

    match &config.output_file {
        Some(path) => {
            let reporter = create_reporter(format, &reporter_options(config, false));
            render_to_file(reporter.as_ref(), &model, path)?;
            announce(config, format, path);
        }
        None => {
            let reporter = create_reporter(format, &reporter_options(config, true));
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            reporter.report(&mut lock, &model)
                .with_context(|| format!("Failed to render {} report", format))?;
            lock.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}


fn render_to_dir(model: &ResultModel, config: &ReportConfig, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let options = reporter_options(config, false);

    // Reporters are stateless and the model is only borrowed, so formats render in parallel.
    let failures: Vec<String> = config.formats
        .par_iter()
        .filter_map(|format| {
            let path = dir.join(format!("report.{}", format.extension()));
            let reporter = create_reporter(*format, &options);
            match render_to_file(reporter.as_ref(), model, &path) {
                Ok(()) => {
                    announce(config, *format, &path);
                    None
                }
                Err(e) => {
                    error!("{:#}", e);
                    Some(format.name().to_string())
                }
            }
        })
        .collect();

    if !failures.is_empty() {
        bail!("Failed to render: {}", failures.join(", "));
    }

    Ok(())
}


/// Write a report to `path`, removing the file again if rendering fails.
fn render_to_file(reporter: &dyn Reporter, model: &ResultModel, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let rendered = reporter.report(&mut writer, model)
        .map_err(anyhow::Error::from)
        .and_then(|()| writer.flush().map_err(anyhow::Error::from));

    if let Err(e) = rendered {
        drop(writer);
        if let Err(remove_err) = fs::remove_file(path) {
            debug!("Could not remove partial report {}: {}", path.display(), remove_err);
        }
        return Err(e.context(format!("Failed to render {} report to {}", reporter.format(), path.display())));
    }

    Ok(())
}


/// Colors only make sense on a terminal; an explicit config value wins.
fn reporter_options(config: &ReportConfig, to_stdout: bool) -> ReporterOptions {
    let color_enabled = match config.color {
        Some(color) => color,
        None => to_stdout && io::stdout().is_terminal(),
    };

    ReporterOptions { color_enabled, show_details: config.details }
}


fn announce(config: &ReportConfig, format: OutputFormat, path: &Path) {
    if !config.quiet {
        eprintln!("{} {} report to {}", "Wrote".green().bold(), format, path.display());
    }
}
