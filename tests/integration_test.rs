use std::io::{self, Write};
use std::process::Command;
use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use testreport::core::config::OutputFormat;
use testreport::core::error::RenderError;
use testreport::core::model::{ResultModel, TestCaseResult};
use testreport::reporters::{create_reporter, render_to_vec, reporter_for_name, ReporterOptions};

/// One pass and one failure that carries a message but no detail.
fn scenario_a() -> ResultModel {
    let mut failing = TestCaseResult::failed("B", "suite", 0.02, "assertion failed", "");
    failing.failure_detail = None;

    ResultModel::from_results(
        "scenario-a",
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        vec![TestCaseResult::passed("A", "suite", 0.01), failing],
    )
}

fn mixed() -> ResultModel {
    ResultModel::from_results(
        "mixed",
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        vec![
            TestCaseResult::passed("parse_ok", "parser", 0.003),
            TestCaseResult::failed("parse_err", "parser", 0.004, "unexpected token", "at line 3"),
            TestCaseResult::errored("db_connect", "storage", 1.25, "connection refused", "os error 111"),
            TestCaseResult::skipped("slow_path", "storage", 0.0),
            TestCaseResult::passed("render <html> & \"quotes\"", "ui", 0.5),
        ],
    )
}

fn empty() -> ResultModel {
    ResultModel::from_results("empty", Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(), vec![])
}

fn render(format: OutputFormat, model: &ResultModel) -> String {
    let options = ReporterOptions { color_enabled: false, show_details: false };
    let reporter = create_reporter(format, &options);
    String::from_utf8(render_to_vec(reporter.as_ref(), model).unwrap()).unwrap()
}

/// Check that `xml` is well formed: every element closes in order and there
/// is a single root. Returns the root element name.
fn check_well_formed(xml: &str) -> String {
    let mut stack: Vec<String> = Vec::new();
    let mut roots = Vec::new();
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        assert!(
            rest[..open].trim().is_empty() || !stack.is_empty(),
            "text outside the root element: {:?}",
            &rest[..open]
        );
        let close = rest[open..].find('>').expect("unterminated tag") + open;
        let tag = &rest[open + 1..close];
        rest = &rest[close + 1..];

        if tag.starts_with('?') {
            assert!(tag.ends_with('?'), "bad declaration {:?}", tag);
            continue;
        }
        assert!(!tag.contains('<'), "raw '<' inside tag {:?}", tag);

        if let Some(name) = tag.strip_prefix('/') {
            let expected = stack.pop().unwrap_or_else(|| panic!("stray </{}>", name));
            assert_eq!(name.trim(), expected, "mismatched closing tag");
            continue;
        }

        let name: String = tag.chars().take_while(|c| !c.is_whitespace() && *c != '/').collect();
        assert!(!name.is_empty(), "empty tag name");
        assert_eq!(tag.matches('"').count() % 2, 0, "unbalanced quotes in {:?}", tag);
        if stack.is_empty() {
            roots.push(name.clone());
        }
        if !tag.ends_with('/') {
            stack.push(name);
        }
    }

    assert!(rest.trim().is_empty(), "trailing text {:?}", rest);
    assert!(stack.is_empty(), "unclosed elements {:?}", stack);
    assert_eq!(roots.len(), 1, "expected one root element, found {:?}", roots);
    roots.remove(0)
}

/// Counts write calls and fails from the configured one onwards.
struct FailingSink {
    writes: usize,
    fail_at: usize,
}

impl FailingSink {
    fn new(fail_at: usize) -> Self {
        Self { writes: 0, fail_at }
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        if self.writes >= self.fail_at {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        } else {
            Ok(buf.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Accepts at most one byte per call, like a slow pipe.
struct TrickleSink(Vec<u8>);

impl Write for TrickleSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match buf.first() {
            Some(byte) => {
                self.0.push(*byte);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_json_preserves_count_and_order() {
    let model = mixed();
    let value: serde_json::Value = serde_json::from_str(&render(OutputFormat::Json, &model)).unwrap();

    let results = value["results"].as_array().unwrap();
    assert_eq!(value["summary"]["totalCount"], model.results.len());
    assert_eq!(results.len(), model.results.len());
    for (json, result) in results.iter().zip(&model.results) {
        assert_eq!(json["name"], result.name.as_str());
    }
}

#[test]
fn test_junit_counts_match_summary() {
    let model = mixed();
    let out = render(OutputFormat::Junit, &model);

    assert_eq!(out.matches("<testsuite ").count(), 1);
    assert!(out.contains(&format!(r#"tests="{}""#, model.summary.total_count)));
    assert_eq!(out.matches("<testcase ").count(), model.results.len());
    assert_eq!(
        out.matches("<failure ").count(),
        model.summary.failed_count + model.summary.errored_count
    );
    assert_eq!(out.matches("<skipped/>").count(), model.summary.skipped_count);
    assert!(out.contains(r#"name="render &lt;html&gt; &amp; &quot;quotes&quot;""#));
}

#[test]
fn test_junit_is_well_formed() {
    for model in [mixed(), scenario_a(), empty()] {
        let out = render(OutputFormat::Junit, &model);
        assert_eq!(check_well_formed(&out), "testsuite", "{}", model.summary.suite_name);
    }
}

#[test]
fn test_well_formed_check_catches_broken_nesting() {
    let broken = std::panic::catch_unwind(|| {
        check_well_formed("<testsuite><testcase></testsuite></testcase>")
    });
    assert!(broken.is_err());
    let unclosed = std::panic::catch_unwind(|| check_well_formed("<testsuite><testcase>"));
    assert!(unclosed.is_err());
    assert_eq!(check_well_formed("<?xml version=\"1.0\"?>\n<a><b/><c x=\"1\"></c></a>\n"), "a");
}

#[test]
fn test_scenario_a_junit() {
    let model = scenario_a();
    assert!(model.validate().is_ok());

    let out = render(OutputFormat::Junit, &model);
    assert!(out.contains(r#"tests="2" failures="1" errors="0""#));
    assert!(out.contains(r#"<testcase name="B" classname="suite" time="0.020">"#));
    assert!(out.contains(r#"<failure message="assertion failed" type="failure"/>"#));
    assert!(!out.contains("</failure>"));
}

#[test]
fn test_scenario_b_markdown() {
    let out = render(OutputFormat::Markdown, &scenario_a());
    for needle in ["## Summary", "## Results", "A", "B", "assertion failed"] {
        assert!(out.contains(needle), "missing {:?}", needle);
    }
}

#[test]
fn test_scenario_c_failing_sink() {
    let model = scenario_a();
    for format in OutputFormat::ALL {
        let reporter = create_reporter(format, &ReporterOptions::default());
        let mut sink = FailingSink::new(3);
        let result = reporter.report(&mut sink, &model);
        assert!(
            matches!(result, Err(RenderError::SinkWriteFailed(_))),
            "{} did not surface the sink failure",
            format
        );
    }
}

#[test]
fn test_partial_writes_are_handled() {
    let model = mixed();
    for format in OutputFormat::ALL {
        let reporter = create_reporter(format, &ReporterOptions::default());
        let mut sink = TrickleSink(Vec::new());
        reporter.report(&mut sink, &model).unwrap();
        assert_eq!(sink.0, render_to_vec(reporter.as_ref(), &model).unwrap());
    }
}

#[test]
fn test_rendering_is_deterministic() {
    let model = mixed();
    for format in OutputFormat::ALL {
        assert_eq!(render(format, &model), render(format, &model), "{} output differs", format);
    }
}

#[test]
fn test_empty_model_renders_in_every_format() {
    let model = empty();
    for format in OutputFormat::ALL {
        let out = render(format, &model);
        assert!(!out.is_empty(), "{} produced nothing", format);
    }

    let value: serde_json::Value = serde_json::from_str(&render(OutputFormat::Json, &model)).unwrap();
    assert_eq!(value["results"].as_array().unwrap().len(), 0);
    assert!(render(OutputFormat::Junit, &model).contains(r#"tests="0""#));
}

#[test]
fn test_concurrent_rendering_of_shared_model() {
    let model = Arc::new(mixed());
    let expected: Vec<String> = OutputFormat::ALL.iter().map(|f| render(*f, &model)).collect();

    let handles: Vec<_> = OutputFormat::ALL
        .into_iter()
        .map(|format| {
            let model = Arc::clone(&model);
            thread::spawn(move || render(format, &model))
        })
        .collect();

    for (handle, expected) in handles.into_iter().zip(expected) {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_reporter_is_reusable() {
    let reporter = reporter_for_name("markdown", &ReporterOptions::default()).unwrap();
    let first = render_to_vec(reporter.as_ref(), &scenario_a()).unwrap();
    let _ = render_to_vec(reporter.as_ref(), &mixed()).unwrap();
    let again = render_to_vec(reporter.as_ref(), &scenario_a()).unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_cli_formats() {
    let output = Command::new(env!("CARGO_BIN_EXE_testreport"))
        .arg("formats")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["json", "junit", "html", "markdown", "console"] {
        assert!(stdout.contains(name));
    }
}

#[test]
fn test_cli_render_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("model.json");
    std::fs::write(&input, render(OutputFormat::Json, &scenario_a())).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_testreport"))
        .args(["render", "--input"])
        .arg(&input)
        .args(["--format", "junit"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<?xml"));
    assert!(stdout.contains(r#"tests="2" failures="1""#));
}

#[test]
fn test_cli_render_many_formats_to_dir() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("model.json");
    std::fs::write(&input, render(OutputFormat::Json, &mixed())).unwrap();
    let out_dir = dir.path().join("reports");

    let output = Command::new(env!("CARGO_BIN_EXE_testreport"))
        .args(["-q", "render", "--input"])
        .arg(&input)
        .args(["-f", "junit", "-f", "html", "-f", "markdown", "--out-dir"])
        .arg(&out_dir)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(out_dir.join("report.xml").exists());
    assert!(out_dir.join("report.html").exists());
    let markdown = std::fs::read_to_string(out_dir.join("report.md")).unwrap();
    assert!(markdown.contains("db_connect"));
}

#[test]
fn test_cli_repeated_format_is_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("model.json");
    std::fs::write(&input, render(OutputFormat::Json, &mixed())).unwrap();
    let out_dir = dir.path().join("reports");

    let output = Command::new(env!("CARGO_BIN_EXE_testreport"))
        .args(["-q", "render", "--input"])
        .arg(&input)
        .args(["-f", "json", "-f", "junit", "-f", "json", "--out-dir"])
        .arg(&out_dir)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let json = std::fs::read_to_string(out_dir.join("report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["results"].as_array().unwrap().len(), 5);
    assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 2);
}

#[test]
fn test_cli_details_flag_is_independent_of_verbose() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("model.json");
    std::fs::write(&input, render(OutputFormat::Json, &mixed())).unwrap();

    let verbose = Command::new(env!("CARGO_BIN_EXE_testreport"))
        .args(["-v", "render", "--no-color", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute command");
    assert!(verbose.status.success());
    assert!(!String::from_utf8_lossy(&verbose.stdout).contains("os error 111"));

    let detailed = Command::new(env!("CARGO_BIN_EXE_testreport"))
        .args(["render", "--no-color", "--details", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute command");
    assert!(detailed.status.success());
    assert!(String::from_utf8_lossy(&detailed.stdout).contains("        os error 111"));
}

#[test]
fn test_cli_rejects_inconsistent_model() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("model.json");
    let mut model = scenario_a();
    model.summary.total_count = 5;
    std::fs::write(&input, serde_json::to_string(&model).unwrap()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_testreport"))
        .args(["render", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid result model"));
}

#[test]
fn test_cli_unknown_format() {
    let output = Command::new(env!("CARGO_BIN_EXE_testreport"))
        .args(["render", "--input", "model.json", "--format", "pdf"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}
