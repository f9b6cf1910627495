//! CLI definition, run pipeline, and reporting.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use folderfit::core::config::Config;
use folderfit::core::errors::FitError;
use folderfit::core::units::{format_size, parse_capacity};
use folderfit::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use folderfit::scanner::sizer::{DirectorySizer, SizerConfig, expand_sources};
use folderfit::select::{ItemSizes, Selection, Selector, total_size};

/// folderfit: pick the files and folders that best fill a fixed capacity.
#[derive(Debug, Parser)]
#[command(
    name = "folderfit",
    author,
    version,
    about = "Pick the files and folders that best fill a fixed capacity",
    long_about = None,
    arg_required_else_help = true,
    after_help = "Example: folderfit '*' --size=4.7GB"
)]
pub struct Cli {
    /// Files and folders to choose from; a single `*` includes every entry of
    /// the current directory.
    #[arg(value_name = "SOURCES")]
    sources: Vec<String>,
    /// Target capacity in bytes, or with a B/KB/MB/GB suffix (1 KB = 1024 B).
    /// Quote values that contain a comma or space.
    #[arg(short, long, value_name = "SIZE")]
    size: Option<String>,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long)]
    json: bool,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
    /// Print per-source sizes and selector diagnostics.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Library failure; classified by its code.
    #[error("{0}")]
    Fit(#[from] FitError),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Fit(err) if err.is_user_error() => 1,
            Self::Fit(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

/// Everything one run produced, ready for either output mode.
struct RunSummary {
    items: ItemSizes,
    selection: Selection,
    elapsed: Duration,
}

/// Load config, run the pipeline, and record the outcome in the activity log.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    let mut activity = config
        .paths
        .jsonl_log
        .as_ref()
        .map(|path| JsonlWriter::open(JsonlConfig::for_path(path)));

    let result = fit(cli, &config, activity.as_mut());
    if let (Err(CliError::Fit(err)), Some(log)) = (&result, activity.as_mut()) {
        log.write_entry(&LogEntry::from_error(err));
    }
    if let Some(log) = activity.as_mut() {
        log.flush();
    }

    let summary = result?;
    match output_mode(cli) {
        OutputMode::Human => print_human(cli, &summary),
        OutputMode::Json => write_json_line(&summary_json(&summary)),
    }
}

fn fit(
    cli: &Cli,
    config: &Config,
    mut activity: Option<&mut JsonlWriter>,
) -> Result<RunSummary, CliError> {
    let start = Instant::now();

    // Reject a bad size before touching the filesystem.
    let Some(size_expr) = cli.size.as_deref() else {
        return Err(FitError::invalid_capacity("", "missing --size").into());
    };
    let capacity = parse_capacity(size_expr)?;

    let sources = expand_sources(&cli.sources);
    if sources.is_empty() {
        return Err(FitError::NoSources.into());
    }

    if cli.verbose {
        eprintln!("[FF-SIZE] calculating sizes for {} sources", sources.len());
    }
    let sizer = DirectorySizer::new(SizerConfig::from(&config.scanner));
    let items = sizer.measure_sources(&sources);

    if let Some(log) = activity.as_deref_mut() {
        let mut entry = LogEntry::new(EventType::SizingComplete, Severity::Info);
        entry.item_count = Some(items.len());
        entry.total_bytes = Some(total_size(&items));
        entry.duration_ms = Some(elapsed_ms(start.elapsed()));
        log.write_entry(&entry);
    }

    let selection = Selector::from_config(&config.selection).select(&items, capacity);

    if cli.verbose {
        let report = &selection.report;
        if report.everything_fits {
            eprintln!("[FF-SELECT] all sources fit; no optimization needed");
        } else {
            eprintln!(
                "[FF-SELECT] divisor={} scaled_capacity={} scaled_optimum={} reconstructed={}",
                report.divisor, report.scaled_capacity, report.scaled_optimum, report.reconstructed
            );
            if !report.removed_by_repair.is_empty() {
                eprintln!(
                    "[FF-SELECT] repair removed {} item(s): {}",
                    report.removed_by_repair.len(),
                    report.removed_by_repair.join(", ")
                );
            }
            if !report.added_by_backfill.is_empty() {
                eprintln!(
                    "[FF-SELECT] backfill added {} item(s): {}",
                    report.added_by_backfill.len(),
                    report.added_by_backfill.join(", ")
                );
            }
        }
    }

    let elapsed = start.elapsed();
    if let Some(log) = activity {
        let (event, severity) = if selection.is_empty() {
            (EventType::SelectionInfeasible, Severity::Warning)
        } else {
            (EventType::SelectionComplete, Severity::Info)
        };
        let mut entry = LogEntry::new(event, severity);
        entry.item_count = Some(selection.items.len());
        entry.capacity = Some(capacity);
        entry.total_bytes = Some(selection.total());
        entry.free_bytes = Some(selection.free_space());
        entry.divisor = Some(selection.report.divisor);
        entry.duration_ms = Some(elapsed_ms(elapsed));
        entry.config_hash = config.stable_hash().ok();
        log.write_entry(&entry);
    }

    Ok(RunSummary {
        items,
        selection,
        elapsed,
    })
}

fn print_human(cli: &Cli, summary: &RunSummary) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    let selection = &summary.selection;

    if cli.verbose {
        for (name, size) in &summary.items {
            writeln!(out, "{name} - {}", format_size(*size))?;
        }
        writeln!(
            out,
            "\nTotal source size: {} ({} files)",
            format_size(total_size(&summary.items)),
            summary.items.len()
        )?;
        writeln!(out, "Total target size: {}\n", format_size(selection.capacity))?;
    }

    if selection.is_empty() {
        writeln!(out, "{}", "No selection possible".yellow().bold())?;
        return Ok(());
    }

    if cli.verbose {
        writeln!(out, "{}", "Selected:".bold())?;
    }
    for (name, size) in &selection.items {
        writeln!(out, "{name} - {}", format_size(*size))?;
    }
    writeln!(
        out,
        "\nSelection size: {} / {}",
        format_size(selection.total()),
        format_size(selection.capacity)
    )?;
    writeln!(
        out,
        "{} {}",
        "Free space:".bold(),
        format_size(selection.free_space())
    )?;
    writeln!(out, "\nFinished in: {}", format_elapsed(summary.elapsed))?;
    Ok(())
}

fn summary_json(summary: &RunSummary) -> Value {
    let selection = &summary.selection;
    let selected: Vec<Value> = selection
        .items
        .iter()
        .map(|(name, size)| json!({ "name": name, "size_bytes": size }))
        .collect();

    json!({
        "command": "fit",
        "capacity_bytes": selection.capacity,
        "source_count": summary.items.len(),
        "source_bytes": total_size(&summary.items),
        "feasible": !selection.is_empty(),
        "selected": selected,
        "selected_bytes": selection.total(),
        "free_bytes": selection.free_space(),
        "elapsed_seconds": summary.elapsed.as_secs_f64(),
        "report": selection.report,
    })
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{:.2}ms", elapsed.as_secs_f64() * 1_000.0)
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("FOLDERFIT_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folderfit::select::SelectionReport;

    fn items(pairs: &[(&str, u64)]) -> ItemSizes {
        pairs
            .iter()
            .map(|(name, size)| ((*name).to_string(), *size))
            .collect()
    }

    #[test]
    fn parses_sources_and_size() {
        let cli = Cli::try_parse_from(["folderfit", "a", "b", "--size=4.7GB", "-v"]).unwrap();
        assert_eq!(cli.sources, vec!["a", "b"]);
        assert_eq!(cli.size.as_deref(), Some("4.7GB"));
        assert!(cli.verbose);

        let short = Cli::try_parse_from(["folderfit", "-s", "700MB", "*"]).unwrap();
        assert_eq!(short.sources, vec!["*"]);
        assert_eq!(short.size.as_deref(), Some("700MB"));
    }

    #[test]
    fn parses_output_flags() {
        let cli = Cli::try_parse_from([
            "folderfit",
            "--config",
            "/tmp/folderfit.toml",
            "--json",
            "--no-color",
            "dir",
            "--size",
            "1GB",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(cli.no_color);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/folderfit.toml")));
    }

    #[test]
    fn missing_size_is_user_error() {
        let cli = Cli::try_parse_from(["folderfit", "dir"]).unwrap();
        let err = fit(&cli, &Config::default(), None).err().expect("should fail");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("FF-1101"));
    }

    #[test]
    fn zero_size_is_rejected_before_sizing() {
        let cli = Cli::try_parse_from(["folderfit", "a", "--size=0"]).unwrap();
        let err = fit(&cli, &Config::default(), None).err().expect("should fail");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn no_sources_is_user_error() {
        let cli = Cli::try_parse_from(["folderfit", "--size=1KB"]).unwrap();
        let err = fit(&cli, &Config::default(), None).err().expect("should fail");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("FF-1102"));
    }

    #[test]
    fn exit_codes_follow_error_class() {
        let runtime = CliError::from(FitError::MissingConfig {
            path: PathBuf::from("/x"),
        });
        assert_eq!(runtime.exit_code(), 2);
        assert_eq!(CliError::from(io::Error::other("pipe")).exit_code(), 2);
    }

    #[test]
    fn summary_json_reports_selection() {
        let all = items(&[("a", 1_024), ("b", 4_048), ("c", 2_048)]);
        let selection = Selection {
            items: items(&[("a", 1_024), ("b", 4_048)]),
            capacity: 5_072,
            report: SelectionReport::default(),
        };
        let payload = summary_json(&RunSummary {
            items: all,
            selection,
            elapsed: Duration::from_millis(3),
        });

        assert_eq!(payload["feasible"], true);
        assert_eq!(payload["selected_bytes"], 5_072);
        assert_eq!(payload["free_bytes"], 0);
        assert_eq!(payload["source_bytes"], 7_120);
        assert_eq!(payload["selected"].as_array().unwrap().len(), 2);
        assert_eq!(payload["selected"][0]["name"], "a");
    }

    #[test]
    fn summary_json_flags_infeasible() {
        let payload = summary_json(&RunSummary {
            items: ItemSizes::new(),
            selection: Selection {
                items: ItemSizes::new(),
                capacity: 100,
                report: SelectionReport::default(),
            },
            elapsed: Duration::ZERO,
        });
        assert_eq!(payload["feasible"], false);
        assert_eq!(payload["free_bytes"], 100);
    }

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(
            resolve_output_mode(true, Some("human"), true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode(false, Some("json"), true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode(false, Some("human"), false),
            OutputMode::Human
        );
        assert_eq!(
            resolve_output_mode(false, Some("auto"), true),
            OutputMode::Human
        );
        assert_eq!(resolve_output_mode(false, None, false), OutputMode::Json);
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::from_millis(1_500)), "1.50s");
        assert_eq!(format_elapsed(Duration::from_micros(2_500)), "2.50ms");
    }
}
