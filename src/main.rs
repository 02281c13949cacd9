// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use lingorelay::app_config::{Config, LogLevel};
use lingorelay::pipeline::{CancellationFlag, TranslationPipeline};
use lingorelay::segment::{Segment, StyleParams, TranslationMode};

/// CLI wrapper for TranslationMode to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Generic,
    Subtitles,
    Dialogue,
    Marketing,
}

impl From<CliMode> for TranslationMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Generic => TranslationMode::Generic,
            CliMode::Subtitles => TranslationMode::Subtitles,
            CliMode::Dialogue => TranslationMode::Dialogue,
            CliMode::Marketing => TranslationMode::Marketing,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a segment file through the engine pipeline (default command)
    #[command(alias = "translate")]
    Translate(TranslateArgs),

    /// Generate shell completions for lingorelay
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input JSON file: an array of strings or of {index, source_text}
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Target language code (e.g. 'fr', 'de', 'spa')
    #[arg(short, long)]
    target_language: String,

    /// Translation mode
    #[arg(short, long, value_enum, default_value = "generic")]
    mode: CliMode,

    /// Sub-style refinement within the mode
    #[arg(long)]
    sub_style: Option<String>,

    /// Allow the engine to rephrase freely
    #[arg(long)]
    rephrase: bool,

    /// Extra instruction appended to the prompt (repeatable)
    #[arg(long = "inject", value_name = "INSTRUCTION")]
    injections: Vec<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Override the number of concurrent batch workers
    #[arg(long)]
    concurrency: Option<usize>,

    /// Escalate through the two-engine committee instead of single repair
    #[arg(long)]
    committee: bool,

    /// Probe engine connectivity and exit
    #[arg(long)]
    check: bool,

    /// Output file for the translated strings (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the full run report (results, metrics, trace) as JSON
    #[arg(long, value_name = "REPORT_PATH")]
    report: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// lingorelay - resilient multi-engine translation dispatch
///
/// Splits ordered text segments into token-bounded batches, dispatches
/// them concurrently to interchangeable AI engines, validates the 1:1
/// index contract, enforces linguistic invariants and escalates
/// low-quality results to a secondary engine or a committee.
#[derive(Parser, Debug)]
#[command(name = "lingorelay")]
#[command(version)]
#[command(about = "Resilient multi-engine translation dispatch")]
#[command(long_about = "lingorelay translates ordered segment files through remote AI engines.

EXAMPLES:
    lingorelay segments.json -t fr                 # Translate to French
    lingorelay segments.json -t de -m subtitles    # Subtitle mode, stricter fidelity
    lingorelay segments.json -t es --committee     # Committee escalation
    lingorelay segments.json -t fr --check         # Probe configured engines
    lingorelay completions bash > lingorelay.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different file with --config. If the config file doesn't exist, a
    default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input JSON file: an array of strings or of {index, source_text}
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Target language code (e.g. 'fr', 'de', 'spa')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Translation mode
    #[arg(short, long, value_enum, default_value = "generic")]
    mode: CliMode,

    /// Sub-style refinement within the mode
    #[arg(long)]
    sub_style: Option<String>,

    /// Allow the engine to rephrase freely
    #[arg(long)]
    rephrase: bool,

    /// Extra instruction appended to the prompt (repeatable)
    #[arg(long = "inject", value_name = "INSTRUCTION")]
    injections: Vec<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Override the number of concurrent batch workers
    #[arg(long)]
    concurrency: Option<usize>,

    /// Escalate through the two-engine committee instead of single repair
    #[arg(long)]
    committee: bool,

    /// Probe engine connectivity and exit
    #[arg(long)]
    check: bool,

    /// Output file for the translated strings (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the full run report (results, metrics, trace) as JSON
    #[arg(long, value_name = "REPORT_PATH")]
    report: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

impl CommandLineOptions {
    /// Build translate args from the top-level (default command) options
    fn into_translate_args(self) -> Result<TranslateArgs> {
        let input_path = self
            .input_path
            .ok_or_else(|| anyhow!("Missing input path; see --help"))?;
        let target_language = self
            .target_language
            .ok_or_else(|| anyhow!("Missing --target-language; see --help"))?;

        Ok(TranslateArgs {
            input_path,
            target_language,
            mode: self.mode,
            sub_style: self.sub_style,
            rephrase: self.rephrase,
            injections: self.injections,
            config_path: self.config_path,
            concurrency: self.concurrency,
            committee: self.committee,
            check: self.check,
            output: self.output,
            report: self.report,
            log_level: self.log_level,
        })
    }
}

/// Minimal stderr logger honoring the configured level
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let prefix = match record.level() {
                Level::Error => "ERROR",
                Level::Warn => "WARN ",
                Level::Info => "INFO ",
                Level::Debug => "DEBUG",
                Level::Trace => "TRACE",
            };
            eprintln!("{} {}", prefix, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn install_logger(level: LogLevel) -> Result<()> {
    let filter = level.to_level_filter();
    log::set_boxed_logger(Box::new(StderrLogger { level: filter }))
        .map_err(|e| anyhow!("Failed to install logger: {}", e))?;
    log::set_max_level(filter);
    Ok(())
}

/// Load the config file, creating a default one when missing
fn load_or_create_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::from_file(path)
    } else {
        let config = Config::default();
        config.save_to_file(path)?;
        warn!("Config file {} not found, wrote defaults", path);
        Ok(config)
    }
}

/// Read the input segments: either plain strings or full segment objects
fn read_segments(path: &Path) -> Result<Vec<Segment>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading input file {:?}", path))?;

    if let Ok(segments) = serde_json::from_str::<Vec<Segment>>(&content) {
        return Ok(segments);
    }

    let texts: Vec<String> = serde_json::from_str(&content)
        .with_context(|| format!("parsing input file {:?} as a JSON string array", path))?;
    Ok(texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Segment::new(index, text))
        .collect())
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let mut config = load_or_create_config(&args.config_path)?;

    if let Some(concurrency) = args.concurrency {
        config.pipeline.concurrency = Some(concurrency);
    }
    if args.committee {
        config.pipeline.committee = true;
    }

    let log_level = args.log_level.map(LogLevel::from).unwrap_or(config.log_level);
    install_logger(log_level)?;

    let pipeline = TranslationPipeline::new(config)?;

    if args.check {
        let mut failures = 0;
        for (name, result) in pipeline.check_engines().await {
            match result {
                Ok(()) => println!("{:<12} ok", name),
                Err(e) => {
                    failures += 1;
                    println!("{:<12} FAILED: {}", name, e);
                }
            }
        }
        if failures > 0 {
            return Err(anyhow!("{} engine(s) unreachable", failures));
        }
        return Ok(());
    }

    let segments = read_segments(&args.input_path)?;
    if segments.is_empty() {
        warn!("Input file contains no segments");
        match &args.output {
            Some(path) => std::fs::write(path, "[]")
                .with_context(|| format!("writing output file {:?}", path))?,
            None => println!("[]"),
        }
        return Ok(());
    }

    let mut style = StyleParams::new(args.mode.into(), args.target_language.clone())
        .with_rephrase(args.rephrase);
    if let Some(sub_style) = args.sub_style {
        style = style.with_sub_style(sub_style);
    }
    for injection in args.injections {
        style = style.with_injection(injection);
    }

    // Ctrl-C requests cancellation; in-flight batches finish on their own
    let cancel = CancellationFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Cancellation requested, draining in-flight batches");
                cancel.cancel();
            }
        });
    }

    let progress = ProgressBar::new(segments.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let bar = progress.clone();
    let report = pipeline
        .run(&segments, &style, cancel, move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        })
        .await?;
    progress.finish_and_clear();

    let output_json = serde_json::to_string_pretty(&report.outputs)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, output_json)
                .with_context(|| format!("writing output file {:?}", path))?;
            info!("Wrote {} translations to {:?}", report.outputs.len(), path);
        }
        None => println!("{}", output_json),
    }

    if let Some(report_path) = &args.report {
        let report_json = serde_json::to_string_pretty(&report)?;
        std::fs::write(report_path, report_json)
            .with_context(|| format!("writing report file {:?}", report_path))?;
        info!("Wrote run report to {:?}", report_path);
    }

    if report.metrics.failed > 0 {
        warn!(
            "{} segment(s) carry failure sentinels; see the report for details",
            report.metrics.failed
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut options = CommandLineOptions::parse();

    match options.command.take() {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            if options.input_path.is_none() {
                CommandLineOptions::command().print_help()?;
                return Ok(());
            }
            run_translate(options.into_translate_args()?).await
        }
    }
}
