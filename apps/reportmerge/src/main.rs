use anyhow::{Context, Result};
use clap::Parser;
use reportmerge_config::{MergeConfig, load_config};
use reportmerge_engine::{EngineError, MergeOutputs, merge_html_reports};
use reportmerge_error::Categorized;
use reportmerge_logging::{LogFormat, LoggingConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "reportmerge", version)]
#[command(about = "Merge HTML test-report bundles into a single report.", long_about = None)]
struct Cli {
    /// Report bundle directories, merged in the order given.
    #[arg(value_name = "INPUT_REPORT_PATHS")]
    inputs: Vec<PathBuf>,

    /// Output folder name [default: merged-html-report]
    #[arg(short, long, value_name = "NAME")]
    output: Option<String>,

    /// Directory the output folder is created in [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    base_path: Option<PathBuf>,

    /// Replace the output folder if it already exists.
    #[arg(long)]
    overwrite: bool,

    /// Debug logging, including the merged aggregate.
    #[arg(long)]
    debug: bool,

    /// JSON or YAML config file; flags override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// plain, json or compact
    #[arg(long, value_name = "FMT")]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn merge_config(&self) -> Result<MergeConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path).with_context(|| format!("load config {path:?}"))?,
            None => MergeConfig::default(),
        };
        if let Some(name) = &self.output {
            config.output_folder_name = name.clone();
        }
        if let Some(base) = &self.base_path {
            config.output_base_path = base.clone();
        }
        config.overwrite_existing |= self.overwrite;
        config.debug |= self.debug;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error merging reports: {err:#}");
            exit_code(&err)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.merge_config()?;

    let mut logging = LoggingConfig::for_debug(config.debug);
    if let Some(format) = cli.log_format {
        logging = logging.with_format(format);
    }
    reportmerge_logging::init(&logging);
    tracing::debug!(?config, "resolved configuration");

    let outputs = merge_html_reports(&cli.inputs, &config)?;
    print_summary(&outputs);
    Ok(())
}

fn print_summary(outputs: &MergeOutputs) {
    let n = outputs.bundles_merged;
    println!(
        "Successfully merged {n} report{}",
        if n == 1 { "" } else { "s" }
    );
    println!("wrote:");
    println!("- {}", outputs.index_html.display());
    println!(
        "{} tests in {} files ({} unexpected, {} flaky, {} skipped)",
        outputs.total_tests,
        outputs.file_reports,
        outputs.stats.unexpected,
        outputs.stats.flaky,
        outputs.stats.skipped
    );
}

/// Merge failures exit with their category's code; anything else with 1.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    let code = err
        .downcast_ref::<EngineError>()
        .map_or(1, |e| e.exit_code());
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
