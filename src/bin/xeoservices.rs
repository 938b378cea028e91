//! CLI binary for xeoservices.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ServicesConfig`, runs one command and reports where its log went.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use xeoservices::config::{
    default_logs_dir, DEFAULT_CONVERSION_TYPE, DEFAULT_CONVERTER_URL, DEFAULT_STORAGE_URL,
};
use xeoservices::{
    check_health_to_log, check_process_to_log, convert_ifc_to_xkt_to_log, create_clients,
    ProgressCallback, ServicesConfig, WorkflowProgress, WorkflowStep, WrittenLog,
    ACCESS_TOKEN_ENV,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner: one line per finished step, spinner on the running one.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl WorkflowProgress for CliProgress {
    fn on_step_start(&self, step: WorkflowStep) {
        self.bar.set_message(format!("{step}…"));
    }

    fn on_step_complete(&self, step: WorkflowStep) {
        self.bar.println(format!("  {} {}", green("✓"), step));
    }

    fn on_step_error(&self, step: WorkflowStep, error: &str) {
        // Keep the step line short; the full error is printed on exit.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), step, dim(&msg)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Check that both services are up
  xeoservices health

  # Upload an IFC model and start an IFC→XKT conversion
  xeoservices convert-ifc-xkt --input ./models/tower.ifc

  # Check the conversion later, using the process id from the convert log
  xeoservices check-process --process 66f1c2a9e4b0

LOG FILES (written to --logs-dir, default: logs/ next to the executable):
  health                   health.log.json
  convert-ifc-xkt          <model name>-convert-request.log.json
  check-process            <process id>-process-status.log.json

ENVIRONMENT VARIABLES:
  XEO_SERVICES_ACCESS_TOKEN  Bearer token for both services (required)
  XEO_STORAGE_URL            Storage service base URL
  XEO_CONVERTER_URL          Converter service base URL
  XEO_LOGS_DIR               Directory for JSON log files
  XEO_CONVERSION_TYPE        Conversion type sent with convert-ifc-xkt
  RUST_LOG                   Log filter, e.g. xeoservices=debug
"#;

/// Upload IFC models to xeo storage and convert them to XKT.
#[derive(Parser, Debug)]
#[command(
    name = "xeoservices",
    version,
    about = "Upload IFC models to xeo storage and convert them to XKT",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Bearer token for the storage and converter services.
    #[arg(long, global = true, env = ACCESS_TOKEN_ENV, hide_env_values = true)]
    access_token: Option<String>,

    /// Storage service base URL.
    #[arg(long, global = true, env = "XEO_STORAGE_URL", default_value = DEFAULT_STORAGE_URL)]
    storage_url: String,

    /// Converter service base URL.
    #[arg(long, global = true, env = "XEO_CONVERTER_URL", default_value = DEFAULT_CONVERTER_URL)]
    converter_url: String,

    /// Directory for JSON log files [default: logs/ next to the executable].
    #[arg(long, global = true, env = "XEO_LOGS_DIR")]
    logs_dir: Option<PathBuf>,

    /// Print the written log record to stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "XEO_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "XEO_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "XEO_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check xeoservices health.
    Health,

    /// Convert IFC file to XKT format.
    #[command(name = "convert-ifc-xkt")]
    ConvertIfcXkt {
        /// IFC input file path.
        #[arg(short, long)]
        input: String,

        /// Conversion type sent to the converter.
        #[arg(long = "type", env = "XEO_CONVERSION_TYPE", default_value = DEFAULT_CONVERSION_TYPE)]
        kind: String,
    },

    /// Check process status by ID.
    CheckProcess {
        /// Id of the process to check.
        #[arg(short, long)]
        process: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out
    // of its way unless explicitly asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgress::new);
    let result = run(&cli, progress.clone().map(|p| p as ProgressCallback)).await;
    if let Some(ref p) = progress {
        p.finish();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", red("✘"));
            ExitCode::FAILURE
        }
    }
}

/// Run the selected command and report its log.
async fn run(cli: &Cli, progress: Option<ProgressCallback>) -> Result<()> {
    let config = build_config(cli, progress)?;
    let clients = create_clients(&config).context("Failed to configure HTTP clients")?;
    let logs_dir = &config.logs_dir;

    match &cli.command {
        Command::Health => {
            let written = check_health_to_log(&clients, logs_dir)
                .await
                .context("Health check failed")?;
            report(cli, &written)
        }
        Command::ConvertIfcXkt { input, .. } => {
            let written = convert_ifc_to_xkt_to_log(&clients, input, logs_dir)
                .await
                .with_context(|| format!("Conversion request for '{input}' failed"))?;
            report(cli, &written)
        }
        Command::CheckProcess { process } => {
            let written = check_process_to_log(&clients, process, logs_dir)
                .await
                .with_context(|| format!("Checking process '{process}' failed"))?;
            report(cli, &written)
        }
    }
}

/// Print the record (`--json`) or where it was written.
fn report<T: Serialize>(cli: &Cli, written: &WrittenLog<T>) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(&written.record)
            .context("Failed to serialise log record")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{} Output written to {}",
            green("✔"),
            bold(&written.path.display().to_string())
        );
    }
    Ok(())
}

/// Map CLI args to `ServicesConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ServicesConfig> {
    let mut builder = ServicesConfig::builder()
        .access_token(cli.access_token.clone().unwrap_or_default())
        .storage_url(&cli.storage_url)
        .converter_url(&cli.converter_url)
        .logs_dir(cli.logs_dir.clone().unwrap_or_else(default_logs_dir));

    if let Command::ConvertIfcXkt { kind, .. } = &cli.command {
        builder = builder.conversion_type(kind);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
