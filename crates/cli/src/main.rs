mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::{cmd_eval, cmd_list, cmd_report, cmd_snapshot, cmd_stats, cmd_validate};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Rule activation and boundary-case toolchain.
#[derive(Parser)]
#[command(name = "brief", version, about = "Rule activation and boundary-case toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to the rule definition document
    #[arg(long, global = true, default_value = "rules/corpus.json")]
    rules: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the loaded rules
    List,

    /// Evaluate one rule (by id or name), or every active rule, against a case
    Eval {
        /// Rule id or name; omit to evaluate all active rules
        rule: Option<String>,
        /// Path to the case JSON object (variable name to value)
        #[arg(long)]
        env: PathBuf,
        /// Show the outcome of every leaf (requires a rule)
        #[arg(long)]
        trace: bool,
    },

    /// Synthesize boundary cases for every active rule and write a snapshot
    Snapshot {
        /// Snapshot file to write, or to verify with --check
        #[arg(long, default_value = "rules/cases.json")]
        out: PathBuf,
        /// Verify an existing snapshot instead of writing one
        #[arg(long)]
        check: bool,
    },

    /// Print corpus coverage totals
    Stats,

    /// Render the per-rule coverage report as markdown
    Report {
        /// Write the report to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Validate a rule definition document against the JSON Schema
    Validate {
        /// Path to the rule definition document
        file: PathBuf,
    },
}

fn init_logging(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env("BRIEF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Commands::List => cmd_list(&cli.rules, cli.output, cli.quiet),
        Commands::Eval { rule, env, trace } => {
            cmd_eval(&cli.rules, rule.as_deref(), &env, trace, cli.output, cli.quiet);
        }
        Commands::Snapshot { out, check } => {
            cmd_snapshot(&cli.rules, &out, check, cli.output, cli.quiet);
        }
        Commands::Stats => cmd_stats(&cli.rules, cli.output, cli.quiet),
        Commands::Report { out } => cmd_report(&cli.rules, out.as_deref(), cli.output, cli.quiet),
        Commands::Validate { file } => cmd_validate(&file, cli.output, cli.quiet),
    }
}

/// Report an error message in the appropriate format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
