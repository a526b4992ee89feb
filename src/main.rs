use anyhow::Result;
use chat_role_audit::archive::extractor::DEFAULT_TARGET_KEY;
use chat_role_audit::{commands, utils};
use clap::{CommandFactory, Parser, Subcommand};
use std::num::NonZeroUsize;

#[derive(Parser)]
#[command(name = "chat-role-audit")]
#[command(about = "Chat export role auditing tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug details (per-field skips, worker activity)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract distinct user/role associations into a CSV report
    ///
    /// Every input is a file path or glob pattern. Only regular files ending
    /// in .json (any case) are processed; anything else is skipped with a
    /// warning.
    ExtractRoles {
        /// Export files or glob patterns (e.g. "exports/*.json")
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output CSV file path
        #[arg(short, long, default_value = "output.csv")]
        output: String,

        /// Top-level field holding the message array
        #[arg(long, default_value = DEFAULT_TARGET_KEY)]
        target_key: String,

        /// Number of files processed concurrently (default: one per CPU)
        #[arg(short, long)]
        jobs: Option<NonZeroUsize>,

        /// Order rows by user and role id
        #[arg(long)]
        sort: bool,
    },

    /// Generate shell completion scripts
    GenerateCompletion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::ExtractRoles {
            inputs,
            output,
            target_key,
            jobs,
            sort,
        } => commands::extract_roles::run(
            &inputs,
            &output,
            &target_key,
            jobs.map(NonZeroUsize::get),
            sort,
        )
        .map(|_| ()),
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "chat-role-audit", &mut std::io::stdout());
            Ok(())
        }
    }
}
