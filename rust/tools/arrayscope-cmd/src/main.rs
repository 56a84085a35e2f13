use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "arrayscope-cmd")]
#[command(about = "Command-line utility for inspecting growable array buffers")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v for layout details, -vv for allocation tracing)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a buffer from the given values and print its header and elements
    Inspect {
        /// Comma-separated element values
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "1,2,3")]
        values: Vec<i64>,

        /// Initial capacity (defaults to the number of values)
        #[arg(short, long)]
        capacity: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Append a run of values and report every capacity change
    Grow {
        /// Number of values to append
        #[arg(short, long)]
        appends: usize,

        /// Initial capacity
        #[arg(short, long, default_value_t = 0)]
        capacity: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    match cli.command {
        Commands::Inspect {
            values,
            capacity,
            format,
        } => commands::inspect::run(cli.verbose, values, capacity, format),
        Commands::Grow { appends, capacity } => commands::grow::run(appends, capacity),
    }
}
