use clap::{Parser, Subcommand};
use eventdb_cli::commands::{inspect, latest, timeline, verify};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eventdb")]
#[command(about = "eventdb Forensic CLI - offline inspection of event log files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header, record count and tail status of a log
    Inspect {
        #[arg(default_value = "events.log")]
        log: PathBuf,
    },
    /// Verify every frame's checksum and id order
    Verify {
        #[arg(default_value = "events.log")]
        log: PathBuf,
    },
    /// List events in id order
    Timeline {
        log: PathBuf,

        /// Only events from this source
        #[arg(long, short)]
        source: Option<String>,

        /// Only events of this kind
        #[arg(long, short)]
        kind: Option<String>,
    },
    /// Print the latest payload for a source and kind
    Latest {
        log: PathBuf,
        source: String,
        kind: String,
    },
}

fn main() -> anyhow::Result<()> {
    println!(r#"
   ┌─┐┬  ┬┌─┐┌┐┌┌┬┐┌┬┐┌┐
   ├┤ └┐┌┘├┤ │││ │  ││├┴┐
   └─┘ └┘ └─┘┘└┘ ┴ ─┴┘└─┘

   eventdb Forensic Tool v0.1.0
    "#);

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { log } => inspect::run(&log),
        Commands::Verify { log } => verify::run(&log),
        Commands::Timeline { log, source, kind } => timeline::run(&log, source.as_deref(), kind.as_deref()),
        Commands::Latest { log, source, kind } => latest::run(&log, &source, &kind),
    }
}
