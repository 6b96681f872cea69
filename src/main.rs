use clap::{Parser, Subcommand};
use git_line_blame::commands::*;
use git_line_blame::core::{
    error::{BlameError, Result},
    print_error,
};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-line-blame")]
#[command(about = "Per-line git authorship, kept in sync with the buffer")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Date format for commits older than five days (e.g. "YYYY-MM-DD")
    #[arg(long, global = true)]
    date_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who last changed each line of a file
    Blame {
        file: PathBuf,
        /// Only show this line (1-based)
        #[arg(short, long)]
        line: Option<usize>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the commit that last changed a line
    Show {
        file: PathBuf,
        /// Line number (1-based)
        line: usize,
    },
    /// Print the web URL of the commit that last changed a line
    Link {
        file: PathBuf,
        /// Line number (1-based)
        line: usize,
    },
    /// Print the short hash of the commit that last changed a line
    Hash {
        file: PathBuf,
        /// Line number (1-based)
        line: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logging based on --debug flag
    if cli.debug {
        env::set_var("RUST_LOG", "debug");
    } else {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let date_format = cli.date_format.as_deref();
    let result = match &cli.command {
        Commands::Blame { file, line, json } => {
            execute_blame(file, *line, *json, date_format).await
        }
        Commands::Show { file, line } => execute_show(file, *line, date_format).await,
        Commands::Link { file, line } => execute_link(file, *line).await,
        Commands::Hash { file, line } => execute_hash(file, *line).await,
    };

    if let Err(e) = result {
        if let BlameError::NotInGitRepo = e {
            print_error("Not in a git repository");
        } else {
            print_error(&e.to_string());
        }
        std::process::exit(1);
    }

    Ok(())
}
