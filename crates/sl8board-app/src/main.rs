//! Main application entry point.

use clap::{Parser, Subcommand};
use sl8board_app::{AppResult, commands};
use sl8board_core::BoardConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "sl8board", about = "SL8 whiteboard gesture replay and session manager")]
struct Cli {
    /// JSON config file.
    #[arg(long, env = "SL8BOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a gesture script and print the resulting board.
    Replay {
        script: PathBuf,
        /// Save the result as a session with this title.
        #[arg(long)]
        save: Option<String>,
    },
    /// List saved sessions.
    List,
    /// Load a session and print its contents.
    Load { id: String },
    /// Delete a saved session.
    Delete { id: String },
}

fn run(cli: Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => BoardConfig::from_file(path)?,
        None => BoardConfig::default(),
    };
    let storage = commands::open_storage(&config)?;

    match cli.command {
        Command::Replay { script, save } => {
            let outcome = pollster::block_on(commands::replay(
                &config,
                &script,
                save.as_deref(),
                &storage,
            ))?;
            println!("{}", outcome.summary);
            if let Some(id) = outcome.saved_as {
                println!("saved session {}", id);
            }
        }
        Command::List => {
            let sessions = pollster::block_on(commands::list(&storage))?;
            if sessions.is_empty() {
                println!("no saved sessions");
            }
            for session in sessions {
                println!("{}  {}  (updated {})", session.id, session.title, session.updated_at);
            }
        }
        Command::Load { id } => {
            let summary = pollster::block_on(commands::load(&config, &storage, &id))?;
            println!("{}", summary);
        }
        Command::Delete { id } => {
            pollster::block_on(commands::delete(&storage, &id))?;
            println!("deleted {}", id);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
