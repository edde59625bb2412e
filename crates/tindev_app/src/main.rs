//! tindev: command-line front end for the Tindev client.
//! Reads config, keeps the session in local storage, lists candidates,
//! likes/dislikes them and prints realtime matches.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tindev_app::commands;
use tindev_app::{logging, AppError};
use tindev_client::Action;

#[derive(Debug, Parser)]
#[command(name = "tindev", version, about = "Swipe through developers from the terminal")]
struct Cli {
    /// Config file (default: $TINDEV_CONFIG, then ~/.tindev/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register or look up a developer by GitHub handle and store the session
    Login { handle: String },
    /// Forget the stored session
    Logout,
    /// Print the stored user id
    Whoami,
    /// List candidates, top card first
    Queue {
        /// Print the screen view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Like a candidate (default: the top card)
    Like { id: Option<String> },
    /// Dislike a candidate (default: the top card)
    Dislike { id: Option<String> },
    /// Print match notifications as they arrive
    Listen {
        /// Exit after this many matches
        #[arg(long)]
        count: Option<usize>,
    },
    /// Interactive swipe session reading commands from stdin
    Swipe,
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let cfg = commands::load_config(cli.config.as_deref())?;
    let store = commands::open_store(&cfg)?;
    let stdout = io::stdout();

    match cli.command {
        Command::Login { handle } => {
            let session = commands::do_login(&cfg, &store, &handle).await?;
            println!("Logged in as {}", session.user_id());
        }
        Command::Logout => {
            commands::do_logout(&store)?;
            println!("Logged out");
        }
        Command::Whoami => {
            let session = commands::do_whoami(&store)?;
            println!("{}", session.user_id());
        }
        Command::Queue { json } => {
            let view = commands::do_queue(&cfg, &store).await?;
            let mut out = stdout.lock();
            if json {
                let text = serde_json::to_string_pretty(&view)?;
                writeln!(out, "{}", text)?;
            } else {
                commands::render_queue(&mut out, &view)?;
            }
        }
        Command::Like { id } => {
            let name = commands::do_judge(&cfg, &store, Action::Like, id.as_deref()).await?;
            println!("Liked {}", name);
        }
        Command::Dislike { id } => {
            let name = commands::do_judge(&cfg, &store, Action::Dislike, id.as_deref()).await?;
            println!("Disliked {}", name);
        }
        Command::Listen { count } => {
            let mut out = stdout.lock();
            commands::run_listen(&cfg, &store, &mut out, count, interrupted()).await?;
        }
        Command::Swipe => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut out = stdout.lock();
            commands::run_swipe(&cfg, &store, input, &mut out, interrupted()).await?;
        }
    }
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Events are handled one at a time on a single thread.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to create runtime: {}", e);
            process::exit(1);
        });

    if let Err(e) = rt.block_on(run(cli)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
