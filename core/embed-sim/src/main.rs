//! embed-sim: CLI host simulator for the Flowdeck embed handshake.
//!
//! Plays the vendor Host against the guest engine and prints the guest's
//! outbound events as JSON lines, so vendor integrations can be exercised
//! without a browser.
//!
//! ## Subcommands
//!
//! - `url`: run the URL-parameter initialization path from a query string
//! - `sdk`: run the SDK path, reading `VENDOR_*` events as JSONL from stdin

mod driver;

use std::io::BufRead;

use clap::{Parser, Subcommand};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use driver::{ScriptedHost, StubExchanger, Verbosity};
use embed_core::session::{FileSessionStore, MemorySessionStore, SessionStore};
use flowdeck_embed_protocol::VendorEvent;

#[derive(Parser)]
#[command(name = "embed-sim")]
#[command(about = "Flowdeck embed handshake simulator")]
#[command(version)]
struct Cli {
    /// Project id the stub exchanger assigns to new sessions
    #[arg(long, default_value = "proj-sim", global = true)]
    project_id: String,

    /// Make every token exchange fail
    #[arg(long, global = true)]
    fail_auth: bool,

    /// Persist sessions to the default file store instead of memory
    #[arg(long, global = true)]
    persist: bool,

    /// Print every executed action instead of only outbound events
    #[arg(long, global = true)]
    show_actions: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize from a query string (URL-parameter path)
    Url {
        /// The iframe search string, e.g. "?apToken=xyz&hideSidebar=true"
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Initialize via the SDK handshake; reads vendor events from stdin
    Sdk,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let exchanger = StubExchanger {
        project_id: cli.project_id.clone(),
        fail: cli.fail_auth,
    };
    let verbosity = if cli.show_actions {
        Verbosity::AllActions
    } else {
        Verbosity::OutboundOnly
    };

    let result = if cli.persist {
        match FileSessionStore::default_location() {
            Ok(store) => run(cli.command, ScriptedHost::new(exchanger, store, verbosity)),
            Err(err) => {
                error!(error = %err, "Failed to open the session store");
                std::process::exit(1);
            }
        }
    } else {
        run(
            cli.command,
            ScriptedHost::new(exchanger, MemorySessionStore::new(), verbosity),
        )
    };

    if let Err(err) = result {
        error!(error = %err, "embed-sim failed");
        std::process::exit(1);
    }
}

fn run<S: SessionStore>(command: Commands, mut sim: ScriptedHost<S>) -> Result<(), String> {
    match command {
        Commands::Url { query } => {
            sim.start(&query)?;
            flush(&mut sim);
        }
        Commands::Sdk => {
            sim.start("")?;
            flush(&mut sim);
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = line.map_err(|e| e.to_string())?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<VendorEvent>(&line) {
                    Ok(event) => sim.deliver(event)?,
                    // Unrecognized messages are a no-op, as in the guest.
                    Err(err) => warn!(error = %err, "Ignoring unparseable vendor event"),
                }
                flush(&mut sim);
            }
        }
    }

    tracing::info!(
        phase = sim.engine().phase().as_str(),
        location = sim.location().unwrap_or("-"),
        embedded = sim.state().state().is_embedded,
        "Simulation finished"
    );
    Ok(())
}

fn flush<S: SessionStore>(sim: &mut ScriptedHost<S>) {
    for line in sim.take_lines() {
        println!("{}", line);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
