//! Templar: reconcile network templates between a repository and the Lab
//! and Prod controllers.
//!
//! # Usage
//!
//! ```text
//! templar inventory
//! templar status  [NAME...]
//! templar publish [NAME...]
//! templar push --env lab|prod [NAME...]
//! templar list [--json] [--html <PATH>]
//! templar --templates <DIR> list --html <PATH>
//! ```
//!
//! An empty NAME list selects every template in the record store.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    action::{NamesArgs, PushArgs},
    list::ListArgs,
};
use templar_sync::Action;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "templar",
    version,
    about = "Keep configuration templates in sync across GitHub and DNA Center",
    long_about = None,
)]
struct Cli {
    /// Configuration file (default: ~/.templar/config.yaml).
    #[arg(long, global = true, env = "TEMPLAR_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of template overrides (default: ~/.templar/templates).
    #[arg(long, global = true, env = "TEMPLAR_TEMPLATES", value_name = "DIR")]
    templates: Option<PathBuf>,

    /// Do not forward the outcome message to the notification webhook.
    #[arg(long, global = true)]
    no_notify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record every Lab template the record store does not know yet.
    Inventory,

    /// Compare repository content with Lab and Prod and store the result.
    Status(NamesArgs),

    /// Stage Lab content on the development branch and open a pull request.
    Publish(NamesArgs),

    /// Create or update templates on a controller from the repository.
    Push(PushArgs),

    /// Show the template listing.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let ctx = commands::Invocation {
        config: cli.config,
        templates: cli.templates,
        notify: !cli.no_notify,
    };
    match cli.command {
        Commands::Inventory => commands::action::run(&ctx, Action::Inventory, Vec::new()),
        Commands::Status(args) => commands::action::run(&ctx, Action::Status, args.names),
        Commands::Publish(args) => commands::action::run(&ctx, Action::Publish, args.names),
        Commands::Push(args) => {
            commands::action::run(&ctx, Action::Push(args.env.into()), args.names)
        }
        Commands::List(args) => args.run(&ctx),
    }
}
