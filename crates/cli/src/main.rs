//! mathtier CLI — the main entry point.
//!
//! Commands:
//! - `onboard`    — Create config and data directories, register a learner
//! - `practice`   — Run an adaptive practice session
//! - `tiers`      — Show a learner's tiers, bands, and next milestones
//! - `milestones` — List the milestone reward table
//! - `status`     — Show configuration and store status

use clap::{Parser, Subcommand};
use mathtier_core::Operation;

mod commands;

#[derive(Parser)]
#[command(
    name = "mathtier",
    about = "mathtier — adaptive arithmetic practice",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and register a learner
    Onboard {
        /// Learner to register
        #[arg(short, long, env = "MATHTIER_USER")]
        user: Option<String>,
    },

    /// Practice one operation
    Practice {
        /// addition, subtraction, multiplication, or division
        #[arg(default_value = "addition")]
        operation: Operation,

        /// Learner id
        #[arg(short, long, env = "MATHTIER_USER")]
        user: Option<String>,

        /// Questions before the session ends
        #[arg(short = 'n', long, default_value_t = 20)]
        questions: u32,

        /// Practice tier-1 questions without a learner profile
        #[arg(long)]
        anonymous: bool,
    },

    /// Show a learner's tiers
    Tiers {
        /// Learner id
        #[arg(short, long, env = "MATHTIER_USER")]
        user: Option<String>,
    },

    /// List milestone rewards
    Milestones,

    /// Show system status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard { user } => commands::onboard::run(user).await?,
        Commands::Practice {
            operation,
            user,
            questions,
            anonymous,
        } => {
            if anonymous {
                commands::practice::run_anonymous(operation, questions).await?
            } else {
                commands::practice::run(operation, user, questions).await?
            }
        }
        Commands::Tiers { user } => commands::tiers::run(user).await?,
        Commands::Milestones => commands::tiers::milestones(),
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
