use anyhow::Result;
use clap::{Parser, Subcommand};
use habitloop_core::{EventKind, DEFAULT_WINDOW_DAYS};
use tracing_subscriber::EnvFilter;

mod config;
mod habits_cmd;
mod state;
mod store;

#[derive(Parser, Debug)]
#[command(
    name = "habitloop",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("HABITLOOP_BUILD_SHA"), ")"),
    about = "Track habits, streaks and grace days from the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default ~/.habitloop/config.toml
    Init,

    /// Create a habit
    Add(habits_cmd::AddArgs),

    /// Show every habit with due-today flag and streak
    #[command(alias = "list")]
    Status {
        /// Evaluate as of this time (RFC 3339, or "YYYY-MM-DD HH:MM" / "YYYY-MM-DD"
        /// in the config's default timezone)
        #[arg(long)]
        at: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Record a check-in and print the recomputed streak
    Checkin {
        /// Habit id or unique id prefix
        habit: String,

        /// Amount for count/duration goals
        #[arg(long)]
        value: Option<f64>,

        /// When it happened (default: now), in the habit's timezone
        #[arg(long)]
        at: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Mark a habit missed and print the recomputed streak
    Miss {
        habit: String,

        #[arg(long)]
        at: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Completion statistics over the last N days
    Stats {
        habit: String,

        /// Window length, 1..=365
        #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
        days: u32,

        #[arg(long)]
        at: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the history snapshot consumed by the analytics service (JSON)
    Feed {
        habit: String,

        #[arg(long)]
        at: Option<String>,
    },

    /// Store values produced by the analytics service
    Insights {
        habit: String,

        /// Suggested reminder hour, 0-23
        #[arg(long)]
        best_hour: Option<u8>,

        /// Success prediction label (e.g. high/medium/low)
        #[arg(long)]
        prediction: Option<String>,

        /// Remove stored insights
        #[arg(long, default_value_t = false)]
        clear: bool,
    },
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_tracing(&cfg.log.level);

    match cli.command {
        Command::Init => config::init_config()?,

        Command::Add(args) => habits_cmd::add(args, &cfg)?,

        Command::Status { at, json } => habits_cmd::status(at, json, &cfg)?,

        Command::Checkin {
            habit,
            value,
            at,
            json,
        } => habits_cmd::record(&habit, EventKind::Checkin, value, at, json)?,

        Command::Miss { habit, at, json } => {
            habits_cmd::record(&habit, EventKind::Miss, None, at, json)?
        }

        Command::Stats {
            habit,
            days,
            at,
            json,
        } => habits_cmd::stats(&habit, days, at, json)?,

        Command::Feed { habit, at } => habits_cmd::feed(&habit, at)?,

        Command::Insights {
            habit,
            best_hour,
            prediction,
            clear,
        } => habits_cmd::insights(&habit, best_hour, prediction, clear)?,
    }

    Ok(())
}
