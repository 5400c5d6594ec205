mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_delete, cmd_export_entries, cmd_export_foods, cmd_food_add, cmd_food_delete,
    cmd_food_list, cmd_food_starter, cmd_history, cmd_log, cmd_range, cmd_summary,
};
use crate::config::Config;
use nutrilog_core::service::Tracker;

#[derive(Parser)]
#[command(
    name = "nutrilog",
    version,
    about = "Track protein, carbs, fat and fiber from a local food catalog"
)]
struct Cli {
    /// Path to the database file (default: platform data directory)
    #[arg(long, global = true, env = "NUTRILOG_DB", value_name = "PATH")]
    db: Option<PathBuf>,
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the food catalog
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Log a quantity of a catalog food
    Log {
        /// Food name (exact, or a search term matching one food)
        #[arg(required_unless_present = "food_id")]
        food: Option<String>,
        /// Grams for per100g foods, a count for per_piece/per_serving (default: 100 or 1)
        quantity: Option<f64>,
        /// Log directly by food ID (skip the name lookup)
        #[arg(long)]
        food_id: Option<i64>,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a log entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show entries and totals for one day (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-day totals for the last N days
    History {
        /// Number of days to show (1-365)
        #[arg(short, long, default_value = "14")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-day totals for an inclusive date range
    Range {
        /// First day (YYYY-MM-DD or today/yesterday/tomorrow)
        #[arg(long)]
        from: String,
        /// Last day (default: today)
        #[arg(long)]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the catalog or the log as CSV
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a food, or overwrite the one with the same name
    Add {
        /// Food name
        name: String,
        /// Unit the values are given for: per100g, per_piece, per_serving
        #[arg(short, long, default_value = "per100g")]
        unit: String,
        /// Protein (g) per unit
        #[arg(long)]
        protein: Option<f64>,
        /// Carbs (g) per unit
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat (g) per unit
        #[arg(long)]
        fat: Option<f64>,
        /// Fiber (g) per unit
        #[arg(long)]
        fiber: Option<f64>,
        /// Calories per unit (0 or omitted: derive from macros)
        #[arg(long)]
        calories: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List/search the food catalog
    List {
        /// Search query to filter foods
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food by name or ID (log entries are kept)
    Delete {
        /// Food name
        #[arg(required_unless_present = "id", conflicts_with = "id")]
        name: Option<String>,
        /// Food ID
        #[arg(long)]
        id: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add or refresh a set of common starter foods
    Starter {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Export the food catalog
    Foods {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Report the written file as JSON
        #[arg(long, requires = "output")]
        json: bool,
    },
    /// Export every log entry with its resolved totals
    Entries {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Report the written file as JSON
        #[arg(long, requires = "output")]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Logs go to stderr so `--json` and CSV output on stdout stay clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    tracing::debug!(db = %config.db_path.display(), "using database");
    let tracker = Tracker::open(&config.db_path)?;

    match cli.command {
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                unit,
                protein,
                carbs,
                fat,
                fiber,
                calories,
                json,
            } => cmd_food_add(
                &tracker, &name, &unit, protein, carbs, fat, fiber, calories, json,
            ),
            FoodCommands::List { search, json } => {
                cmd_food_list(&tracker, search.as_deref(), json)
            }
            FoodCommands::Delete { name, id, json } => {
                cmd_food_delete(&tracker, name.as_deref(), id, json)
            }
            FoodCommands::Starter { json } => cmd_food_starter(&tracker, json),
        },
        Commands::Log {
            food,
            quantity,
            food_id,
            date,
            note,
            json,
        } => {
            let (food, quantity) = log_args(food_id, food, quantity)?;
            cmd_log(&tracker, food.as_deref(), quantity, food_id, date, note, json)
        }
        Commands::Delete { entry_id, json } => cmd_delete(&tracker, entry_id, json),
        Commands::Summary { date, json } => cmd_summary(&tracker, date, json),
        Commands::History { days, json } => cmd_history(&tracker, days, json),
        Commands::Range { from, to, json } => cmd_range(&tracker, from, to, json),
        Commands::Export { command } => match command {
            ExportCommands::Foods { output, json } => {
                cmd_export_foods(&tracker, output.as_deref(), json)
            }
            ExportCommands::Entries { output, json } => {
                cmd_export_entries(&tracker, output.as_deref(), json)
            }
        },
    }
}

/// With `--food-id`, a single positional is the quantity (`log --food-id 3 2`).
fn log_args(
    food_id: Option<i64>,
    food: Option<String>,
    quantity: Option<f64>,
) -> Result<(Option<String>, Option<f64>)> {
    match (food_id, food, quantity) {
        (Some(_), Some(qty), None) => {
            let qty: f64 = qty
                .trim()
                .parse()
                .with_context(|| format!("Invalid quantity '{qty}'"))?;
            Ok((None, Some(qty)))
        }
        (_, food, quantity) => Ok((food, quantity)),
    }
}
