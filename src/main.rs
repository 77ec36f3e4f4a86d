use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::process;

use claude_spend::aggregate::{aggregate_by_project, aggregate_by_project_and_day};
use claude_spend::config::get_config;
use claude_spend::display;
use claude_spend::filters::{apply_filters, TimeFilter};
use claude_spend::logging::init_logging;
use claude_spend::pricing::{PricingFetcher, PricingTable};
use claude_spend::scanner::{project_names, UsageScanner};
use claude_spend::sort::{sort_by_field, SortField, SortOrder};

#[derive(Parser)]
#[command(name = "claude-spend", version)]
#[command(about = "Cost and usage reports for Claude Code session logs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Grouping {
    /// One row per project and calendar day
    Daily,
    /// One row per project
    Project,
    /// Raw records, one row per message
    None,
}

#[derive(Subcommand)]
enum Commands {
    /// Usage report, filtered, grouped and sorted
    Report {
        /// Time window, e.g. 7d, 12h, 4-6, apr-jun, 2025-01-01,2025-01-31
        #[arg(long)]
        time: Option<String>,
        /// Keep only projects whose name contains this (case-insensitive)
        #[arg(long)]
        project: Option<String>,
        /// Sort field: cost, time, tokens, project
        #[arg(long, default_value = "time")]
        sort: String,
        /// Sort order: asc, desc
        #[arg(long, default_value = "asc")]
        order: String,
        /// Row grouping
        #[arg(long, value_enum, default_value = "daily")]
        group: Grouping,
        /// Show at most N rows
        #[arg(long)]
        limit: Option<usize>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// List the models in the pricing table with their rates
    Models {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// List the projects present in the usage data
    Projects {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Report {
            time: None,
            project: None,
            sort: "time".to_string(),
            order: "asc".to_string(),
            group: Grouping::Daily,
            limit: None,
            json: false,
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or_default();
    let json = match &command {
        Commands::Report { json, .. } | Commands::Models { json } | Commands::Projects { json } => {
            *json
        }
    };

    if let Err(e) = run(command).await {
        handle_error(e, json);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Report {
            time,
            project,
            sort,
            order,
            group,
            limit,
            json,
        } => {
            // Validate user input before any I/O happens.
            let field: SortField = sort.parse()?;
            let direction: SortOrder = order.parse()?;
            let window = time.as_deref().map(TimeFilter::parse).transpose()?;

            let mut fetcher = PricingFetcher::new();
            let pricing = fetcher.fetch(true).await;
            let scanner = UsageScanner::new(&pricing);
            let outcome = scanner.scan(&get_config().paths.claude_home)?;
            let filtered = apply_filters(&outcome.records, window.as_ref(), project.as_deref());

            match group {
                Grouping::Daily => {
                    let rows = aggregate_by_project_and_day(&filtered);
                    display::render_aggregated(&sort_by_field(&rows, field, direction), limit, json);
                }
                Grouping::Project => {
                    let rows = aggregate_by_project(&filtered);
                    display::render_aggregated(&sort_by_field(&rows, field, direction), limit, json);
                }
                Grouping::None => {
                    display::render_records(&sort_by_field(&filtered, field, direction), limit, json);
                }
            }
            Ok(())
        }
        Commands::Models { json } => {
            let mut fetcher = PricingFetcher::new();
            let pricing = fetcher.fetch(true).await;
            display::render_models(&pricing, json);
            Ok(())
        }
        Commands::Projects { json } => {
            // Listing projects needs no pricing; an empty table prices at zero.
            let pricing = PricingTable::new();
            let scanner = UsageScanner::new(&pricing);
            let outcome = scanner.scan(&get_config().paths.claude_home)?;
            display::render_projects(&project_names(&outcome.records), json);
            Ok(())
        }
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": e.to_string() }));
    } else {
        eprintln!("Error: {}", e);
    }
    process::exit(1);
}
