use crate::demo::{run_amortize, run_demo, run_search, AmortizeArgs, DemoArgs, SearchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use estate_discovery::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Estate Discovery",
    about = "Run and explore the map-based property discovery engine from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Search the catalog around an optional origin and print ranked results
    Search(SearchArgs),
    /// Compute a monthly mortgage payment
    Amortize(AmortizeArgs),
    /// Walk through a discovery session and its map reconciliation
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Directory holding listings.csv, professionals.csv, projects.csv, profiles.csv
    #[arg(long)]
    pub(crate) catalog_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Search(args) => run_search(args).await,
        Command::Amortize(args) => run_amortize(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
