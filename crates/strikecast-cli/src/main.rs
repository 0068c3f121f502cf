mod refresh;

use clap::{Parser, Subcommand};

use strikecast_core::Domain;

#[derive(Debug, Parser)]
#[command(name = "strikecast-cli")]
#[command(about = "Run condition refresh cycles from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one refresh cycle and print a strike summary.
    Refresh {
        /// Restrict the summary to one domain (surf or ski).
        #[arg(long)]
        domain: Option<Domain>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Refresh { domain } => refresh::run(domain).await,
    }
}
