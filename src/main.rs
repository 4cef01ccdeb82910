use clap::{Parser, Subcommand};

use market_pulse::config::Config;
use market_pulse::error::Result;
use market_pulse::poll::PollParams;
use market_pulse::{server, watch};

#[derive(Parser)]
#[command(
    name = "market-pulse",
    about = "Top movers API server and terminal watcher",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the movers HTTP API server.
    Serve {
        /// Port to listen on, overriding the built-in configuration.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Poll a running API server and render movers in the terminal.
    Watch {
        /// Ranking direction: gainers or losers.
        #[arg(long, default_value = "gainers")]
        category: String,
        /// Instrument universe: broadMarket or derivativesUniverse.
        #[arg(long, default_value = "broadMarket")]
        segment: String,
        /// Base URL of the API server to poll.
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        api: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::builtin();

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(config).await
        }
        Commands::Watch {
            category,
            segment,
            api,
        } => {
            let params = PollParams {
                category: category.parse()?,
                segment: segment.parse()?,
            };
            watch::run(api, params, config).await
        }
    }
}
