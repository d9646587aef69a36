use anyhow::Result;
use clap::{Parser, Subcommand};
use connector_auth::connections::Connections;
use connector_auth::observability::metrics::get_metrics;
use connector_auth::utils::config_loader;
use connector_auth::utils::constants::DEFAULT_CONFIG_PATH;
use connector_auth::utils::logging;
use connector_auth::utils::logging::LogLevel;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// Print prometheus metrics after the command
    #[arg(long)]
    metrics: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a valid access token, refreshing it when needed
    Token { connector: String },
    /// Exchange an authorization code for the first token pair
    Exchange {
        connector: String,
        #[arg(long)]
        code: String,
    },
    /// Print the cache key of a connector
    Key { connector: String },
    /// List configured connectors
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, set up logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(Some(&service_config), args.log_level)?;

    // -------------------------------
    // 2. Wire connectors with the configured cache segment
    // -------------------------------

    let connections = Connections::from_config(&service_config)?;

    // -------------------------------
    // 3. Run the command
    // -------------------------------

    match args.command {
        Command::Token { connector } => {
            let token = connections.get_connector(&connector)?.get_access_token().await?;
            println!("{}", token);
        }
        Command::Exchange { connector, code } => {
            let token = connections.get_connector(&connector)?.generate_access_token(&code).await?;
            info!(connector = %connector, "authorization code exchanged");
            println!("{}", token);
        }
        Command::Key { connector } => {
            println!("{}", connections.get_connector(&connector)?.cache_key().await);
        }
        Command::List => {
            for name in connections.names() {
                println!("{}", name);
            }
        }
    }

    if args.metrics {
        print!("{}", get_metrics().await.render()?);
    }

    Ok(())
}
