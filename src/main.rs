//! wolf - minimal chat relay for the Groq completion API
//!
//! Accepts chat requests from the browser, forwards them with a
//! server-held credential, and relays the provider's JSON back.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wolf::config::{Config, ConfigError, KeySource};

#[derive(Parser)]
#[command(name = "wolf")]
#[command(about = "Minimal chat relay for the Groq completion API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Optional TOML configuration file
        #[arg(short, long, env = "WOLF_CONFIG")]
        config: Option<PathBuf>,

        /// Override listen port (takes precedence over PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration and show what the server would use
    Check {
        /// Optional TOML configuration file
        #[arg(short, long, env = "WOLF_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<(Config, KeySource), ConfigError> {
    match path {
        Some(path) => {
            tracing::info!(config = %path.display(), "Loading configuration");
            Config::from_file_with_env(path)
        }
        None => Config::from_env(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wolf=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port } => {
            let (mut config, key_source) = load_config(config.as_ref())?;

            if let Some(port) = port {
                tracing::info!(port, "Override listen port");
                config.server.port = port;
            }

            tracing::info!(
                upstream = %config.upstream.url,
                model = %config.upstream.default_model,
                key_source = %key_source,
                "Starting wolf relay"
            );

            wolf::proxy::run_server(config).await
        }

        Commands::Check { config } => {
            let (config, key_source) = load_config(config.as_ref())?;

            println!("Configuration OK");
            println!("  listen:        {}", config.server.listen_addr());
            println!("  upstream:      {}", config.upstream.url);
            println!("  default model: {}", config.upstream.default_model);
            println!(
                "  defaults:      temperature={} max_tokens={}",
                config.upstream.default_temperature, config.upstream.default_max_tokens
            );
            println!("  index page:    {}", config.site.index_path.display());
            println!("  api key:       {}", key_source);

            if key_source == KeySource::None {
                tracing::warn!("No API key configured (set GROQ_API_KEY)");
            }
            Ok(())
        }
    }
}
