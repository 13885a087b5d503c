use clap::Parser;
use log::{error, info};
use server::config::{GameConfig, ServerConfig};
use server::network::Server;
use shared::{DEFAULT_PORT, FOOD_COUNT, GAME_DURATION_SECS};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(author, version, about = "Authoritative blob arena server", long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Match length in seconds, counted from the first join
    #[arg(short, long, default_value_t = GAME_DURATION_SECS)]
    duration: u64,

    /// Number of food pellets kept on the field
    #[arg(short, long, default_value_t = FOOD_COUNT)]
    food: usize,

    /// Seed for reproducible spawns
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds the listener waits on accept before re-checking shutdown
    #[arg(long, default_value_t = 10)]
    accept_timeout: u64,

    /// Seconds a new connection has to announce its name
    #[arg(long, default_value_t = 5)]
    handshake_timeout: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_addr: format!("{}:{}", self.host, self.port),
            accept_timeout: Duration::from_secs(self.accept_timeout),
            handshake_timeout: Duration::from_secs(self.handshake_timeout),
            game: GameConfig {
                duration: Duration::from_secs(self.duration),
                food_count: self.food,
                seed: self.seed,
                ..GameConfig::default()
            },
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();
    info!(
        "Starting server: arena {}x{}, {} food, {}s matches",
        config.game.width,
        config.game.height,
        config.game.food_count,
        config.game.duration.as_secs()
    );

    let server = match Server::bind(config.clone()).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind to {}: {}", config.bind_addr, e);
            return Err(e.into());
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_handle = tokio::spawn(server.run(shutdown_rx));

    tokio::select! {
        result = &mut server_handle => {
            if let Err(e) = result {
                error!("Listener task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            let _ = shutdown_tx.send(true);
        }
    }

    Ok(())
}
