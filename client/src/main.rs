use clap::Parser;
use client::network::{Client, ClientConfig};
use log::{error, info};
use shared::DEFAULT_PORT;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless blob arena player", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Display name announced to the server
    #[arg(short = 'n', long, default_value = "bot")]
    name: String,

    /// Input messages per second
    #[arg(short = 'r', long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    rate: u32,

    /// Seconds between leaderboard log lines
    #[arg(short = 'l', long, default_value_t = 5)]
    leaderboard_interval: u64,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        ClientConfig {
            server_addr: self.server,
            name: self.name,
            input_interval: Duration::from_secs_f64(1.0 / f64::from(self.rate)),
            leaderboard_interval: Duration::from_secs(self.leaderboard_interval.max(1)),
            ..ClientConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();
    info!("Starting client \"{}\"...", config.name);

    let client = match Client::connect(config).await {
        Ok(client) => client,
        Err(e) => {
            error!("Could not join the game: {}", e);
            return Err(e.into());
        }
    };

    tokio::select! {
        result = client.run() => {
            let summary = result?;
            info!(
                "Finished as player {} after {} updates and {} inputs",
                summary.player_id, summary.updates_received, summary.inputs_sent
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, leaving the game");
        }
    }

    Ok(())
}
