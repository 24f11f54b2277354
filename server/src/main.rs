use clap::Parser;
use log::info;
use server::config::MatchConfig;
use server::game::Game;
use server::network::{BoxError, Server};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Physics ticks per second
    #[clap(short, long, default_value = "30")]
    tick_rate: u32,
    /// Match length in seconds
    #[clap(short = 'd', long, default_value = "300")]
    match_duration: u32,
    /// Score that ends the match
    #[clap(short, long, default_value = "10")]
    win_score: u32,
    /// Maximum concurrent connections (players and spectators)
    #[clap(short, long, default_value = "16")]
    max_clients: usize,
    /// Seed for reproducible matches
    #[clap(short, long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = MatchConfig {
        tick_rate: args.tick_rate,
        match_duration_secs: args.match_duration,
        win_score: args.win_score,
        ..MatchConfig::default()
    };
    let game = match args.seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            Game::with_seed(config, seed)
        }
        None => Game::new(config),
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, game, args.max_clients).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
