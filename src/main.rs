#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use clap::{Parser, Subcommand};
#[cfg(feature = "std")]
use fleetroom::{bot::Bot, init_logging, Server, ServerConfig, TcpTransport};
#[cfg(feature = "std")]
use rand::rngs::SmallRng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[cfg(feature = "std")]
enum Commands {
    /// Run the room server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[arg(long, default_value_t = 30, help = "Seconds between liveness probes")]
        heartbeat_secs: u64,
        #[arg(long, default_value_t = 20, help = "Actions accepted per connection per second")]
        rate_limit: usize,
        #[arg(
            long,
            help = "Fix RNG seed for reproducible codes and turn order (e.g., --seed 12345)"
        )]
        seed: Option<u64>,
    },
    /// Play one game as a scripted client.
    Bot {
        #[arg(long, default_value = "127.0.0.1:8080")]
        connect: String,
        #[arg(long, help = "Join this room instead of creating one")]
        code: Option<String>,
        #[arg(long, help = "Fix RNG seed for reproducible play (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            heartbeat_secs,
            rate_limit,
            seed,
        } => {
            if let Some(s) = seed {
                log::info!("Using fixed seed: {}", s);
            }
            let config = ServerConfig {
                bind,
                heartbeat_interval: Duration::from_secs(heartbeat_secs.max(1)),
                max_actions_per_second: rate_limit,
                seed,
                ..ServerConfig::default()
            };
            tokio::select! {
                result = Server::new(config).run() => result?,
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Received Ctrl+C, shutting down");
                }
            }
        }
        Commands::Bot {
            connect,
            code,
            seed,
        } => {
            let mut rng = match seed {
                Some(s) => SmallRng::seed_from_u64(s),
                None => {
                    let mut seed_rng = rand::rng();
                    SmallRng::from_rng(&mut seed_rng)
                }
            };
            let transport = TcpTransport::connect(&connect).await?;
            let mut bot = Bot::new(transport);
            let code = match code {
                Some(code) => code,
                None => {
                    let code = bot.create_room().await?;
                    println!("Room code: {}", code);
                    code
                }
            };
            let outcome = bot.play(&code, &mut rng).await?;
            if outcome.won {
                println!("Victory in room {} after {} shots", outcome.code, outcome.shots);
            } else {
                println!("Defeat in room {} after {} shots", outcome.code, outcome.shots);
            }
        }
    }
    Ok(())
}
