use clap::Parser;
use client::input::RandomPolicy;
use client::network::Client;
use client::solo::SoloGame;
use log::info;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:5555")]
    server: String,

    /// Play random legal moves automatically
    #[arg(short = 'b', long)]
    bot: bool,

    /// Play locally against the random policy instead of joining a server
    #[arg(long, conflicts_with = "bot")]
    solo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if !args.bot {
        println!("Type 1-9 then Enter to play a cell, r to restart, q to quit");
    }

    if args.solo {
        info!("Local match: you are X, the random policy plays O");
        let mut game = SoloGame::new(RandomPolicy::new());
        game.run(BufReader::new(tokio::io::stdin())).await?;
        return Ok(());
    }

    info!("Connecting to: {}", args.server);
    if args.bot {
        info!("Bot mode: moves are chosen at random");
    }

    let mut client = Client::connect(&args.server, args.bot).await?;
    client.run().await?;

    Ok(())
}
