use anyhow::Context;
use circa_core::CircaConfig;
use circa_engine::BioEngine;
use clap::Parser;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod repl;

use repl::{Outcome, ReplCommand, Session};

#[derive(Parser, Debug)]
#[command(name = "circa", author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "circa.toml", env = "CIRCA_CONFIG")]
    config: String,

    /// Time dilation: 1, 60 or 3600 simulated seconds per second
    #[arg(short, long)]
    speed: Option<u32>,

    /// Hour of waking (0-23)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..24))]
    wake_hour: Option<u8>,

    /// Keep the clock stopped until `start`
    #[arg(long)]
    paused: bool,
}

fn prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut config = CircaConfig::load_or_default(&args.config);
    if let Some(speed) = args.speed {
        config.clock.speed = speed;
    }
    if let Some(hour) = args.wake_hour {
        config.biology.wake_hour = hour;
    }
    if args.paused {
        config.clock.autostart = false;
    }

    let engine = BioEngine::from_config(&config).context("Invalid clock configuration")?;
    info!(
        "Circa engine up: {}x, tick {}ms, metabolism {}",
        config.clock.speed, config.clock.tick_interval_ms, config.biology.metabolism
    );

    println!("Circa online. Type 'help' for commands, 'quit' to exit.");
    prompt()?;

    let mut session = Session::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            prompt()?;
            continue;
        }

        match trimmed.parse::<ReplCommand>() {
            Ok(command) => match session.execute(&engine, command).await {
                Ok(Outcome::Print(text)) => println!("{text}"),
                Ok(Outcome::Quit) => break,
                Err(e) => {
                    error!("Command failed: {:#}", e);
                    println!("[error] {e:#}");
                }
            },
            Err(e) => println!("[error] {e:#}"),
        }
        prompt()?;
    }

    if let Err(e) = engine.shutdown().await {
        error!("Engine shutdown: {}", e);
    }
    Ok(())
}
