use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::net::TcpStream;

use ledserver::{pattern, protocol};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Pattern {
    /// Rotate a five-color palette by one pixel per frame
    Cycle,
    /// Random colors every frame
    Random,
}

#[derive(Parser)]
#[command(name = "led-client", about = "Send LED data frames to an LED emulator")]
struct Args {
    #[arg(long, default_value = "localhost:5555")]
    addr: String,

    #[arg(long, default_value_t = 50)]
    pixels: usize,

    /// Number of frames to send
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Delay between frames in milliseconds
    #[arg(long, default_value_t = 500)]
    delay: u64,

    #[arg(long, value_enum, default_value = "cycle")]
    pattern: Pattern,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    log::info!("connecting to {}", args.addr);
    let mut stream = TcpStream::connect(&args.addr)
        .await
        .with_context(|| format!("connecting to {}", args.addr))?;

    for i in 0..args.count {
        let pixels = match args.pattern {
            Pattern::Cycle => pattern::cycle(args.pixels, i % pattern::PALETTE.len()),
            Pattern::Random => pattern::random(args.pixels),
        };

        protocol::write_frame(&mut stream, &pixels).await?;
        log::info!("frame {} sent", i + 1);

        tokio::time::sleep(Duration::from_millis(args.delay)).await;
    }

    Ok(())
}
