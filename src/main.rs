use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;

use ledserver::config::{Config, DEFAULT_CONFIG_FILE};
use ledserver::{FramePoller, FrameQueue, ProtocolHandler, Server, ServerState, render};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Protocol {
    /// Binary LED data frames
    Frames,
    /// Line-oriented commands with JSON responses
    Commands,
}

#[derive(Parser)]
#[command(name = "ledserver", about = "LED emulator: receives LED data frames over TCP")]
struct Args {
    /// JSON configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the listening port
    #[arg(long)]
    port: Option<u16>,

    /// Override the number of pixels per frame
    #[arg(long)]
    pixels: Option<usize>,

    #[arg(long, value_enum, default_value = "frames")]
    protocol: Protocol,

    /// Override the configured log filter
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(pixels) = args.pixels {
        config.num_pixels = pixels;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    config.validate()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .target(env_logger::Target::Stderr)
        .init();
    config.dump();

    let queue = FrameQueue::new(config.queue_order);
    let state = ServerState::new(queue.clone());

    let handler = match args.protocol {
        Protocol::Frames => ProtocolHandler::pixel_frames(config.geometry(), queue.clone()),
        Protocol::Commands => ProtocolHandler::default_commands(),
    };

    let server = Server::builder(config.listen_addr())
        .handler(handler)
        .state(state)
        .timeout(config.timeout())
        .max_connections(config.max_connections)
        .build()?;

    let handle = server.start().await?;

    let render_cancel = CancellationToken::new();
    let renderer = FramePoller::new(queue, config.poll_interval())
        .spawn(render_cancel.clone(), render::log_frame);

    tokio::signal::ctrl_c().await?;
    log::info!("interrupt received, shutting down");

    handle.stop().await;
    render_cancel.cancel();
    let rendered = renderer.await?;
    log::info!("rendered {} frames", rendered);

    Ok(())
}
