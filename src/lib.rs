//! TCP server that receives LED data frames (or text commands) from a
//! remote lighting controller and queues completed frames for a renderer.

pub mod command;
pub mod config;
pub mod conn;
pub mod error;
pub mod handler;
pub mod pattern;
pub mod pixel;
pub mod protocol;
pub mod queue;
pub mod reader;
pub mod render;
pub mod server;
pub mod state;

pub use command::{CommandRegistry, Response};
pub use config::Config;
pub use error::{LedError, Result};
pub use handler::{CommandProcessor, FrameConsumer, PixelFrameSink, ProtocolHandler};
pub use pixel::{Frame, Pixel};
pub use protocol::FrameGeometry;
pub use queue::{FrameQueue, QueueOrder};
pub use render::FramePoller;
pub use server::{Server, ServerHandle};
pub use state::ServerState;
