//! Protocol handlers bound to a server at construction time.

use std::fmt;
use std::sync::Arc;

use crate::command::{CommandRegistry, Response};
use crate::error::Result;
use crate::pixel::Frame;
use crate::protocol::FrameGeometry;
use crate::queue::FrameQueue;

/// Receives each raw LED data frame read off a connection.
///
/// The consumer's geometry is the only frame size a connection accepts.
pub trait FrameConsumer: Send + Sync {
    fn geometry(&self) -> FrameGeometry;

    fn consume(&self, data: &[u8]) -> Result<()>;
}

/// Answers one newline-stripped line of the text protocol.
pub trait CommandProcessor: Send + Sync {
    fn execute(&self, line: &str) -> Result<Response>;
}

/// The protocol every connection on a listener speaks.
#[derive(Clone)]
pub enum ProtocolHandler {
    Frames(Arc<dyn FrameConsumer>),
    Commands(Arc<dyn CommandProcessor>),
}

impl ProtocolHandler {
    pub fn frames<C: FrameConsumer + 'static>(consumer: C) -> Self {
        Self::Frames(Arc::new(consumer))
    }

    pub fn commands<P: CommandProcessor + 'static>(processor: P) -> Self {
        Self::Commands(Arc::new(processor))
    }

    /// Frame handler that parses pixels and queues them.
    pub fn pixel_frames(geometry: FrameGeometry, queue: FrameQueue) -> Self {
        Self::frames(PixelFrameSink::new(geometry, queue))
    }

    /// Command handler with the built-in `status`, `test` and `close`.
    pub fn default_commands() -> Self {
        Self::commands(CommandRegistry::default())
    }

    /// Frame layout a connection must match; `None` for the command protocol.
    pub fn geometry(&self) -> Option<FrameGeometry> {
        match self {
            Self::Frames(consumer) => Some(consumer.geometry()),
            Self::Commands(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Frames(_) => "frames",
            Self::Commands(_) => "commands",
        }
    }
}

impl fmt::Debug for ProtocolHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProtocolHandler").field(&self.name()).finish()
    }
}

/// Parses LED frames into pixels and pushes them onto a [`FrameQueue`].
#[derive(Debug, Clone)]
pub struct PixelFrameSink {
    geometry: FrameGeometry,
    queue: FrameQueue,
}

impl PixelFrameSink {
    pub fn new(geometry: FrameGeometry, queue: FrameQueue) -> Self {
        Self { geometry, queue }
    }
}

impl FrameConsumer for PixelFrameSink {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn consume(&self, data: &[u8]) -> Result<()> {
        let frame = Frame::parse(data, self.geometry)?;
        log::trace!("frame received: {} pixels", frame.len());
        self.queue.push(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedError;
    use crate::pixel::Pixel;

    #[test]
    fn sink_queues_parsed_frame() {
        let queue = FrameQueue::default();
        let sink = PixelFrameSink::new(FrameGeometry::new(2), queue.clone());

        sink.consume(&[0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 255, 255, 255, 255])
            .unwrap();

        let frame = queue.try_take().unwrap();
        assert_eq!(frame.pixels(), &[Pixel::new(1, 2, 3, 4), Pixel::new(5, 6, 7, 8)]);
    }

    #[test]
    fn sink_rejects_short_frame_without_queuing() {
        let queue = FrameQueue::default();
        let sink = PixelFrameSink::new(FrameGeometry::new(2), queue.clone());

        assert!(matches!(sink.consume(&[0; 8]), Err(LedError::ShortFrame { .. })));
        assert!(queue.is_empty());
    }

    #[test]
    fn handler_names_and_geometry() {
        let commands = ProtocolHandler::default_commands();
        assert_eq!(commands.name(), "commands");
        assert_eq!(commands.geometry(), None);

        let h = ProtocolHandler::pixel_frames(FrameGeometry::new(7), FrameQueue::default());
        assert_eq!(h.name(), "frames");
        assert_eq!(h.geometry(), Some(FrameGeometry::new(7)));
    }
}
