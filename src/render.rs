use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::pixel::Frame;
use crate::queue::FrameQueue;

/// Drains a [`FrameQueue`] on a fixed interval and hands frames to a callback.
#[derive(Debug, Clone)]
pub struct FramePoller {
    queue: FrameQueue,
    interval: Duration,
}

impl FramePoller {
    pub fn new(queue: FrameQueue, interval: Duration) -> Self {
        Self { queue, interval }
    }

    /// Deliver every currently queued frame; returns how many were delivered.
    pub fn poll_once<F>(&self, on_frame: &mut F) -> usize
    where
        F: FnMut(Frame),
    {
        let mut delivered = 0;
        while let Some(frame) = self.queue.try_take() {
            on_frame(frame);
            delivered += 1;
        }
        delivered
    }

    /// Poll until `cancel` fires. The task resolves to the total frames delivered.
    pub fn spawn<F>(self, cancel: CancellationToken, mut on_frame: F) -> JoinHandle<u64>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut total = 0u64;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let n = self.poll_once(&mut on_frame);
                        if n > 0 {
                            log::trace!("rendered {} frames", n);
                        }
                        total += n as u64;
                    }
                }
            }

            total
        })
    }
}

/// Default renderer: log the first pixel's color the way a status label would show it.
pub fn log_frame(frame: Frame) {
    if let Some(p) = frame.first() {
        log::debug!("frame: {} pixels, lead color {}", frame.len(), p.hex());
    }
}
