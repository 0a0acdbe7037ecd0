use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use crate::pixel::Frame;

/// Which end of the queue `try_take` pulls from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueOrder {
    /// Arrival order.
    #[default]
    Fifo,
    /// Most recently pushed frame first.
    Lifo,
}

/// Frames produced by connection tasks, waiting for a renderer.
///
/// Cloning shares the same underlying queue. The lock is only held for the
/// duration of a single push or pop, never across a network read.
#[derive(Clone, Debug)]
pub struct FrameQueue {
    frames: Arc<Mutex<VecDeque<Frame>>>,
    order: QueueOrder,
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new(QueueOrder::default())
    }
}

impl FrameQueue {
    pub fn new(order: QueueOrder) -> Self {
        Self {
            frames: Arc::new(Mutex::new(VecDeque::new())),
            order,
        }
    }

    pub fn order(&self) -> QueueOrder {
        self.order
    }

    // A panicking producer cannot leave a half-written frame behind, so a
    // poisoned lock still guards a consistent deque.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, frame: Frame) {
        self.lock().push_back(frame);
    }

    /// Non-blocking pop; `None` when nothing is queued.
    pub fn try_take(&self) -> Option<Frame> {
        let mut frames = self.lock();
        match self.order {
            QueueOrder::Fifo => frames.pop_front(),
            QueueOrder::Lifo => frames.pop_back(),
        }
    }

    /// Take every queued frame, in retrieval order.
    pub fn drain(&self) -> Vec<Frame> {
        let mut frames = self.lock();
        match self.order {
            QueueOrder::Fifo => frames.drain(..).collect(),
            QueueOrder::Lifo => frames.drain(..).rev().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;

    fn frame(tag: u8) -> Frame {
        Frame::new(vec![Pixel::new(tag, 0, 0, 0)])
    }

    fn tag(f: &Frame) -> u8 {
        f.pixels()[0].brightness
    }

    #[test]
    fn empty_queue_returns_none() {
        let q = FrameQueue::default();
        assert!(q.try_take().is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn fifo_returns_arrival_order() {
        let q = FrameQueue::new(QueueOrder::Fifo);
        q.push(frame(1));
        q.push(frame(2));
        q.push(frame(3));

        assert_eq!(tag(&q.try_take().unwrap()), 1);
        assert_eq!(tag(&q.try_take().unwrap()), 2);
        assert_eq!(tag(&q.try_take().unwrap()), 3);
        assert!(q.try_take().is_none());
    }

    #[test]
    fn lifo_returns_newest_first() {
        let q = FrameQueue::new(QueueOrder::Lifo);
        q.push(frame(1));
        q.push(frame(2));
        q.push(frame(3));

        assert_eq!(tag(&q.try_take().unwrap()), 3);
        let rest: Vec<u8> = q.drain().iter().map(tag).collect();
        assert_eq!(rest, vec![2, 1]);
    }

    #[test]
    fn concurrent_pushes_lose_nothing() {
        let q = FrameQueue::default();
        let producers = 8;
        let per_producer = 250;

        let handles: Vec<_> = (0..producers)
            .map(|p| {
                let q = q.clone();
                std::thread::spawn(move || {
                    for _ in 0..per_producer {
                        q.push(frame(p as u8));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(q.len(), producers * per_producer);

        let frames = q.drain();
        for p in 0..producers {
            let count = frames.iter().filter(|f| tag(f) == p as u8).count();
            assert_eq!(count, per_producer);
        }
        assert!(q.is_empty());
    }
}
