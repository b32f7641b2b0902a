use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

/// Capacity of the outbound media queue. Producers suspend when it is
/// full, throttling capture to the speed the transport drains at.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 5;

/// Unbounded FIFO of inbound audio chunks pending playback.
///
/// The receive duty pushes and clears; the playback duty pops. Clearing at
/// each turn boundary bounds growth to one turn's worth of undelivered
/// audio and implements barge-in discard.
#[derive(Default)]
pub struct PlaybackQueue {
    chunks: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, chunk: Vec<u8>) {
        self.chunks.lock().unwrap().push_back(chunk);
        self.notify.notify_one();
    }

    /// Wait for and remove the oldest chunk.
    pub async fn pop(&self) -> Vec<u8> {
        loop {
            // Register for notification before checking, so a push between
            // the check and the await is not lost.
            let notified = self.notify.notified();

            if let Some(chunk) = self.chunks.lock().unwrap().pop_front() {
                return chunk;
            }

            notified.await;
        }
    }

    /// Discard all queued chunks, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut chunks = self.chunks.lock().unwrap();
        let dropped = chunks.len();
        chunks.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pop_returns_in_fifo_order() {
        let queue = PlaybackQueue::new();
        queue.push(vec![1]);
        queue.push(vec![2]);
        queue.push(vec![3]);

        assert_eq!(queue.pop().await, vec![1]);
        assert_eq!(queue.pop().await, vec![2]);
        assert_eq!(queue.pop().await, vec![3]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let queue = Arc::new(PlaybackQueue::new());

        let popper = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        // Give the popper time to block on the empty queue
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(vec![42]);

        let chunk = tokio::time::timeout(Duration::from_secs(1), popper)
            .await
            .expect("pop should unblock")
            .unwrap();
        assert_eq!(chunk, vec![42]);
    }

    #[tokio::test]
    async fn test_clear_discards_everything() {
        let queue = PlaybackQueue::new();
        for i in 0..4 {
            queue.push(vec![i]);
        }

        assert_eq!(queue.clear(), 4);
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.clear(), 0);
    }
}
