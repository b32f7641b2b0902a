// Queue behavior tests: outbound backpressure and inbound barge-in discard.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use glance::session::{PlaybackQueue, OUTBOUND_QUEUE_CAPACITY};
use glance::OutboundMessage;

fn media(tag: u8) -> OutboundMessage {
    OutboundMessage::Media {
        mime_type: "audio/pcm".to_string(),
        data: vec![tag],
    }
}

#[tokio::test]
async fn test_outbound_queue_blocks_sixth_producer() {
    let (tx, mut rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

    // Five entries fit without waiting.
    for i in 0..OUTBOUND_QUEUE_CAPACITY as u8 {
        tx.try_send(media(i)).expect("queue should accept up to capacity");
    }

    // The sixth does not.
    assert!(tx.try_send(media(5)).is_err());

    // A blocked producer resumes as soon as the consumer frees a slot.
    let blocked = {
        let tx = tx.clone();
        tokio::spawn(async move { tx.send(media(5)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!blocked.is_finished(), "producer should wait while full");

    let first = rx.recv().await.expect("queue has entries");
    assert_eq!(first, media(0));

    timeout(Duration::from_secs(1), blocked)
        .await
        .expect("producer should unblock after a dequeue")
        .unwrap()
        .unwrap();

    // Drain: order matches enqueue order exactly.
    for i in 1..=OUTBOUND_QUEUE_CAPACITY as u8 {
        assert_eq!(rx.recv().await, Some(media(i)));
    }
}

#[tokio::test]
async fn test_playback_queue_clears_at_turn_boundary() {
    let queue = Arc::new(PlaybackQueue::new());

    // A turn's worth of audio arrives...
    for i in 0..8u8 {
        queue.push(vec![i]);
    }
    assert_eq!(queue.len(), 8);

    // ...the turn ends before playback catches up: everything is stale.
    assert_eq!(queue.clear(), 8);
    assert_eq!(queue.len(), 0);

    // The next turn starts from an empty queue.
    queue.push(vec![42]);
    assert_eq!(queue.pop().await, vec![42]);
}

#[tokio::test]
async fn test_playback_queue_is_fifo_across_waiters() {
    let queue = Arc::new(PlaybackQueue::new());

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            let mut chunks = Vec::new();
            for _ in 0..3 {
                chunks.push(queue.pop().await);
            }
            chunks
        })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    queue.push(vec![1]);
    queue.push(vec![2]);
    queue.push(vec![3]);

    let chunks = timeout(Duration::from_secs(1), consumer)
        .await
        .expect("consumer should drain")
        .unwrap();
    assert_eq!(chunks, vec![vec![1], vec![2], vec![3]]);
}
