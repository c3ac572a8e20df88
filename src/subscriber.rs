//! Subscriber broadcast: bounded, non-blocking per-subscriber queues with
//! a sliding-window drop policy on overflow, and a monotonic
//! Active -> Closing -> Closed lifecycle.
//!
//! Adapted from the teacher's `backend::async`, which drains an
//! `crossbeam_channel::unbounded` queue on a background writer thread.
//! Subscribers here use a *bounded* channel with `try_send` instead: a
//! slow subscriber must never block a producer, so overflow is handled by
//! dropping rather than by growing the queue without limit.

use ahash::AHashMap;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use crate::record::Record;

const ACTIVE: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// A bounded broadcast destination. `publish` never blocks: on a full
/// queue it evicts the oldest pending record and retries once; if the
/// queue is still full (another producer raced it) the new record is
/// dropped. This is intentionally not FIFO-fair under contention — it
/// favors keeping the most recent records over perfect ordering.
pub struct Subscriber {
    tx: Sender<Record>,
    rx: Receiver<Record>,
    state: AtomicU8,
}

impl Subscriber {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (tx, rx) = bounded(capacity);
        Arc::new(Subscriber { tx, rx, state: AtomicU8::new(ACTIVE) })
    }

    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::Acquire) == ACTIVE
    }

    /// Publish a record. Returns `false` if the record was dropped (the
    /// subscriber is closing/closed, or the queue stayed full after one
    /// evict-oldest retry).
    pub fn publish(&self, record: Record) -> bool {
        if self.state.load(Ordering::Acquire) != ACTIVE {
            return false;
        }
        match self.tx.try_send(record) {
            Ok(()) => true,
            Err(TrySendError::Full(record)) => {
                // Evict the oldest pending record to make room, then retry
                // once. If another producer already drained it, the retry
                // still tends to succeed; if the queue filled back up in
                // the interim, we drop the new record rather than block.
                let _ = self.rx.try_recv();
                matches!(self.tx.try_send(record), Ok(()))
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Non-blocking receive of the next queued record, if any.
    pub fn try_recv(&self) -> Option<Record> {
        self.rx.try_recv().ok()
    }

    /// Begin graceful shutdown: no further `publish` calls succeed, but
    /// already-queued records remain available via `try_recv` until
    /// drained, at which point the caller transitions to `close`.
    pub fn begin_closing(&self) {
        let _ = self.state.compare_exchange(ACTIVE, CLOSING, Ordering::AcqRel, Ordering::Acquire);
    }

    pub fn close(&self) {
        self.state.store(CLOSED, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED
    }
}

/// Read-only record stream handed back to a caller of `Broadcast::subscribe`.
/// Closes (every subsequent `try_recv` returns `None` once drained) after
/// `CancelHandle::cancel` runs.
pub struct ReceiveHandle {
    subscriber: Arc<Subscriber>,
}

impl ReceiveHandle {
    pub fn try_recv(&self) -> Option<Record> {
        self.subscriber.try_recv()
    }

    /// Whether the stream has definitively ended: cancelled and drained.
    pub fn is_done(&self) -> bool {
        self.subscriber.is_closed() && self.subscriber.try_recv().is_none()
    }
}

/// Cancel capability for a subscription. Atomically transitions the
/// subscriber Active -> Closing -> Closed exactly once; a closed
/// subscriber is removed from the broadcast map and never accepts a send
/// again (invariant 2, `spec.md` §3).
pub struct CancelHandle {
    id: u64,
    broadcast: Weak<Broadcast>,
    subscriber: Arc<Subscriber>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.subscriber.begin_closing();
        self.subscriber.close();
        if let Some(broadcast) = self.broadcast.upgrade() {
            broadcast.subscribers.write().remove(&self.id);
        }
    }
}

/// The multi-consumer broadcast layer: a concurrent map of subscribers
/// keyed by a monotonic id, offered every emitted record without ever
/// blocking the emitting task (`spec.md` §4.7).
///
/// Adapted from the teacher's `backend::async` background-writer shape,
/// generalized from one fixed destination into an arbitrary number of
/// independently-subscribed consumers.
pub struct Broadcast {
    subscribers: RwLock<AHashMap<u64, Arc<Subscriber>>>,
    next_id: AtomicU64,
    dropped: AtomicU64,
}

impl Broadcast {
    pub fn new() -> Arc<Self> {
        Arc::new(Broadcast {
            subscribers: RwLock::new(AHashMap::new()),
            next_id: AtomicU64::new(1),
            dropped: AtomicU64::new(0),
        })
    }

    /// Allocate a bounded queue of `buffer_size` and register it in the
    /// subscriber map. Buffer size 0 is valid: every offered record is then
    /// a candidate for the sliding-window drop (`spec.md` §8 boundary
    /// behaviors).
    pub fn subscribe(self: &Arc<Self>, buffer_size: usize) -> (ReceiveHandle, CancelHandle) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let subscriber = Subscriber::new(buffer_size);
        self.subscribers.write().insert(id, subscriber.clone());
        let receive = ReceiveHandle { subscriber: subscriber.clone() };
        let cancel = CancelHandle { id, broadcast: Arc::downgrade(self), subscriber };
        (receive, cancel)
    }

    /// Offer a record to every Active subscriber. Never blocks: each
    /// subscriber applies its own sliding-window drop policy; a drop here
    /// increments the shared counter rather than surfacing as an error
    /// (`spec.md` §7: "subscriber overflow is not an error").
    pub fn publish(&self, record: &Record) {
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.values() {
            if subscriber.is_active() && !subscriber.publish(record.clone()) {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    #[test]
    fn publish_then_receive_round_trips() {
        let sub = Subscriber::new(4);
        assert!(sub.publish(Record::new(Level::INFO, "hi")));
        let received = sub.try_recv().unwrap();
        assert_eq!(received.message, "hi");
    }

    #[test]
    fn overflow_evicts_oldest_and_keeps_newest() {
        let sub = Subscriber::new(2);
        sub.publish(Record::new(Level::INFO, "1"));
        sub.publish(Record::new(Level::INFO, "2"));
        assert!(sub.publish(Record::new(Level::INFO, "3")));

        let first = sub.try_recv().unwrap();
        let second = sub.try_recv().unwrap();
        assert_eq!(first.message, "2");
        assert_eq!(second.message, "3");
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn closing_rejects_new_publishes() {
        let sub = Subscriber::new(4);
        sub.publish(Record::new(Level::INFO, "queued"));
        sub.begin_closing();
        assert!(!sub.publish(Record::new(Level::INFO, "rejected")));
        assert!(sub.try_recv().is_some());
    }

    #[test]
    fn close_is_terminal() {
        let sub = Subscriber::new(4);
        sub.begin_closing();
        sub.close();
        assert!(sub.is_closed());
        assert!(!sub.publish(Record::new(Level::INFO, "nope")));
    }

    #[test]
    fn broadcast_subscribe_delivers_to_every_active_subscriber() {
        let broadcast = Broadcast::new();
        let (rx1, _cancel1) = broadcast.subscribe(4);
        let (rx2, _cancel2) = broadcast.subscribe(4);
        broadcast.publish(&Record::new(Level::INFO, "hi"));
        assert_eq!(rx1.try_recv().unwrap().message, "hi");
        assert_eq!(rx2.try_recv().unwrap().message, "hi");
    }

    #[test]
    fn broadcast_cancel_removes_from_the_map_and_ends_the_stream() {
        let broadcast = Broadcast::new();
        let (rx, cancel) = broadcast.subscribe(4);
        assert_eq!(broadcast.subscriber_count(), 1);
        cancel.cancel();
        assert_eq!(broadcast.subscriber_count(), 0);
        broadcast.publish(&Record::new(Level::INFO, "after cancel"));
        assert!(rx.is_done());
    }

    /// Scenario 4 of `spec.md` §8: subscribe with buffer size 1, emit three
    /// records with no consumer draining in between; the subscriber ends up
    /// with one of the two most recent records, and at least one record was
    /// dropped.
    #[test]
    fn overflowing_a_buffer_size_one_subscriber_keeps_a_recent_record_and_counts_the_drop() {
        let broadcast = Broadcast::new();
        let (rx, cancel) = broadcast.subscribe(1);
        broadcast.publish(&Record::new(Level::INFO, "r1"));
        broadcast.publish(&Record::new(Level::INFO, "r2"));
        broadcast.publish(&Record::new(Level::INFO, "r3"));

        let remaining = rx.try_recv().unwrap();
        assert!(remaining.message == "r2" || remaining.message == "r3");
        assert!(rx.try_recv().is_none());
        assert!(broadcast.dropped_count() >= 1);

        cancel.cancel();
        assert!(rx.is_done());
    }
}
