use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use tidepool_events::RawMessage;

struct Inner {
    buf: Vec<RawMessage>,
    head: usize,
    tail: usize,
}

/// Bounded single-producer/single-consumer-style FIFO between ingest and
/// the processor, holding up to `capacity` resident messages.
///
/// Internally sized `capacity + 1` slots so `(tail + 1) % len == head`
/// unambiguously means full without a separate occupancy counter to keep
/// in sync with `head`/`tail` (the one-slot-unused convention). `push`
/// never blocks: when full it drops the oldest resident message before
/// writing the new one. `pop` blocks on a condition variable until a
/// message is available or shutdown is observed.
pub struct MessageRing {
    inner: Mutex<Inner>,
    not_empty: Condvar,
    dropped: AtomicU64,
}

impl MessageRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            inner: Mutex::new(Inner {
                buf: vec![RawMessage::default(); capacity + 1],
                head: 0,
                tail: 0,
            }),
            not_empty: Condvar::new(),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn push(&self, msg: RawMessage) {
        let mut inner = self.inner.lock().unwrap();
        let len = inner.buf.len();
        if (inner.tail + 1) % len == inner.head {
            inner.head = (inner.head + 1) % len;
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        let tail = inner.tail;
        inner.buf[tail] = msg;
        inner.tail = (tail + 1) % len;
        drop(inner);
        self.not_empty.notify_one();
    }

    /// Blocks while the ring is empty and `shutdown` is not set. Returns
    /// `None` once shutdown has been observed and the ring has drained.
    pub fn pop(&self, shutdown: &AtomicBool) -> Option<RawMessage> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if inner.head != inner.tail {
                let len = inner.buf.len();
                let head = inner.head;
                let msg = inner.buf[head];
                inner.head = (head + 1) % len;
                return Some(msg);
            }
            if shutdown.load(Ordering::Acquire) {
                return None;
            }
            inner = self.not_empty.wait(inner).unwrap();
        }
    }

    /// Wakes any thread blocked in `pop`; call after setting the shutdown
    /// flag so the waiter re-checks it instead of blocking forever.
    pub fn notify_shutdown(&self) {
        self.not_empty.notify_all();
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        let len = inner.buf.len();
        (inner.tail + len - inner.head) % len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(tag: u8) -> RawMessage {
        let mut m = RawMessage::default();
        m.raw_text[0] = tag;
        m.raw_len = 1;
        m
    }

    #[test]
    fn fifo_order_without_overflow() {
        let ring = MessageRing::new(4);
        ring.push(msg(b'A'));
        ring.push(msg(b'B'));
        let shutdown = AtomicBool::new(false);
        assert_eq!(ring.pop(&shutdown).unwrap().raw_text[0], b'A');
        assert_eq!(ring.pop(&shutdown).unwrap().raw_text[0], b'B');
    }

    #[test]
    fn drop_oldest_on_overflow() {
        // QUEUE_CAPACITY=4: push A,B,C,D without popping, then push E.
        // Next four pops are B,C,D,E.
        let ring = MessageRing::new(4);
        ring.push(msg(b'A'));
        ring.push(msg(b'B'));
        ring.push(msg(b'C'));
        ring.push(msg(b'D'));
        ring.push(msg(b'E'));

        let shutdown = AtomicBool::new(false);
        let mut out = Vec::new();
        for _ in 0..4 {
            out.push(ring.pop(&shutdown).unwrap().raw_text[0]);
        }
        assert_eq!(out, vec![b'B', b'C', b'D', b'E']);
    }

    #[test]
    fn pop_returns_none_after_shutdown_when_empty() {
        let ring = MessageRing::new(4);
        let shutdown = AtomicBool::new(true);
        assert!(ring.pop(&shutdown).is_none());
    }

    #[test]
    fn never_exceeds_capacity() {
        let ring = MessageRing::new(4);
        for i in 0..10u8 {
            ring.push(msg(i));
            assert!(ring.len() <= 4);
        }
    }
}
