use std::sync::{Mutex, MutexGuard};
use tidepool_events::VwapPoint;

struct Inner {
    points: Vec<VwapPoint>,
    capacity: usize,
    /// Total points ever appended; the physical slot for logical sequence
    /// `s` is `s % capacity`, so the array never needs shifting on
    /// overwrite — the same idea as a sequence-indexed broadcast ring,
    /// generalized from a power-of-two mask to a plain modulo since
    /// `HISTORY_CAPACITY` isn't a power of two.
    next_seq: u64,
}

/// A symbol's bounded ring of per-minute `(minute_ts_ms, vwap)` points.
/// `append` overwrites the oldest point once full; `get_recent` and the
/// correlation lagged search read under the same mutex so a peer
/// currently being appended to is never observed half-updated.
pub struct VwapHistory {
    inner: Mutex<Inner>,
}

/// A read-only view over the ring, valid for the lifetime of the lock
/// guard that produced it. Exposes both chronological access
/// (`get_recent`-style) and "distance from the newest point" access,
/// which is how the lagged correlation search addresses a target window.
pub struct HistoryView<'a> {
    guard: MutexGuard<'a, Inner>,
}

impl<'a> HistoryView<'a> {
    pub fn size(&self) -> usize {
        self.guard.next_seq.min(self.guard.capacity as u64) as usize
    }

    /// `offset_from_newest = 0` is the most recently appended point;
    /// larger offsets walk backward in time. Returns `None` if fewer than
    /// `offset_from_newest + 1` points are resident.
    pub fn get_from_newest(&self, offset_from_newest: u64) -> Option<VwapPoint> {
        let size = self.size() as u64;
        if offset_from_newest >= size {
            return None;
        }
        let seq = self.guard.next_seq - 1 - offset_from_newest;
        let idx = (seq % self.guard.capacity as u64) as usize;
        Some(self.guard.points[idx])
    }
}

impl VwapHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                points: vec![VwapPoint::default(); capacity],
                capacity,
                next_seq: 0,
            }),
        }
    }

    pub fn append(&self, minute_ts_ms: i64, vwap: f64) {
        let mut inner = self.inner.lock().unwrap();
        let idx = (inner.next_seq % inner.capacity as u64) as usize;
        inner.points[idx] = VwapPoint {
            minute_ts_ms,
            vwap,
        };
        inner.next_seq += 1;
    }

    /// Returns the last `n` points in insertion order, or `false` if
    /// fewer than `n` are resident (`out` left untouched in that case).
    pub fn get_recent(&self, n: usize, out: &mut [VwapPoint]) -> bool {
        let inner = self.inner.lock().unwrap();
        let size = inner.next_seq.min(inner.capacity as u64);
        if (size as usize) < n {
            return false;
        }
        let start_seq = inner.next_seq - n as u64;
        for k in 0..n {
            let idx = ((start_seq + k as u64) % inner.capacity as u64) as usize;
            out[k] = inner.points[idx];
        }
        true
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.next_seq.min(inner.capacity as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the ring for the duration of `f`, matching the spec's
    /// requirement that a target history's mutex is held across the
    /// entire per-target lagged search, not just a single read.
    pub fn with_view<R>(&self, f: impl FnOnce(&HistoryView) -> R) -> R {
        let guard = self.inner.lock().unwrap();
        let view = HistoryView { guard };
        f(&view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_get_recent_in_order() {
        let h = VwapHistory::new(4);
        for i in 0..4 {
            h.append(i * 60_000, i as f64);
        }
        let mut out = [VwapPoint::default(); 4];
        assert!(h.get_recent(4, &mut out));
        assert_eq!(out.map(|p| p.vwap), [0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn get_recent_fails_when_insufficient_history() {
        let h = VwapHistory::new(8);
        h.append(0, 1.0);
        let mut out = [VwapPoint::default(); 4];
        assert!(!h.get_recent(4, &mut out));
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let h = VwapHistory::new(3);
        for i in 0..5 {
            h.append(i * 60_000, i as f64);
        }
        assert_eq!(h.len(), 3);
        let mut out = [VwapPoint::default(); 3];
        assert!(h.get_recent(3, &mut out));
        assert_eq!(out.map(|p| p.vwap), [2.0, 3.0, 4.0]);
    }

    #[test]
    fn get_from_newest_walks_backward() {
        let h = VwapHistory::new(16);
        for i in 1..=16 {
            h.append(i * 60_000, i as f64);
        }
        h.with_view(|view| {
            assert_eq!(view.size(), 16);
            assert_eq!(view.get_from_newest(0).unwrap().vwap, 16.0);
            assert_eq!(view.get_from_newest(15).unwrap().vwap, 1.0);
            assert!(view.get_from_newest(16).is_none());
        });
    }
}
