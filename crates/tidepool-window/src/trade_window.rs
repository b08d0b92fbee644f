use std::sync::Mutex;
use tidepool_events::Trade;

struct Inner {
    trades: Vec<Trade>,
    head: usize,
    tail: usize,
    size: usize,
    capacity: usize,
    window_ms: i64,
    sum_price_volume: f64,
    sum_volume: f64,
}

impl Inner {
    fn evict_oldest(&mut self) {
        let oldest = self.trades[self.head];
        self.sum_price_volume -= oldest.price * oldest.size;
        self.sum_volume -= oldest.size;
        self.head = (self.head + 1) % self.capacity;
        self.size -= 1;
    }
}

/// A symbol's bounded ring of timestamped trades with running sums for
/// O(1) VWAP. A trade older than `window_ms` relative to the *newest*
/// inserted trade is evicted; out-of-order arrivals are accepted but
/// evicted only once a later insert moves the cutoff past them (the
/// window is referenced to the newest seen timestamp, not the wall
/// clock).
pub struct TradeWindow {
    inner: Mutex<Inner>,
}

impl TradeWindow {
    pub fn new(capacity: usize, window_ms: i64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                trades: vec![
                    Trade {
                        trade_ts_ms: 0,
                        price: 0.0,
                        size: 0.0
                    };
                    capacity
                ],
                head: 0,
                tail: 0,
                size: 0,
                capacity,
                window_ms,
                sum_price_volume: 0.0,
                sum_volume: 0.0,
            }),
        }
    }

    pub fn add_trade(&self, ts_ms: i64, price: f64, size: f64) {
        let mut inner = self.inner.lock().unwrap();
        let cutoff = ts_ms - inner.window_ms;

        while inner.size > 0 && inner.trades[inner.head].trade_ts_ms < cutoff {
            inner.evict_oldest();
        }
        if inner.size == inner.capacity {
            inner.evict_oldest();
        }

        let tail = inner.tail;
        inner.trades[tail] = Trade {
            trade_ts_ms: ts_ms,
            price,
            size,
        };
        inner.tail = (tail + 1) % inner.capacity;
        inner.size += 1;
        inner.sum_price_volume += price * size;
        inner.sum_volume += size;
    }

    pub fn snapshot_vwap(&self) -> f64 {
        let inner = self.inner.lock().unwrap();
        if inner.sum_volume > 0.0 {
            inner.sum_price_volume / inner.sum_volume
        } else {
            f64::NAN
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW_CAPACITY: usize = 50_000;
    const WINDOW_MS: i64 = 900_000;

    #[test]
    fn single_symbol_vwap() {
        // S1: trades (1000,100,2), (2000,110,3), (3000,120,5).
        let w = TradeWindow::new(WINDOW_CAPACITY, WINDOW_MS);
        w.add_trade(1_000, 100.0, 2.0);
        w.add_trade(2_000, 110.0, 3.0);
        w.add_trade(3_000, 120.0, 5.0);
        let vwap = w.snapshot_vwap();
        assert!((vwap - 113.0).abs() < 1e-9);
    }

    #[test]
    fn sliding_eviction() {
        // S2: WINDOW_MS=60000, insert (0,100,1), then (60001,200,1).
        let w = TradeWindow::new(WINDOW_CAPACITY, 60_000);
        w.add_trade(0, 100.0, 1.0);
        w.add_trade(60_001, 200.0, 1.0);
        assert_eq!(w.snapshot_vwap(), 200.0);
        let inner = w.inner.lock().unwrap();
        assert_eq!(inner.sum_volume, 1.0);
    }

    #[test]
    fn empty_window_snapshots_nan() {
        let w = TradeWindow::new(WINDOW_CAPACITY, WINDOW_MS);
        assert!(w.snapshot_vwap().is_nan());
    }

    #[test]
    fn capacity_eviction_bounds_size() {
        let w = TradeWindow::new(4, WINDOW_MS);
        for i in 0..10 {
            w.add_trade(i * 1000, 1.0, 1.0);
        }
        assert_eq!(w.len(), 4);
    }

    #[test]
    fn running_sums_match_brute_force() {
        let w = TradeWindow::new(WINDOW_CAPACITY, WINDOW_MS);
        let trades = [
            (1_000i64, 50.0, 1.0),
            (2_000, 55.0, 2.0),
            (3_000, 45.0, 1.5),
            (4_000, 60.0, 0.5),
        ];
        for (ts, p, s) in trades {
            w.add_trade(ts, p, s);
        }
        let expected_pv: f64 = trades.iter().map(|(_, p, s)| p * s).sum();
        let expected_v: f64 = trades.iter().map(|(_, _, s)| s).sum();
        let vwap = w.snapshot_vwap();
        assert!((vwap - expected_pv / expected_v).abs() < 1e-9 * expected_pv.abs());
    }
}
