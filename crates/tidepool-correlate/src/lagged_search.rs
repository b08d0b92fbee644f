use crate::pearson::pearson;
use tidepool_events::{MAX_LAG_MINUTES, MOVING_AVG_POINTS, SymbolId};
use tidepool_window::VwapHistory;

/// A winning lagged match: correlating `source_id`'s recent VWAPs against
/// `target_symbol`'s history `offset` minutes back produced `r`, and the
/// newest point of that target window fell on `target_end_minute_ts_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationCandidate {
    pub target_symbol: SymbolId,
    pub r: f64,
    pub target_end_minute_ts_ms: i64,
}

/// For `source_id`, whose most recent `MOVING_AVG_POINTS` VWAPs are
/// `source_vec` (oldest to newest), searches every symbol's history for
/// the lag that maximizes `|r|` and returns the single best candidate
/// across all targets, or `None` if no target produced a non-NaN result.
///
/// Each target's history mutex is held for that target's entire offset
/// loop (via `with_view`), so a correlation against a peer currently
/// being appended to is never observed half-updated. The target vector
/// is built in a thread-local, fixed-size array — no heap allocation on
/// this hot path.
pub fn best_lagged_correlation(
    source_id: SymbolId,
    source_vec: &[f64; MOVING_AVG_POINTS],
    histories: &[VwapHistory],
) -> Option<CorrelationCandidate> {
    let mut best: Option<CorrelationCandidate> = None;

    for (j, history) in histories.iter().enumerate() {
        let target_id = SymbolId(j as u16);
        let min_offset: u64 = if target_id == source_id {
            MOVING_AVG_POINTS as u64
        } else {
            0
        };

        let candidate = history.with_view(|view| {
            let history_size = view.size() as u64;
            if history_size < MOVING_AVG_POINTS as u64 + min_offset {
                return None;
            }
            let max_offset =
                (MAX_LAG_MINUTES as u64).min(history_size - MOVING_AVG_POINTS as u64);

            let mut target_buf = [0.0f64; MOVING_AVG_POINTS];
            let mut best_abs = -1.0f64;
            let mut best_here: Option<(f64, i64)> = None;

            let mut offset = min_offset;
            while offset <= max_offset {
                for k in 0..MOVING_AVG_POINTS {
                    let offset_from_newest = offset + (MOVING_AVG_POINTS - 1 - k) as u64;
                    target_buf[k] = view.get_from_newest(offset_from_newest).unwrap().vwap;
                }
                let r = pearson(source_vec, &target_buf);
                if !r.is_nan() && r.abs() > best_abs {
                    best_abs = r.abs();
                    let end_point = view.get_from_newest(offset).unwrap();
                    best_here = Some((r, end_point.minute_ts_ms));
                }
                offset += 1;
            }

            best_here.map(|(r, end_ts)| CorrelationCandidate {
                target_symbol: target_id,
                r,
                target_end_minute_ts_ms: end_ts,
            })
        });

        if let Some(c) = candidate {
            let replace = match best {
                None => true,
                Some(cur) => c.r.abs() > cur.r.abs(),
            };
            if replace {
                best = Some(c);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_ascending(history: &VwapHistory, count: i64) {
        for i in 1..=count {
            history.append(i * 60_000, i as f64);
        }
    }

    #[test]
    fn self_lag_perfect_match() {
        // S5: symbol 0's history holds [1..16]; source vector is [9..16];
        // best self-lag match is offset=8, target vector [1..8], r=1.0.
        let histories: Vec<VwapHistory> = (0..8).map(|_| VwapHistory::new(68)).collect();
        seed_ascending(&histories[0], 16);

        let source_vec: [f64; MOVING_AVG_POINTS] = std::array::from_fn(|k| (9 + k) as f64);
        let result = best_lagged_correlation(SymbolId(0), &source_vec, &histories).unwrap();

        assert_eq!(result.target_symbol, SymbolId(0));
        assert!((result.r - 1.0).abs() < 1e-9);
        assert_eq!(result.target_end_minute_ts_ms, 8 * 60_000);
    }

    #[test]
    fn insufficient_history_yields_no_record() {
        // S6: history shorter than MOVING_AVG_POINTS produces no candidate.
        let histories: Vec<VwapHistory> = (0..8).map(|_| VwapHistory::new(68)).collect();
        seed_ascending(&histories[0], 3);

        let source_vec = [1.0; MOVING_AVG_POINTS];
        assert!(best_lagged_correlation(SymbolId(0), &source_vec, &histories).is_none());
    }

    #[test]
    fn cross_symbol_best_match_picked_over_weaker_ones() {
        let histories: Vec<VwapHistory> = (0..8).map(|_| VwapHistory::new(68)).collect();
        seed_ascending(&histories[0], 16);
        seed_ascending(&histories[1], 16);
        // Symbol 2 is flat: zero variance, correlation is NaN and must be
        // skipped in favor of the real match on symbol 1.
        for i in 1..=16 {
            histories[2].append(i * 60_000, 42.0);
        }

        let source_vec: [f64; MOVING_AVG_POINTS] = std::array::from_fn(|k| (9 + k) as f64);
        let result = best_lagged_correlation(SymbolId(0), &source_vec, &histories).unwrap();
        assert_ne!(result.target_symbol, SymbolId(2));
    }
}
