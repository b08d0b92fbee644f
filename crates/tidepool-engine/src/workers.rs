use crate::engine::Engine;
use tidepool_events::{MOVING_AVG_POINTS, N_SYMBOLS, SymbolId, VwapPoint};
use tidepool_perf::{PerfRecorder, PerfStage};

/// On each tick: snapshots every symbol's trade-window VWAP (including
/// NaN for an empty window), appends it to that symbol's history, and
/// emits a record. Rendezvouses with the correlation worker before the
/// done barrier so every append happens-before any correlation read.
pub fn run_vwap_worker(engine: &Engine) {
    let mut perf = PerfRecorder::new();
    loop {
        engine.tick_start.wait();
        if engine.is_shutdown() {
            engine.tick_done.wait();
            break;
        }

        perf.begin(PerfStage::VwapSnapshot);
        let minute_ts_ms = engine.current_minute_ms();
        for idx in 0..N_SYMBOLS {
            let vwap = engine.windows[idx].snapshot_vwap();
            engine.histories[idx].append(minute_ts_ms, vwap);
            let _ = engine
                .sinks
                .log_vwap(SymbolId(idx as u16), minute_ts_ms, vwap);
        }
        perf.end(PerfStage::VwapSnapshot);

        engine.vwap_before_correlation.wait();
        engine.tick_done.wait();
    }
}

/// On each tick, after the VWAP worker has appended every symbol's
/// point for the current minute: runs the lagged correlation search for
/// each symbol as source and emits the single best candidate, if any.
pub fn run_correlation_worker(engine: &Engine) {
    let mut perf = PerfRecorder::new();
    loop {
        engine.tick_start.wait();
        if engine.is_shutdown() {
            engine.tick_done.wait();
            break;
        }

        engine.vwap_before_correlation.wait();

        perf.begin(PerfStage::CorrelationSearch);
        let minute_ts_ms = engine.current_minute_ms();
        let mut recent = [VwapPoint::default(); MOVING_AVG_POINTS];
        for idx in 0..N_SYMBOLS {
            let source_id = SymbolId(idx as u16);
            if !engine.histories[idx].get_recent(MOVING_AVG_POINTS, &mut recent) {
                continue;
            }
            let source_vec: [f64; MOVING_AVG_POINTS] = std::array::from_fn(|k| recent[k].vwap);

            if let Some(candidate) =
                tidepool_correlate::best_lagged_correlation(source_id, &source_vec, &engine.histories)
            {
                let peer_name = engine.symbols.name(candidate.target_symbol);
                let _ = engine.sinks.log_correlation(
                    source_id,
                    minute_ts_ms,
                    peer_name,
                    candidate.r,
                    candidate.target_end_minute_ts_ms,
                );
            }
        }
        perf.end(PerfStage::CorrelationSearch);

        engine.tick_done.wait();
    }
}
