use crate::engine::Engine;
use tidepool_perf::{PerfRecorder, PerfStage};

/// Pops raw messages off the ring and turns the ones that parse into
/// window updates. Never aborts on a bad message; discards and
/// continues per the parse-failure taxonomy in §7.
pub fn run_processor(engine: &Engine) {
    let mut perf = PerfRecorder::new();
    loop {
        perf.begin(PerfStage::Dequeue);
        let popped = engine.ring.pop(engine.shutdown_flag());
        perf.end(PerfStage::Dequeue);
        let Some(msg) = popped else {
            break;
        };
        let raw = msg.raw_str();

        perf.begin(PerfStage::ParseFrame);
        let parse_result = tidepool_parse::parse_frame(raw, &engine.symbols);
        perf.end(PerfStage::ParseFrame);
        let parsed = match parse_result {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(%err, "discarding unparsable frame");
                continue;
            }
        };

        let _ = engine.sinks.log_trade_raw(parsed.symbol_id, raw);

        let process_ts_ms = engine.clock.now_ms();
        let _ = engine.sinks.log_latency(
            parsed.symbol_id,
            parsed.exchange_ts_ms,
            msg.receive_ts_ms,
            process_ts_ms,
        );

        let exchange_ts_ms = parsed
            .exchange_ts_ms
            .unwrap_or_else(|| engine.clock.now_ms());
        perf.begin(PerfStage::WindowUpdate);
        engine.windows[parsed.symbol_id.index()].add_trade(
            exchange_ts_ms,
            parsed.price,
            parsed.size,
        );
        perf.end(PerfStage::WindowUpdate);
    }
}
