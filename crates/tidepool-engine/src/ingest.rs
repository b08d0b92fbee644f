use crate::engine::Engine;
use tidepool_events::RawMessage;
use tidepool_perf::{PerfRecorder, PerfStage};

/// Called directly from the transport callback for every inbound frame.
/// Performs no parsing; the goal is minimum time on the transport thread.
pub fn ingest(engine: &Engine, frame: &str, perf: &mut PerfRecorder) {
    perf.begin(PerfStage::Ingest);
    let receive_ts_ms = engine.clock.now_ms();
    let message = RawMessage::from_frame(frame, receive_ts_ms);
    perf.end(PerfStage::Ingest);

    perf.begin(PerfStage::Enqueue);
    engine.ring.push(message);
    perf.end(PerfStage::Enqueue);
}
