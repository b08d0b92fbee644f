//! The consolidated engine: owns every shared resource (the message
//! ring, per-symbol windows and histories, the barriers, the shutdown
//! flag) and the five stage loops that run on top of it.

mod engine;
mod error;
mod ingest;
mod processor;
mod scheduler;
mod workers;

pub use engine::Engine;
pub use error::EngineError;
pub use ingest::ingest;
pub use processor::run_processor;
pub use scheduler::run_scheduler;
pub use workers::{run_correlation_worker, run_vwap_worker};

use std::sync::Arc;
use std::thread::JoinHandle;

use tidepool_transport::Transport;

/// Spawns the processor, scheduler, and worker threads and returns their
/// handles. The caller owns the transport thread(s) separately, since
/// the number and kind of transports is a deployment concern (see
/// `bins/tidepool`), not a fixed part of the engine.
pub fn spawn_stage_threads(engine: Arc<Engine>) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(4);

    let processor_engine = Arc::clone(&engine);
    handles.push(
        std::thread::Builder::new()
            .name("processor".into())
            .spawn(move || run_processor(&processor_engine))
            .expect("failed to spawn processor thread"),
    );

    let scheduler_engine = Arc::clone(&engine);
    handles.push(
        std::thread::Builder::new()
            .name("scheduler".into())
            .spawn(move || run_scheduler(&scheduler_engine))
            .expect("failed to spawn scheduler thread"),
    );

    let vwap_engine = Arc::clone(&engine);
    handles.push(
        std::thread::Builder::new()
            .name("vwap-worker".into())
            .spawn(move || run_vwap_worker(&vwap_engine))
            .expect("failed to spawn vwap worker thread"),
    );

    let correlation_engine = Arc::clone(&engine);
    handles.push(
        std::thread::Builder::new()
            .name("correlation-worker".into())
            .spawn(move || run_correlation_worker(&correlation_engine))
            .expect("failed to spawn correlation worker thread"),
    );

    handles
}

/// Spawns one thread per transport, driving frames straight into
/// `ingest`. Each transport already owns its own reconnect/backoff loop
/// internally (see `tidepool-transport`), so this loop is just a pump.
pub fn spawn_transport_thread(
    engine: Arc<Engine>,
    mut transport: Box<dyn Transport>,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("transport".into())
        .spawn(move || {
            let mut perf = tidepool_perf::PerfRecorder::new();
            while let Some(frame) = transport.next_frame() {
                if engine.is_shutdown() {
                    break;
                }
                ingest(&engine, &frame, &mut perf);
            }
        })
        .expect("failed to spawn transport thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use tidepool_clock::{Clock, TestClock};
    use tidepool_events::{MOVING_AVG_POINTS, N_SYMBOLS, QUEUE_CAPACITY, SymbolId};
    use tidepool_parse::SymbolTable;
    use tidepool_sinks::Sinks;
    use tidepool_transport::TestTransport;

    struct NullSinks;
    impl Sinks for NullSinks {
        fn log_trade_raw(&self, _: SymbolId, _: &str) -> std::io::Result<()> {
            Ok(())
        }
        fn log_latency(&self, _: SymbolId, _: Option<i64>, _: i64, _: i64) -> std::io::Result<()> {
            Ok(())
        }
        fn log_vwap(&self, _: SymbolId, _: i64, _: f64) -> std::io::Result<()> {
            Ok(())
        }
        fn log_correlation(
            &self,
            _: SymbolId,
            _: i64,
            _: &str,
            _: f64,
            _: i64,
        ) -> std::io::Result<()> {
            Ok(())
        }
        fn log_scheduler(&self, _: i64, _: i64, _: i64) -> std::io::Result<()> {
            Ok(())
        }
        fn log_system(&self, _: i64, _: f64, _: f64) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn test_engine() -> Arc<Engine> {
        let symbols = SymbolTable::new(std::array::from_fn(|i| format!("SYM{i}")));
        let clock = Arc::new(TestClock::new(0, 0));
        Arc::new(Engine::with_clock(
            QUEUE_CAPACITY,
            symbols,
            Arc::new(NullSinks),
            clock,
        ))
    }

    #[test]
    fn s1_single_symbol_vwap_through_ingest_and_processor() {
        let engine = test_engine();
        let mut perf = tidepool_perf::PerfRecorder::new();
        for (ts, px, sz) in [(1_000, "100", "2"), (2_000, "110", "3"), (3_000, "120", "5")] {
            let frame = format!(r#"{{"instId":"SYM0","px":"{px}","sz":"{sz}","ts":"{ts}"}}"#);
            ingest(&engine, &frame, &mut perf);
        }
        engine.request_shutdown();
        run_processor(&engine);

        let vwap = engine.windows[0].snapshot_vwap();
        assert!((vwap - 113.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_symbol_is_discarded_without_stopping_the_processor() {
        let engine = test_engine();
        let mut perf = tidepool_perf::PerfRecorder::new();
        ingest(&engine, r#"{"instId":"NOPE","px":"1.0","sz":"1.0","ts":"1"}"#, &mut perf);
        ingest(&engine, r#"{"instId":"SYM0","px":"5.0","sz":"1.0","ts":"2"}"#, &mut perf);
        engine.request_shutdown();
        run_processor(&engine);

        assert_eq!(engine.windows[0].len(), 1);
    }

    /// S4: drives three ticks through a synthetic clock via a
    /// `TestTransport` with no frames, and checks the minute sequence
    /// the scheduler publishes is three consecutive multiples of 60000.
    #[test]
    fn s4_minute_cadence_with_synthetic_clock() {
        let symbols = SymbolTable::new(std::array::from_fn(|i| format!("SYM{i}")));
        let clock = Arc::new(TestClock::new(0, 0));
        let engine = Arc::new(Engine::with_clock(
            QUEUE_CAPACITY,
            symbols,
            Arc::new(NullSinks),
            clock.clone(),
        ));

        let mut transport = TestTransport::new(vec![]);
        transport.connect().unwrap();

        let processor_engine = Arc::clone(&engine);
        let processor_handle = std::thread::spawn(move || run_processor(&processor_engine));
        let vwap_engine = Arc::clone(&engine);
        let vwap_handle = std::thread::spawn(move || run_vwap_worker(&vwap_engine));
        let correlation_engine = Arc::clone(&engine);
        let correlation_handle =
            std::thread::spawn(move || run_correlation_worker(&correlation_engine));

        let mut minutes = Vec::new();
        for _ in 0..3 {
            clock.advance_ns(60_000_000_000);
            let minute_ts_ms = tidepool_clock::minute_floor_ms(clock.now_ms());
            engine.set_current_minute_ms(minute_ts_ms);
            engine.tick_start.wait();
            minutes.push(engine.current_minute_ms());
            engine.tick_done.wait();
        }

        engine.request_shutdown();
        engine.tick_start.wait();
        engine.tick_done.wait();

        processor_handle.join().unwrap();
        vwap_handle.join().unwrap();
        correlation_handle.join().unwrap();

        assert_eq!(minutes.len(), 3);
        for m in &minutes {
            assert_eq!(m % 60_000, 0);
        }
        assert!(minutes[1] > minutes[0]);
        assert!(minutes[2] > minutes[1]);
    }

    #[test]
    fn shutdown_releases_waiting_processor() {
        let engine = test_engine();
        let handle = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || run_processor(&engine))
        };
        std::thread::sleep(std::time::Duration::from_millis(20));
        engine.request_shutdown();
        handle.join().unwrap();
        assert!(engine.shutdown_flag().load(Ordering::Acquire));
    }

    #[test]
    fn moving_avg_points_fits_history_capacity() {
        assert!(MOVING_AVG_POINTS <= tidepool_events::HISTORY_CAPACITY);
        assert_eq!(N_SYMBOLS, 8);
    }
}
