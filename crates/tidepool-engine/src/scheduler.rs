use std::time::Duration;

use crate::engine::Engine;
use tidepool_perf::{PerfRecorder, PerfStage};

const PERIOD_NS: u64 = 60_000_000_000;
const EMA_ALPHA: f64 = 0.2;
const EMA_MAX_NS: f64 = 100_000_000.0;
const SLEEP_CHUNK_NS: u64 = 50_000_000;

/// Drives the minute-boundary tick: sleeps to an EMA-compensated absolute
/// monotonic deadline, then rendezvouses with the two workers across the
/// start/done barrier pair. On shutdown, performs one final barrier pair
/// so a worker already past its start-barrier check never waits alone.
pub fn run_scheduler(engine: &Engine) {
    let mut perf = PerfRecorder::new();
    let mut ema_duration_ns: f64 = 0.0;
    let mut scheduled_ns = next_multiple_strictly_greater(engine.clock.now_ns(), PERIOD_NS);

    loop {
        if !engine.is_shutdown() {
            let mut now_ns = engine.clock.now_ns();
            while scheduled_ns <= now_ns {
                scheduled_ns += PERIOD_NS;
            }

            let compensation_ns = ema_duration_ns.round() as u64;
            let mut target_wakeup_ns = scheduled_ns.saturating_sub(compensation_ns);
            now_ns = engine.clock.now_ns();
            if target_wakeup_ns <= now_ns {
                tracing::warn!(scheduled_ns, now_ns, "scheduler missed its wakeup target");
                target_wakeup_ns = now_ns;
            }

            sleep_until(engine, target_wakeup_ns);
        }

        // Re-read after `sleep_until`, which can return early on shutdown:
        // this is the single observation point both the barrier entry and
        // the post-barrier break decide against, kept in sync with the
        // workers' own fresh read right after `tick_start.wait()`.
        let shutting_down = engine.is_shutdown();

        let minute_ts_ms = tidepool_clock::minute_floor_ms(engine.clock.now_ms());
        engine.set_current_minute_ms(minute_ts_ms);

        perf.begin(PerfStage::SchedulerWork);
        engine.tick_start.wait();
        let work_start_ns = engine.clock.now_ns();

        engine.tick_done.wait();
        perf.end(PerfStage::SchedulerWork);

        if shutting_down {
            break;
        }

        let work_duration_ns = engine.clock.now_ns().saturating_sub(work_start_ns);
        ema_duration_ns =
            (EMA_ALPHA * work_duration_ns as f64 + (1.0 - EMA_ALPHA) * ema_duration_ns)
                .clamp(0.0, EMA_MAX_NS);

        let actual_ms = engine.clock.now_ms();
        let drift_ms = actual_ms - minute_ts_ms;
        let _ = engine.sinks.log_scheduler(minute_ts_ms, actual_ms, drift_ms);
        log_system_telemetry(engine, actual_ms);

        scheduled_ns += PERIOD_NS;
    }
}

fn next_multiple_strictly_greater(value_ns: u64, period_ns: u64) -> u64 {
    (value_ns / period_ns + 1) * period_ns
}

fn sleep_until(engine: &Engine, target_ns: u64) {
    loop {
        if engine.is_shutdown() {
            return;
        }
        let now = engine.clock.now_ns();
        if now >= target_ns {
            return;
        }
        let chunk = (target_ns - now).min(SLEEP_CHUNK_NS);
        std::thread::sleep(Duration::from_nanos(chunk));
    }
}

fn log_system_telemetry(engine: &Engine, ts_ms: i64) {
    use std::sync::{Mutex, OnceLock};
    use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

    static SYSTEM: OnceLock<Mutex<System>> = OnceLock::new();
    let mut system = SYSTEM.get_or_init(|| Mutex::new(System::new())).lock().unwrap();

    let pid = Pid::from_u32(std::process::id());
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        ProcessRefreshKind::new().with_cpu().with_memory(),
    );

    let Some(process) = system.process(pid) else {
        return;
    };
    let cpu_pct = process.cpu_usage() as f64;
    let memory_mb = process.memory() as f64 / (1024.0 * 1024.0);
    let _ = engine.sinks.log_system(ts_ms, cpu_pct, memory_mb);
}
