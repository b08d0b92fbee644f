//! Monotonic and wall-clock time helpers, plus an injectable `Clock` trait
//! so the scheduler's minute cadence can be driven deterministically in
//! tests instead of waiting on real wall-clock minutes.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(target_os = "macos")]
use std::sync::OnceLock;

/// Current monotonic time in nanoseconds. Never goes backwards, unaffected
/// by wall-clock adjustments (NTP, leap seconds, manual changes).
#[inline(always)]
#[cfg(target_os = "macos")]
#[allow(deprecated)]
pub fn now_ns() -> u64 {
    static TIMEBASE: OnceLock<(u64, u64)> = OnceLock::new();
    let (numer, denom) = *TIMEBASE.get_or_init(|| {
        let mut info = libc::mach_timebase_info_data_t { numer: 0, denom: 0 };
        let rc = unsafe { libc::mach_timebase_info(&mut info) };
        if rc != 0 || info.denom == 0 {
            (1, 1)
        } else {
            (info.numer as u64, info.denom as u64)
        }
    });
    let t = unsafe { libc::mach_absolute_time() } as u128;
    ((t * numer as u128) / denom as u128) as u64
}

#[inline(always)]
#[cfg(not(target_os = "macos"))]
pub fn now_ns() -> u64 {
    let mut ts: libc::timespec = unsafe { core::mem::zeroed() };
    unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
    ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[inline(always)]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis() as i64
}

/// Floors a wall-clock millisecond timestamp to the minute boundary at or
/// before it.
#[inline(always)]
pub fn minute_floor_ms(ms: i64) -> i64 {
    (ms.div_euclid(60_000)) * 60_000
}

/// Renders a minute-boundary timestamp as `YYYY-MM-DDTHH:MM` (UTC), for
/// log lines and sink records where a human-readable minute is useful
/// alongside the raw millisecond value.
pub fn iso_minute_string(minute_ts_ms: i64) -> String {
    let total_minutes = minute_ts_ms.div_euclid(60_000);
    let days = total_minutes.div_euclid(1440);
    let minute_of_day = total_minutes.rem_euclid(1440);
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}",
        hour = minute_of_day / 60,
        minute = minute_of_day % 60
    )
}

/// Howard Hinnant's days-from-civil inverse: converts a day count since the
/// Unix epoch into a proleptic-Gregorian (year, month, day) triple, without
/// pulling in a date/time dependency for one formatting helper.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Abstraction over time so the scheduler can be driven by a synthetic
/// clock in tests (see `TestClock`) instead of real wall-clock minutes.
pub trait Clock: Send + Sync {
    fn now_ns(&self) -> u64;
    fn now_ms(&self) -> i64;
}

/// The real system clock: monotonic nanoseconds plus wall-clock
/// milliseconds, exactly the free functions above.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ns(&self) -> u64 {
        now_ns()
    }
    fn now_ms(&self) -> i64 {
        now_ms()
    }
}

/// A manually-advanced clock for deterministic scheduler tests. Monotonic
/// and wall time are tracked independently so a test can advance one
/// without drifting the other unless it chooses to.
pub struct TestClock {
    monotonic_ns: AtomicU64,
    wall_ms: AtomicI64,
}

impl TestClock {
    pub fn new(start_ns: u64, start_ms: i64) -> Self {
        Self {
            monotonic_ns: AtomicU64::new(start_ns),
            wall_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn advance_ns(&self, delta_ns: u64) {
        self.monotonic_ns.fetch_add(delta_ns, Ordering::SeqCst);
        self.wall_ms
            .fetch_add((delta_ns / 1_000_000) as i64, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now_ns(&self) -> u64 {
        self.monotonic_ns.load(Ordering::SeqCst)
    }
    fn now_ms(&self) -> i64 {
        self.wall_ms.load(Ordering::SeqCst)
    }
}
