use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Barrier};

use tidepool_clock::{Clock, SystemClock};
use tidepool_events::N_SYMBOLS;
use tidepool_icc::MessageRing;
use tidepool_parse::SymbolTable;
use tidepool_sinks::Sinks;
use tidepool_window::{TradeWindow, VwapHistory};

/// Everything the pipeline's threads share, constructed once at startup
/// and owned by `main`. Replaces the teacher's process-wide globals
/// (symbol table, shared ring, barriers, current-minute value) with one
/// value threaded into each stage at spawn time.
pub struct Engine {
    pub ring: MessageRing,
    pub windows: [TradeWindow; N_SYMBOLS],
    pub histories: [VwapHistory; N_SYMBOLS],
    pub symbols: SymbolTable,
    pub sinks: Arc<dyn Sinks>,
    pub clock: Arc<dyn Clock>,

    /// Set once, monotonically, by the signal handler or a test driver.
    /// Read without a lock everywhere else.
    shutdown: AtomicBool,

    /// The tick's canonical minute timestamp, published by the scheduler
    /// before the start barrier and read by both workers after it.
    current_minute_ms: AtomicI64,

    /// Scheduler + VWAP worker + correlation worker rendezvous at the
    /// start and end of every tick.
    pub tick_start: Barrier,
    pub tick_done: Barrier,
    /// VWAP worker and correlation worker only: ensures every symbol's
    /// VWAP for the current minute is appended before any correlation
    /// search reads a history (see the worker-ordering note).
    pub vwap_before_correlation: Barrier,
}

impl Engine {
    pub fn new(
        queue_capacity: usize,
        symbols: SymbolTable,
        sinks: Arc<dyn Sinks>,
    ) -> Self {
        Self::with_clock(queue_capacity, symbols, sinks, Arc::new(SystemClock))
    }

    pub fn with_clock(
        queue_capacity: usize,
        symbols: SymbolTable,
        sinks: Arc<dyn Sinks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ring: MessageRing::new(queue_capacity),
            windows: std::array::from_fn(|_| {
                TradeWindow::new(tidepool_events::WINDOW_CAPACITY, tidepool_events::WINDOW_MS)
            }),
            histories: std::array::from_fn(|_| VwapHistory::new(tidepool_events::HISTORY_CAPACITY)),
            symbols,
            sinks,
            clock,
            shutdown: AtomicBool::new(false),
            current_minute_ms: AtomicI64::new(0),
            tick_start: Barrier::new(3),
            tick_done: Barrier::new(3),
            vwap_before_correlation: Barrier::new(2),
        }
    }

    /// Set by the signal handler (or a test harness). Monotonic
    /// false -> true; never reset.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.ring.notify_shutdown();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn shutdown_flag(&self) -> &AtomicBool {
        &self.shutdown
    }

    pub fn current_minute_ms(&self) -> i64 {
        self.current_minute_ms.load(Ordering::Acquire)
    }

    pub fn set_current_minute_ms(&self, minute_ts_ms: i64) {
        self.current_minute_ms.store(minute_ts_ms, Ordering::Release);
    }
}
