#![forbid(unsafe_code)]

//! Plain-old-data event types shared by every stage of the pipeline.
//! Kept dependency-free so every other crate can depend on it without
//! pulling in anything heavier.

pub mod raw_message;
pub mod symbol;
pub mod trade;

pub use raw_message::{RAW_TEXT_CAP, RawMessage};
pub use symbol::SymbolId;
pub use trade::{Trade, VwapPoint};

/// Number of tracked instruments, fixed at compile time.
pub const N_SYMBOLS: usize = 8;

/// Trailing span of the per-symbol trade sliding window.
pub const WINDOW_MINUTES: i64 = 15;
/// Trade capacity of a symbol's sliding window; in practice a 15-minute
/// window rarely approaches this, but it bounds memory under anomalies.
pub const WINDOW_CAPACITY: usize = 50_000;
/// `WINDOW_MINUTES` expressed in milliseconds.
pub const WINDOW_MS: i64 = WINDOW_MINUTES * 60_000;

/// Length of the source/target vectors the correlation search compares.
pub const MOVING_AVG_POINTS: usize = 8;
/// Largest lag, in minutes, the correlation search will consider.
pub const MAX_LAG_MINUTES: usize = 60;
/// VWAP history ring capacity: enough lag room plus one full comparison
/// window.
pub const HISTORY_CAPACITY: usize = MAX_LAG_MINUTES + MOVING_AVG_POINTS;

/// Bounded message ring capacity between ingest and the processor.
pub const QUEUE_CAPACITY: usize = 1024;
