//! Per-symbol state: the trade sliding window feeding O(1) incremental
//! VWAP, and the per-minute VWAP history ring the correlation search
//! reads from.

pub mod trade_window;
pub mod vwap_history;

pub use trade_window::TradeWindow;
pub use vwap_history::{HistoryView, VwapHistory};
