/// A single parsed trade, as it is inserted into a symbol's sliding window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trade {
    pub trade_ts_ms: i64,
    pub price: f64,
    pub size: f64,
}

/// One resident point of a symbol's per-minute VWAP history.
///
/// `vwap` is NaN when the minute's underlying window held no trades; the
/// point is still appended so history size tracks elapsed minutes exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VwapPoint {
    pub minute_ts_ms: i64,
    pub vwap: f64,
}

impl Default for VwapPoint {
    fn default() -> Self {
        Self {
            minute_ts_ms: 0,
            vwap: f64::NAN,
        }
    }
}
