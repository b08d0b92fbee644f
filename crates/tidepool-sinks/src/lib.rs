//! Durable output sinks: raw trade text, latency samples, per-minute VWAP
//! and correlation records, and scheduler/system telemetry.
//!
//! `FileSinks` opens one append-mode file per (symbol, stream) under
//! `log_dir` the first time that stream is written, matching
//! `JsonlWriter`'s lazy-open-then-reuse pattern. CSV streams write a
//! header row exactly once, when the file is created.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tidepool_events::{N_SYMBOLS, SymbolId};

pub trait Sinks: Send + Sync {
    fn log_trade_raw(&self, symbol_id: SymbolId, raw_text: &str) -> io::Result<()>;

    fn log_latency(
        &self,
        symbol_id: SymbolId,
        exchange_ts_ms: Option<i64>,
        recv_ts_ms: i64,
        process_ts_ms: i64,
    ) -> io::Result<()>;

    fn log_vwap(&self, symbol_id: SymbolId, minute_ts_ms: i64, vwap: f64) -> io::Result<()>;

    fn log_correlation(
        &self,
        symbol_id: SymbolId,
        minute_ts_ms: i64,
        peer_symbol_name: &str,
        r: f64,
        peer_end_minute_ts_ms: i64,
    ) -> io::Result<()>;

    fn log_scheduler(&self, scheduled_ms: i64, actual_ms: i64, drift_ms: i64) -> io::Result<()>;

    fn log_system(&self, ts_ms: i64, cpu_pct: f64, memory_mb: f64) -> io::Result<()>;
}

struct Slot {
    writer: Mutex<Option<BufWriter<File>>>,
    path: PathBuf,
    header: Option<&'static str>,
}

impl Slot {
    fn new(path: PathBuf, header: Option<&'static str>) -> Self {
        Self {
            writer: Mutex::new(None),
            path,
            header,
        }
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self.writer.lock().unwrap();
        if guard.is_none() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let is_new = !self.path.exists();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            let mut writer = BufWriter::new(file);
            if is_new {
                if let Some(header) = self.header {
                    writeln!(writer, "{header}")?;
                }
            }
            *guard = Some(writer);
        }
        let writer = guard.as_mut().unwrap();
        writeln!(writer, "{line}")?;
        writer.flush()
    }
}

pub struct FileSinks {
    trade_raw: Vec<Slot>,
    latency: Vec<Slot>,
    vwap: Vec<Slot>,
    correlation: Vec<Slot>,
    scheduler: Slot,
    system: Slot,
}

impl FileSinks {
    /// Eagerly creates `log_dir` so a bad path or permissions problem
    /// fails at startup rather than silently on the first write. The
    /// individual per-stream files still open lazily (see `Slot`).
    pub fn new(log_dir: impl AsRef<Path>, symbol_names: &[String; N_SYMBOLS]) -> io::Result<Self> {
        let log_dir = log_dir.as_ref();
        std::fs::create_dir_all(log_dir)?;
        let mut trade_raw = Vec::with_capacity(N_SYMBOLS);
        let mut latency = Vec::with_capacity(N_SYMBOLS);
        let mut vwap = Vec::with_capacity(N_SYMBOLS);
        let mut correlation = Vec::with_capacity(N_SYMBOLS);

        for name in symbol_names.iter() {
            trade_raw.push(Slot::new(log_dir.join(format!("{name}.trade_raw.log")), None));
            latency.push(Slot::new(
                log_dir.join(format!("{name}.latency.csv")),
                Some("exchange_ts_ms,recv_ts_ms,process_ts_ms,network_latency_ms,process_latency_ms,total_latency_ms"),
            ));
            vwap.push(Slot::new(
                log_dir.join(format!("{name}.vwap.csv")),
                Some("minute_ts_ms,vwap"),
            ));
            correlation.push(Slot::new(
                log_dir.join(format!("{name}.correlation.csv")),
                Some("minute_ts_ms,peer_symbol,r,peer_end_minute_ts_ms"),
            ));
        }

        Ok(Self {
            trade_raw,
            latency,
            vwap,
            correlation,
            scheduler: Slot::new(
                log_dir.join("scheduler.csv"),
                Some("scheduled_ms,actual_ms,drift_ms"),
            ),
            system: Slot::new(
                log_dir.join("system.csv"),
                Some("ts_ms,cpu_pct,memory_mb"),
            ),
        })
    }
}

impl Sinks for FileSinks {
    fn log_trade_raw(&self, symbol_id: SymbolId, raw_text: &str) -> io::Result<()> {
        self.trade_raw[symbol_id.index()].write_line(raw_text)
    }

    fn log_latency(
        &self,
        symbol_id: SymbolId,
        exchange_ts_ms: Option<i64>,
        recv_ts_ms: i64,
        process_ts_ms: i64,
    ) -> io::Result<()> {
        let exchange_field = exchange_ts_ms
            .map(|ts| ts.to_string())
            .unwrap_or_default();
        let network_latency = exchange_ts_ms.map(|ts| recv_ts_ms - ts);
        let process_latency = process_ts_ms - recv_ts_ms;
        let total_latency = exchange_ts_ms.map(|ts| process_ts_ms - ts);
        let line = format!(
            "{exchange_field},{recv_ts_ms},{process_ts_ms},{},{process_latency},{}",
            network_latency.map(|v| v.to_string()).unwrap_or_default(),
            total_latency.map(|v| v.to_string()).unwrap_or_default(),
        );
        self.latency[symbol_id.index()].write_line(&line)
    }

    fn log_vwap(&self, symbol_id: SymbolId, minute_ts_ms: i64, vwap: f64) -> io::Result<()> {
        self.vwap[symbol_id.index()].write_line(&format!("{minute_ts_ms},{vwap}"))
    }

    fn log_correlation(
        &self,
        symbol_id: SymbolId,
        minute_ts_ms: i64,
        peer_symbol_name: &str,
        r: f64,
        peer_end_minute_ts_ms: i64,
    ) -> io::Result<()> {
        self.correlation[symbol_id.index()].write_line(&format!(
            "{minute_ts_ms},{peer_symbol_name},{r},{peer_end_minute_ts_ms}"
        ))
    }

    fn log_scheduler(&self, scheduled_ms: i64, actual_ms: i64, drift_ms: i64) -> io::Result<()> {
        self.scheduler
            .write_line(&format!("{scheduled_ms},{actual_ms},{drift_ms}"))
    }

    fn log_system(&self, ts_ms: i64, cpu_pct: f64, memory_mb: f64) -> io::Result<()> {
        self.system
            .write_line(&format!("{ts_ms},{cpu_pct},{memory_mb}"))
    }
}
