use std::sync::Arc;

use tidepool_config::EngineConfig;
use tidepool_engine::{Engine, EngineError};
use tidepool_events::N_SYMBOLS;
use tidepool_parse::SymbolTable;
use tidepool_sinks::FileSinks;
use tidepool_transport::{Transport, WebSocketTransport};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tidepool.toml".to_string());
    let config = EngineConfig::load(config_path).map_err(EngineError::from)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let symbol_names: [String; N_SYMBOLS] = config
        .symbols
        .clone()
        .try_into()
        .expect("config validation guarantees exactly N_SYMBOLS symbols");
    let symbols = SymbolTable::new(symbol_names.clone());
    let sinks = Arc::new(
        FileSinks::new(&config.log_dir, &symbol_names).map_err(|source| EngineError::Sinks {
            log_dir: config.log_dir.display().to_string(),
            source,
        })?,
    );

    let engine = Arc::new(Engine::new(config.queue_capacity, symbols, sinks));

    info!(
        queue_capacity = config.queue_capacity,
        connections = config.transport_urls.len(),
        "TIDEPOOL: starting engine"
    );

    let mut transport_handles = Vec::with_capacity(config.transport_urls.len());
    for url in &config.transport_urls {
        let mut transport = WebSocketTransport::new(url.clone());
        transport
            .connect()
            .map_err(|source| EngineError::Transport {
                url: url.clone(),
                source,
            })?;
        transport_handles.push(tidepool_engine::spawn_transport_thread(
            Arc::clone(&engine),
            Box::new(transport),
        ));
    }

    let stage_handles = tidepool_engine::spawn_stage_threads(Arc::clone(&engine));

    let shutdown_engine = Arc::clone(&engine);
    ctrlc::set_handler(move || {
        info!("TIDEPOOL: shutdown signal received");
        shutdown_engine.request_shutdown();
    })?;

    for handle in transport_handles {
        let _ = handle.join();
    }
    for handle in stage_handles {
        let _ = handle.join();
    }

    info!("TIDEPOOL: all threads joined, exiting");
    Ok(())
}
