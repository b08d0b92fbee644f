/// Startup-only failures. Everything that can go wrong on the hot path
/// (parse failure, queue overflow, missing timestamp, insufficient
/// history) is handled locally per §7 and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to load configuration")]
    Config(#[from] tidepool_config::ConfigError),

    #[error("failed to open transport '{url}'")]
    Transport {
        url: String,
        #[source]
        source: tidepool_transport::TransportError,
    },

    #[error("failed to open sink directory '{log_dir}'")]
    Sinks {
        log_dir: String,
        #[source]
        source: std::io::Error,
    },
}
