use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid frontend origin `{0}`: expected http(s)://host[:port]")]
    InvalidOrigin(String),
    #[error("TLS needs both a certificate and a private key")]
    IncompleteTls,
}

/// Reasons an inbound WebSocket frame is dropped without reaching the relay.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Binary frames are not supported")]
    Binary,
    #[error("Malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}
