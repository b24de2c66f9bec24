use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use clap::Parser;
use url::Url;

use crate::error::ConfigError;

/// Runtime settings. Every option can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "community_chat")]
#[command(about = "Ephemeral group chat relay with call signaling and a shared whiteboard")]
#[command(version)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "BIND_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Directory holding the built frontend
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Origin allowed to call the HTTP API cross-origin
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:5173")]
    pub frontend_url: String,

    /// Path to TLS certificate (PEM format)
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key (PEM format)
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key: Option<PathBuf>,
}

impl Config {
    /// The frontend URL serialized as a bare origin (`scheme://host[:port]`).
    pub fn allowed_origin(&self) -> Result<String, ConfigError> {
        let invalid = || ConfigError::InvalidOrigin(self.frontend_url.clone());
        let url = Url::parse(&self.frontend_url).map_err(|_| invalid())?;

        if !matches!(url.scheme(), "http" | "https")
            || !url.has_host()
            || !url.username().is_empty()
            || url.password().is_some()
            || url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some()
        {
            return Err(invalid());
        }
        Ok(url.origin().ascii_serialization())
    }

    /// Certificate and key, when both are configured.
    pub fn tls(&self) -> Result<Option<(&Path, &Path)>, ConfigError> {
        match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => Ok(Some((cert.as_path(), key.as_path()))),
            (None, None) => Ok(None),
            _ => Err(ConfigError::IncompleteTls),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn index_file(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }
}
