//! Command line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use rechovot_fts::BackendConfig;

/// Rechovot API - street search over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "rechovot-api")]
#[command(about = "Serve street search and soft delete over HTTP", long_about = None)]
pub struct Settings {
    /// Address to listen on
    #[arg(long, env = "RECHOVOT_BIND", default_value = "0.0.0.0:3001")]
    pub bind: SocketAddr,

    /// Directory holding the search indexes
    #[arg(long, env = "RECHOVOT_INDEX_ROOT", default_value = "data/index")]
    pub index_root: PathBuf,

    /// Index to serve
    #[arg(long, env = "RECHOVOT_INDEX", default_value = "streets")]
    pub index: String,
}

impl Settings {
    /// Backend configuration for these settings.
    pub fn backend(&self) -> BackendConfig {
        BackendConfig::tantivy(&self.index_root)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["rechovot-api"]).unwrap();
        assert_eq!(settings.bind, "0.0.0.0:3001".parse().unwrap());
        assert_eq!(settings.index, "streets");
        assert_eq!(settings.index_root, PathBuf::from("data/index"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let settings = Settings::try_parse_from([
            "rechovot-api",
            "--bind",
            "127.0.0.1:8080",
            "--index",
            "streets-v2",
        ])
        .unwrap();
        assert_eq!(settings.bind.port(), 8080);
        assert_eq!(settings.index, "streets-v2");
    }

    #[test]
    fn test_invalid_bind_rejected() {
        assert!(Settings::try_parse_from(["rechovot-api", "--bind", "nowhere"]).is_err());
    }
}
