//! Server configuration from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory the static client is served from.
    pub static_dir: String,
}

impl ServerConfig {
    /// Load config from BIND_ADDR, PORT, and STATIC_DIR, falling back to
    /// defaults on anything unset or unparsable.
    pub fn from_env() -> Self {
        let host: IpAddr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let static_dir =
            std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

        Self {
            bind_addr: SocketAddr::new(host, port),
            static_dir,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            static_dir: "static".to_string(),
        }
    }
}
