use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use linebook_protocol::SortSpec;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: 127.0.0.1:9810).
    pub bind: SocketAddr,
    /// Sort applied when a view request does not name one.
    pub default_sort: SortSpec,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9810),
            default_sort: SortSpec::default(),
        }
    }
}
