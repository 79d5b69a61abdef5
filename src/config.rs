//! # Service Configuration

use std::net::SocketAddr;

/// Runtime settings for the reconciliation service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Socket address the HTTP boundary binds to.
    pub listen: SocketAddr,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: ([127, 0, 0, 1], 3000).into(),
        }
    }
}
