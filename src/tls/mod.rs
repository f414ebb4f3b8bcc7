//! TLS support for HTTP/2 connections
//!
//! This module wraps a connected TCP socket in TLS and performs ALPN so the
//! connection engine can check that `h2` was selected.
//!
//! # Architecture
//!
//! The TLS implementation uses the session operations abstraction pattern:
//!
//! 1. `TlsConfig` defines TLS settings (versions, ciphers, ALPN, trust)
//! 2. `TlsSessionOps` implements the `SessionOps` trait for encrypted I/O
//! 3. `TlsConnector` opens the TCP socket and performs the handshake
//!
//! # Examples
//!
//! ```no_run
//! use h2mux::tls::{TlsConfig, TlsConnector, TlsVersion};
//! use h2mux::ConnectionBuilder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tls_config = TlsConfig::client()?
//!     .version_range(TlsVersion::Tls12, TlsVersion::Tls13)?
//!     .build()?;
//!
//! let mut conn = ConnectionBuilder::new("example.com", 443)
//!     .build_with(TlsConnector::new(tls_config))?;
//! conn.connect()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod session;
pub mod vars;

pub use config::{ClientConfigBuilder, TlsConfig, TlsError, TlsVersion};
pub use session::TlsSessionOps;
pub use vars::TlsVars;

use crate::error::Result;
use crate::session::{connect_tcp, Connector};
use std::time::Duration;
use tracing::debug;

/// Connector that speaks HTTP/2 over TLS
#[derive(Clone)]
pub struct TlsConnector {
    config: TlsConfig,
}

impl TlsConnector {
    /// Create a connector from a TLS configuration
    pub fn new(config: TlsConfig) -> Self {
        TlsConnector { config }
    }

    /// Create a connector with the default client configuration
    ///
    /// Offers `h2` via ALPN and verifies the peer against the system trust store.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(TlsConfig::client()?.build()?))
    }

    /// Get the TLS configuration
    pub fn config(&self) -> &TlsConfig {
        &self.config
    }
}

impl Connector for TlsConnector {
    type Session = TlsSessionOps;

    fn scheme(&self) -> &'static str {
        "https"
    }

    fn connect(&self, host: &str, port: u16, timeout: Option<Duration>) -> Result<TlsSessionOps> {
        let tcp_stream = connect_tcp(host, port, timeout)?;

        // Bounds the handshake; later reads are bounded by the session poll
        tcp_stream.set_read_timeout(timeout)?;
        tcp_stream.set_write_timeout(timeout)?;

        let session = self.config.connect(tcp_stream, host)?;
        let vars = session.vars();
        debug!(
            host,
            version = %vars.version,
            cipher = ?vars.cipher,
            alpn = ?vars.alpn,
            "TLS handshake complete"
        );

        Ok(session)
    }
}
