//! Client-side OpenSSL context construction

use std::fs::File;
use std::io::Read;
use std::net::TcpStream;
use std::path::Path;

use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode, SslVersion};

/// Protocol versions acceptable for HTTP/2 (RFC 7540 Section 9.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

impl TlsVersion {
    /// Accepts `TLSv1.2`, `tls1.3` and similar spellings
    pub fn from_str(s: &str) -> Result<Self, TlsError> {
        match s.to_uppercase().as_str() {
            "TLSV1.2" | "TLS1.2" => Ok(TlsVersion::Tls12),
            "TLSV1.3" | "TLS1.3" => Ok(TlsVersion::Tls13),
            _ => Err(TlsError::InvalidVersion(s.to_string())),
        }
    }

    pub fn to_openssl_version(&self) -> SslVersion {
        match self {
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }
}

/// Failures while building a context or running the handshake
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TLS version: {0}")]
    InvalidVersion(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),
}

/// Shareable client context; cloning is cheap
#[derive(Clone)]
pub struct TlsConfig {
    pub(crate) ctx: SslContext,
    pub(crate) verify_peer: bool,
}

impl TlsConfig {
    /// Starts from system trust roots, TLS 1.2 minimum and ALPN `h2`
    pub fn client() -> Result<ClientConfigBuilder, TlsError> {
        ClientConfigBuilder::new()
    }

    pub fn verify_peer(&self) -> bool {
        self.verify_peer
    }

    /// Run the client handshake over `stream`.
    ///
    /// `hostname` is sent as SNI and, when peer verification is on,
    /// checked against the server certificate.
    pub fn connect(
        &self,
        stream: TcpStream,
        hostname: &str,
    ) -> Result<super::TlsSessionOps, TlsError> {
        super::session::TlsSessionOps::connect(stream, self, hostname)
    }
}

pub struct ClientConfigBuilder {
    ctx_builder: SslContextBuilder,
    alpn: Vec<String>,
    verify_peer: bool,
}

impl ClientConfigBuilder {
    fn new() -> Result<Self, TlsError> {
        let mut ctx_builder = SslContextBuilder::new(SslMethod::tls_client())?;
        ctx_builder.set_default_verify_paths()?;
        ctx_builder.set_min_proto_version(Some(SslVersion::TLS1_2))?;
        ctx_builder.set_verify(SslVerifyMode::PEER);

        Ok(ClientConfigBuilder {
            ctx_builder,
            alpn: vec!["h2".to_string()],
            verify_peer: true,
        })
    }

    /// Pin a single version
    pub fn version(self, version: TlsVersion) -> Result<Self, TlsError> {
        self.version_range(version, version)
    }

    pub fn version_range(mut self, min: TlsVersion, max: TlsVersion) -> Result<Self, TlsError> {
        if min > max {
            return Err(TlsError::InvalidConfig(format!(
                "Minimum version {} is above maximum {}",
                min.as_str(),
                max.as_str()
            )));
        }
        self.ctx_builder
            .set_min_proto_version(Some(min.to_openssl_version()))?;
        self.ctx_builder
            .set_max_proto_version(Some(max.to_openssl_version()))?;
        Ok(self)
    }

    /// OpenSSL cipher string, TLS 1.2 and below
    pub fn cipher_list(mut self, ciphers: &str) -> Result<Self, TlsError> {
        self.ctx_builder.set_cipher_list(ciphers)?;
        Ok(self)
    }

    /// TLS 1.3 suites, colon separated
    pub fn ciphersuites(mut self, ciphers: &str) -> Result<Self, TlsError> {
        self.ctx_builder.set_ciphersuites(ciphers)?;
        Ok(self)
    }

    /// Replace the offered protocol list
    pub fn alpn(mut self, protocols: &[&str]) -> Self {
        self.alpn = protocols.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Turning this off also skips the hostname check
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        if verify {
            self.ctx_builder.set_verify(SslVerifyMode::PEER);
        } else {
            self.ctx_builder.set_verify(SslVerifyMode::NONE);
        }
        self
    }

    /// Extra trust anchors, PEM
    pub fn ca_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, TlsError> {
        self.ctx_builder.set_ca_file(path.as_ref())?;
        Ok(self)
    }

    /// Client certificate followed by its key, both in one PEM file
    pub fn cert_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, TlsError> {
        let mut cert_pem = Vec::new();
        File::open(path.as_ref())?.read_to_end(&mut cert_pem)?;

        use openssl::pkey::PKey;
        use openssl::x509::X509;

        let cert = X509::from_pem(&cert_pem)
            .map_err(|e| TlsError::Certificate(format!("Failed to load certificate: {}", e)))?;
        self.ctx_builder.set_certificate(&cert)?;

        let key = PKey::private_key_from_pem(&cert_pem)
            .map_err(|e| TlsError::Certificate(format!("Failed to load private key: {}", e)))?;
        self.ctx_builder.set_private_key(&key)?;

        Ok(self)
    }

    pub fn build(mut self) -> Result<TlsConfig, TlsError> {
        // wire form: each name prefixed by its length octet
        let mut alpn_bytes = Vec::new();
        for proto in &self.alpn {
            if proto.is_empty() || proto.len() > 255 {
                return Err(TlsError::InvalidConfig(format!(
                    "Invalid ALPN protocol name: {:?}",
                    proto
                )));
            }
            alpn_bytes.push(proto.len() as u8);
            alpn_bytes.extend_from_slice(proto.as_bytes());
        }
        if !alpn_bytes.is_empty() {
            self.ctx_builder.set_alpn_protos(&alpn_bytes)?;
        }

        Ok(TlsConfig {
            ctx: self.ctx_builder.build(),
            verify_peer: self.verify_peer,
        })
    }
}
