//! Failures surfaced by the connection engine, plus the RFC 7540
//! Section 7 error code registry.

use crate::tls::TlsError;
use std::fmt;

/// Everything a [`Connection`](crate::Connection) operation can fail with
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Context setup, handshake or certificate verification
    #[error("TLS error: {0}")]
    Tls(#[from] TlsError),

    /// Peer broke framing or state rules; answered with PROTOCOL_ERROR
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A window would leave its legal range
    #[error("Flow control error: {0}")]
    FlowControl(String),

    /// Frame longer than the advertised maximum, or a fixed-size frame of the wrong length
    #[error("Frame size error: {0}")]
    FrameSize(String),

    /// Header block failed to decode
    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Invalid settings value: {0}")]
    InvalidSettings(String),

    /// Server selected something other than `h2`; carries its choice
    #[error("ALPN negotiation failed: expected h2, got {0:?}")]
    AlpnFailed(Option<Vec<u8>>),

    /// GOAWAY with a non-zero code
    #[error("Connection terminated by peer: {error_code} ({debug_data})")]
    GoAway {
        error_code: ErrorCode,
        debug_data: String,
    },

    /// RST_STREAM from the peer, or a local reset
    #[error("Stream {stream_id} reset: {error_code}")]
    StreamReset {
        stream_id: u32,
        error_code: ErrorCode,
    },

    /// Local side already half-closed
    #[error("Stream closed: {0}")]
    StreamClosed(u32),

    #[error("Stream not found: {0}")]
    StreamNotFound(u32),

    /// `getresponse(None)` with nothing in flight
    #[error("No outstanding streams")]
    NoPendingStreams,

    /// Peer's SETTINGS_MAX_CONCURRENT_STREAMS reached
    #[error("Too many concurrent streams")]
    TooManyStreams,

    /// Next client id would pass 2^31-1
    #[error("Stream identifiers exhausted")]
    StreamIdsExhausted,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rejected by header-name or value checks before encoding
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Socket read or write deadline passed
    #[error("Timeout")]
    Timeout,

    /// Peer went away cleanly, or the connection was never opened
    #[error("Connection closed")]
    ConnectionClosed,
}

impl Error {
    /// Error code to report in a GOAWAY when this error is detected locally.
    ///
    /// Returns `None` for errors that are not peer protocol violations.
    pub fn goaway_code(&self) -> Option<ErrorCode> {
        match self {
            Error::Protocol(_) | Error::InvalidSettings(_) => Some(ErrorCode::ProtocolError),
            Error::FlowControl(_) => Some(ErrorCode::FlowControlError),
            Error::FrameSize(_) => Some(ErrorCode::FrameSizeError),
            Error::Compression(_) => Some(ErrorCode::CompressionError),
            _ => None,
        }
    }

    /// Whether this error terminates the whole connection
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::StreamReset { .. }
                | Error::StreamClosed(_)
                | Error::StreamNotFound(_)
                | Error::NoPendingStreams
                | Error::TooManyStreams
                | Error::StreamIdsExhausted
                | Error::InvalidState(_)
                | Error::InvalidHeader(_)
        )
    }
}

/// Wire error codes carried by RST_STREAM and GOAWAY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xa,
    EnhanceYourCalm = 0xb,
    InadequateSecurity = 0xc,
    Http11Required = 0xd,
}

impl ErrorCode {
    // indexed by code; the registry is contiguous from zero
    const ALL: [ErrorCode; 14] = [
        ErrorCode::NoError,
        ErrorCode::ProtocolError,
        ErrorCode::InternalError,
        ErrorCode::FlowControlError,
        ErrorCode::SettingsTimeout,
        ErrorCode::StreamClosed,
        ErrorCode::FrameSizeError,
        ErrorCode::RefusedStream,
        ErrorCode::Cancel,
        ErrorCode::CompressionError,
        ErrorCode::ConnectError,
        ErrorCode::EnhanceYourCalm,
        ErrorCode::InadequateSecurity,
        ErrorCode::Http11Required,
    ];

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// `None` for codes outside the registry
    pub fn from_u32(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Decode a wire error code
    ///
    /// Unknown codes are treated as INTERNAL_ERROR (RFC 7540 Section 7).
    pub fn from_wire(code: u32) -> Self {
        Self::from_u32(code).unwrap_or(ErrorCode::InternalError)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::NoError => "NO_ERROR",
            ErrorCode::ProtocolError => "PROTOCOL_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::FlowControlError => "FLOW_CONTROL_ERROR",
            ErrorCode::SettingsTimeout => "SETTINGS_TIMEOUT",
            ErrorCode::StreamClosed => "STREAM_CLOSED",
            ErrorCode::FrameSizeError => "FRAME_SIZE_ERROR",
            ErrorCode::RefusedStream => "REFUSED_STREAM",
            ErrorCode::Cancel => "CANCEL",
            ErrorCode::CompressionError => "COMPRESSION_ERROR",
            ErrorCode::ConnectError => "CONNECT_ERROR",
            ErrorCode::EnhanceYourCalm => "ENHANCE_YOUR_CALM",
            ErrorCode::InadequateSecurity => "INADEQUATE_SECURITY",
            ErrorCode::Http11Required => "HTTP_1_1_REQUIRED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:x})", self.name(), self.as_u32())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
