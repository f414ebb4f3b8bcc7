//! HTTP/2 client protocol engine
//!
//! This module multiplexes request/response streams over one connection,
//! applies the peer's SETTINGS and enforces flow control at connection and
//! stream level (RFC 7540).
//!
//! # Architecture
//!
//! - [`Connection`] owns the session, the stream table and connection-level
//!   state, and dispatches every inbound frame
//! - [`H2Stream`] is the per-request state machine; it emits frames through
//!   a [`FrameSink`] lent by the connection
//! - [`WindowManager`] decides when WINDOW_UPDATE frames are due
//! - [`FrameCodec`] and [`HeaderCodec`] handle the wire format
//!
//! The engine is synchronous and single-threaded: a send that runs out of
//! window keeps reading and dispatching inbound frames (for any stream)
//! until the peer grants more.
//!
//! # Examples
//!
//! ```no_run
//! use h2mux::ConnectionBuilder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conn = ConnectionBuilder::new("example.com", 443).build()?;
//!
//! let first = conn.request("GET", "/", None, &[])?;
//! let second = conn.request("GET", "/style.css", None, &[("accept", "text/css")])?;
//!
//! let response = conn.getresponse(Some(second))?;
//! println!("Status: {}", response.status());
//! let response = conn.getresponse(Some(first))?;
//! println!("Body: {}", response.body_string()?);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod connection;
pub mod flow_control;
pub mod frames;
pub mod hpack;
pub mod response;
pub mod settings;
pub mod stream;

pub use codec::{FrameCodec, FrameHeader};
pub use connection::{Connection, ConnectionBuilder};
pub use flow_control::{FlowControlWindow, WindowManager};
pub use frames::{Frame, FrameFlags, FrameType};
pub use hpack::HeaderCodec;
pub use response::H2Response;
pub use settings::{Settings, SettingsBuilder, SettingsParameter};
pub use stream::{FrameSink, H2Stream, StreamId, StreamState};

/// HTTP/2 connection preface that must be sent by clients
///
/// From RFC 7540 Section 3.5:
/// "PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n"
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Default initial window size (65535 bytes)
pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 65535;

/// Default maximum frame size (16384 bytes)
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16384;

/// Default header table size (4096 bytes)
pub const DEFAULT_HEADER_TABLE_SIZE: u32 = 4096;

/// Largest flow control window (2^31 - 1)
pub const MAX_WINDOW_SIZE: u32 = 0x7FFFFFFF;

/// Maximum stream ID value (2^31 - 1)
pub const MAX_STREAM_ID: u32 = 0x7FFFFFFF;

/// Stream ID 0 (connection-level)
pub const CONNECTION_STREAM_ID: u32 = 0;
