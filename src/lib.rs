//! h2mux - blocking HTTP/2 client connection engine
//!
//! This crate multiplexes HTTP/2 request streams over a single TLS (or
//! plain TCP) socket. It handles the connection preface, SETTINGS exchange,
//! HPACK header compression and connection plus stream level flow control,
//! and exposes a small synchronous request/response API.
//!
//! ```no_run
//! use h2mux::Connection;
//!
//! # fn example() -> Result<(), h2mux::Error> {
//! let mut conn = Connection::new("example.com", 443)?;
//! let stream_id = conn.request("GET", "/", None, &[("accept", "*/*")])?;
//! let response = conn.getresponse(Some(stream_id))?;
//! println!("{} {}", response.status(), response.body_string()?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod h2;
pub mod session;
pub mod tls;

pub use error::{Error, ErrorCode, Result};
pub use h2::{Connection, ConnectionBuilder, H2Response, StreamId};
pub use session::{Connector, PlainConnector, ShutdownHandle};
pub use tls::{TlsConfig, TlsConnector};
