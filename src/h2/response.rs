//! HTTP/2 response

use super::stream::StreamId;
use crate::error::{Error, Result};
use bytes::Bytes;

/// HTTP/2 response
#[derive(Debug, Clone)]
pub struct H2Response {
    /// Stream ID
    pub stream_id: StreamId,
    /// Status code
    pub status: u16,
    /// Headers, in arrival order, pseudo-headers excluded
    pub headers: Vec<(String, String)>,
    /// Trailing header block, empty if none was sent
    pub trailers: Vec<(String, String)>,
    /// Body
    pub body: Bytes,
}

impl H2Response {
    /// Get status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the first value of a header (names are lowercase on the wire)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get all headers
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get all trailers
    pub fn trailers(&self) -> &[(String, String)] {
        &self.trailers
    }

    /// Get body as bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Get body as string
    pub fn body_string(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| Error::Internal(format!("Invalid UTF-8 in body: {}", e)))
    }
}
