//! HPACK header compression
//!
//! Wraps the `hpack` crate's encoder and decoder behind the small contract the
//! connection needs: encode a header list, decode a header block, and track
//! the peer's SETTINGS_HEADER_TABLE_SIZE.
//!
//! The `hpack` encoder always indexes into a 4096-byte dynamic table. When the
//! peer allows less than that, the codec signals a table size of zero and
//! falls back to literals without indexing (RFC 7541 Section 6.2.2) until the
//! peer allows a full-size table again.

use super::DEFAULT_HEADER_TABLE_SIZE;
use crate::error::{Error, Result};
use bytes::Bytes;
use hpack::{Decoder, Encoder};
use tracing::debug;

/// Header block encoder/decoder for one connection
pub struct HeaderCodec {
    encoder: Encoder<'static>,
    decoder: Decoder<'static>,
    header_table_size: u32,
    indexing: bool,
    pending_size_updates: Vec<u32>,
}

impl HeaderCodec {
    /// Create a codec with the default 4096-byte tables
    pub fn new() -> Self {
        HeaderCodec {
            encoder: Encoder::new(),
            decoder: Decoder::new(),
            header_table_size: DEFAULT_HEADER_TABLE_SIZE,
            indexing: true,
            pending_size_updates: Vec::new(),
        }
    }

    /// Peer's maximum dynamic table size for blocks we encode
    pub fn header_table_size(&self) -> u32 {
        self.header_table_size
    }

    /// Whether the encoder currently uses its dynamic table
    pub fn is_indexing(&self) -> bool {
        self.indexing
    }

    /// Apply the peer's SETTINGS_HEADER_TABLE_SIZE
    pub fn set_header_table_size(&mut self, size: u32) {
        self.header_table_size = size;

        if size < DEFAULT_HEADER_TABLE_SIZE && self.indexing {
            self.indexing = false;
            self.pending_size_updates = vec![0];
            debug!(size, "header table shrunk, encoding literals without indexing");
        } else if size >= DEFAULT_HEADER_TABLE_SIZE && !self.indexing {
            // An unsent shrink must still reach the peer so its table is emptied
            if self.pending_size_updates.is_empty() {
                self.pending_size_updates = vec![DEFAULT_HEADER_TABLE_SIZE];
            } else {
                self.pending_size_updates = vec![0, DEFAULT_HEADER_TABLE_SIZE];
            }
            self.indexing = true;
            self.encoder = Encoder::new();
            debug!(size, "header table restored, indexing resumed");
        }
    }

    /// Encode a header list into one header block
    pub fn encode(&mut self, headers: &[(String, String)]) -> Result<Bytes> {
        let mut block = Vec::new();

        // Size updates must open the block (RFC 7541 Section 4.2)
        for size in self.pending_size_updates.drain(..) {
            encode_integer(size as usize, 5, 0x20, &mut block);
        }

        if self.indexing {
            let pairs = headers.iter().map(|(n, v)| (n.as_bytes(), v.as_bytes()));
            self.encoder
                .encode_into(pairs, &mut block)
                .map_err(|e| Error::Internal(format!("HPACK encode error: {}", e)))?;
        } else {
            for (name, value) in headers {
                block.push(0x00); // Literal without indexing, new name
                encode_string(name.as_bytes(), &mut block);
                encode_string(value.as_bytes(), &mut block);
            }
        }

        Ok(Bytes::from(block))
    }

    /// Decode a complete header block
    pub fn decode(&mut self, block: &[u8]) -> Result<Vec<(String, String)>> {
        let decoded = self
            .decoder
            .decode(block)
            .map_err(|e| Error::Compression(format!("HPACK decode error: {:?}", e)))?;

        Ok(decoded
            .into_iter()
            .map(|(name, value)| {
                (
                    String::from_utf8_lossy(&name).into_owned(),
                    String::from_utf8_lossy(&value).into_owned(),
                )
            })
            .collect())
    }
}

impl Default for HeaderCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// HPACK prefixed integer (RFC 7541 Section 5.1)
fn encode_integer(mut value: usize, prefix_bits: u8, flags: u8, buf: &mut Vec<u8>) {
    let max_prefix = (1usize << prefix_bits) - 1;
    if value < max_prefix {
        buf.push(flags | value as u8);
        return;
    }

    buf.push(flags | max_prefix as u8);
    value -= max_prefix;
    while value >= 128 {
        buf.push((value % 128) as u8 | 0x80);
        value /= 128;
    }
    buf.push(value as u8);
}

/// HPACK string literal without Huffman coding (RFC 7541 Section 5.2)
fn encode_string(bytes: &[u8], buf: &mut Vec<u8>) {
    encode_integer(bytes.len(), 7, 0x00, buf);
    buf.extend_from_slice(bytes);
}
