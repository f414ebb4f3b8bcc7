//! HTTP/2 frame encoding and decoding
//!
//! This module provides the low-level frame codec: the 9-byte frame header,
//! per-type payload layout and the structural checks RFC 7540 Section 6
//! attaches to each frame type.

use super::frames::*;
use super::settings::Settings;
use super::CONNECTION_STREAM_ID;
use crate::error::{Error, ErrorCode, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Read;

/// HTTP/2 frame header size (9 bytes)
pub const FRAME_HEADER_SIZE: usize = 9;

/// Maximum frame payload size (16MB - 1)
pub const MAX_FRAME_SIZE: usize = 0x00FFFFFF;

/// Decoded frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload length
    pub length: usize,
    /// Raw frame type
    pub kind: u8,
    /// Frame flags
    pub flags: FrameFlags,
    /// Stream ID (reserved bit cleared)
    pub stream_id: u32,
}

impl FrameHeader {
    /// Known frame type, if any
    pub fn frame_type(&self) -> Option<FrameType> {
        FrameType::from_u8(self.kind)
    }
}

/// Frame codec for encoding/decoding HTTP/2 frames
pub struct FrameCodec;

impl FrameCodec {
    /// Encode a frame header into a buffer
    pub fn encode_header(kind: u8, flags: FrameFlags, stream_id: u32, length: usize) -> [u8; FRAME_HEADER_SIZE] {
        let mut header = [0u8; FRAME_HEADER_SIZE];

        // Length (24 bits, big-endian)
        header[0] = ((length >> 16) & 0xFF) as u8;
        header[1] = ((length >> 8) & 0xFF) as u8;
        header[2] = (length & 0xFF) as u8;

        header[3] = kind;
        header[4] = flags.as_u8();

        // Stream ID (31 bits, big-endian, reserved bit is 0)
        header[5..9].copy_from_slice(&(stream_id & 0x7FFFFFFF).to_be_bytes());

        header
    }

    /// Decode a frame header from bytes
    pub fn decode_header(bytes: &[u8; FRAME_HEADER_SIZE]) -> FrameHeader {
        let length = ((bytes[0] as usize) << 16) | ((bytes[1] as usize) << 8) | (bytes[2] as usize);

        // Ignore reserved bit
        let stream_id = u32::from_be_bytes([bytes[5] & 0x7F, bytes[6], bytes[7], bytes[8]]);

        FrameHeader {
            length,
            kind: bytes[3],
            flags: FrameFlags::from_u8(bytes[4]),
            stream_id,
        }
    }

    /// Decode a frame payload
    ///
    /// `payload` must be exactly `header.length` bytes.
    pub fn decode_frame(header: FrameHeader, mut payload: Bytes) -> Result<Frame> {
        if payload.len() != header.length {
            return Err(Error::FrameSize(format!(
                "Frame length {} does not match payload of {} bytes",
                header.length,
                payload.len()
            )));
        }

        let frame_type = match header.frame_type() {
            Some(frame_type) => frame_type,
            None => {
                return Ok(Frame::Unknown(UnknownFrame {
                    kind: header.kind,
                    flags: header.flags,
                    stream_id: header.stream_id,
                    payload,
                }))
            }
        };

        let flags = header.flags;
        let stream_id = header.stream_id;
        Self::check_stream_id(frame_type, stream_id)?;

        let frame = match frame_type {
            FrameType::Data => {
                let padding = Self::strip_padding(frame_type, flags, &mut payload)?;
                Frame::Data(DataFrame {
                    stream_id,
                    data: payload,
                    end_stream: flags.is_end_stream(),
                    padding,
                })
            }
            FrameType::Headers => {
                let padding = Self::strip_padding(frame_type, flags, &mut payload)?;
                let priority = if flags.is_priority() {
                    if payload.len() < 5 {
                        return Err(Error::FrameSize("HEADERS priority block truncated".to_string()));
                    }
                    Some(Self::decode_priority(&mut payload))
                } else {
                    None
                };
                Frame::Headers(HeadersFrame {
                    stream_id,
                    header_block: payload,
                    end_stream: flags.is_end_stream(),
                    end_headers: flags.is_end_headers(),
                    priority,
                    padding,
                })
            }
            FrameType::Priority => {
                Self::expect_length(frame_type, &payload, 5)?;
                Frame::Priority(PriorityFrame {
                    stream_id,
                    priority: Self::decode_priority(&mut payload),
                })
            }
            FrameType::RstStream => {
                Self::expect_length(frame_type, &payload, 4)?;
                Frame::RstStream(RstStreamFrame::new(
                    stream_id,
                    ErrorCode::from_wire(payload.get_u32()),
                ))
            }
            FrameType::Settings => Frame::Settings(Self::decode_settings(flags, payload)?),
            FrameType::PushPromise => {
                let padding = Self::strip_padding(frame_type, flags, &mut payload)?;
                if payload.len() < 4 {
                    return Err(Error::FrameSize("PUSH_PROMISE payload truncated".to_string()));
                }
                let promised_stream_id = payload.get_u32() & 0x7FFFFFFF;
                Frame::PushPromise(PushPromiseFrame {
                    stream_id,
                    promised_stream_id,
                    header_block: payload,
                    end_headers: flags.is_end_headers(),
                    padding,
                })
            }
            FrameType::Ping => {
                Self::expect_length(frame_type, &payload, 8)?;
                let mut data = [0u8; 8];
                payload.copy_to_slice(&mut data);
                Frame::Ping(PingFrame {
                    ack: flags.is_ack(),
                    data,
                })
            }
            FrameType::Goaway => {
                if payload.len() < 8 {
                    return Err(Error::FrameSize(format!(
                        "GOAWAY payload must be at least 8 bytes, got {}",
                        payload.len()
                    )));
                }
                let last_stream_id = payload.get_u32() & 0x7FFFFFFF;
                let error_code = ErrorCode::from_wire(payload.get_u32());
                Frame::Goaway(GoawayFrame::new(last_stream_id, error_code, payload))
            }
            FrameType::WindowUpdate => {
                Self::expect_length(frame_type, &payload, 4)?;
                Frame::WindowUpdate(WindowUpdateFrame::new(stream_id, payload.get_u32() & 0x7FFFFFFF))
            }
            FrameType::Continuation => Frame::Continuation(ContinuationFrame {
                stream_id,
                header_block: payload,
                end_headers: flags.is_end_headers(),
            }),
        };

        Ok(frame)
    }

    /// Serialize a frame, header included
    pub fn encode_frame(frame: &Frame) -> Bytes {
        let flags = frame.flags();
        let mut payload = BytesMut::new();

        match frame {
            Frame::Data(f) => Self::write_padded(&mut payload, f.padding, |buf| buf.put_slice(&f.data)),
            Frame::Headers(f) => Self::write_padded(&mut payload, f.padding, |buf| {
                if let Some(priority) = &f.priority {
                    Self::encode_priority(buf, priority);
                }
                buf.put_slice(&f.header_block);
            }),
            Frame::Priority(f) => Self::encode_priority(&mut payload, &f.priority),
            Frame::RstStream(f) => payload.put_u32(f.error_code.as_u32()),
            Frame::Settings(f) => {
                // Each setting is 6 bytes (2 byte ID + 4 byte value); ACK carries none
                if !f.ack {
                    for (param, value) in f.settings.parameters() {
                        payload.put_u16(param.as_u16());
                        payload.put_u32(value);
                    }
                }
            }
            Frame::PushPromise(f) => Self::write_padded(&mut payload, f.padding, |buf| {
                buf.put_u32(f.promised_stream_id & 0x7FFFFFFF);
                buf.put_slice(&f.header_block);
            }),
            Frame::Ping(f) => payload.put_slice(&f.data),
            Frame::Goaway(f) => {
                payload.put_u32(f.last_stream_id & 0x7FFFFFFF);
                payload.put_u32(f.error_code.as_u32());
                payload.put_slice(&f.debug_data);
            }
            Frame::WindowUpdate(f) => payload.put_u32(f.size_increment & 0x7FFFFFFF),
            Frame::Continuation(f) => payload.put_slice(&f.header_block),
            Frame::Unknown(f) => payload.put_slice(&f.payload),
        }

        let kind = match frame {
            Frame::Unknown(f) => f.kind,
            _ => frame.frame_type().map(FrameType::as_u8).unwrap_or_default(),
        };

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
        buf.put_slice(&Self::encode_header(kind, flags, frame.stream_id(), payload.len()));
        buf.put_slice(&payload);
        buf.freeze()
    }

    /// Read one frame from any reader
    pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let header = Self::decode_header(&header);
        if header.length > MAX_FRAME_SIZE {
            return Err(Error::FrameSize(format!("Frame payload too large: {}", header.length)));
        }

        let mut payload = vec![0u8; header.length];
        reader.read_exact(&mut payload)?;

        Self::decode_frame(header, Bytes::from(payload))
    }

    fn check_stream_id(frame_type: FrameType, stream_id: u32) -> Result<()> {
        let connection_only = matches!(
            frame_type,
            FrameType::Settings | FrameType::Ping | FrameType::Goaway
        );
        let stream_only = !connection_only && frame_type != FrameType::WindowUpdate;

        if connection_only && stream_id != CONNECTION_STREAM_ID {
            return Err(Error::Protocol(format!(
                "{} frame must have stream ID 0, got {}",
                frame_type.name(),
                stream_id
            )));
        }
        if stream_only && stream_id == CONNECTION_STREAM_ID {
            return Err(Error::Protocol(format!(
                "{} frame must not have stream ID 0",
                frame_type.name()
            )));
        }
        Ok(())
    }

    fn expect_length(frame_type: FrameType, payload: &Bytes, expected: usize) -> Result<()> {
        if payload.len() != expected {
            return Err(Error::FrameSize(format!(
                "{} payload must be {} bytes, got {}",
                frame_type.name(),
                expected,
                payload.len()
            )));
        }
        Ok(())
    }

    /// Remove the pad length byte and trailing padding
    fn strip_padding(frame_type: FrameType, flags: FrameFlags, payload: &mut Bytes) -> Result<Option<u8>> {
        if !flags.is_padded() {
            return Ok(None);
        }
        if payload.is_empty() {
            return Err(Error::FrameSize(format!("{} pad length missing", frame_type.name())));
        }

        let pad_len = payload.get_u8();
        if pad_len as usize > payload.len() {
            return Err(Error::Protocol(format!(
                "{} padding of {} exceeds payload of {} bytes",
                frame_type.name(),
                pad_len,
                payload.len()
            )));
        }
        payload.truncate(payload.len() - pad_len as usize);
        Ok(Some(pad_len))
    }

    fn write_padded<F: FnOnce(&mut BytesMut)>(buf: &mut BytesMut, padding: Option<u8>, body: F) {
        if let Some(pad_len) = padding {
            buf.put_u8(pad_len);
        }
        body(buf);
        if let Some(pad_len) = padding {
            buf.put_bytes(0, pad_len as usize);
        }
    }

    fn decode_priority(payload: &mut Bytes) -> PrioritySpec {
        let dependency = payload.get_u32();
        PrioritySpec {
            stream_dependency: dependency & 0x7FFFFFFF,
            exclusive: dependency & 0x80000000 != 0,
            weight: payload.get_u8(),
        }
    }

    fn encode_priority(buf: &mut BytesMut, priority: &PrioritySpec) {
        let mut dep = priority.stream_dependency & 0x7FFFFFFF;
        if priority.exclusive {
            dep |= 0x80000000; // Set exclusive bit
        }
        buf.put_u32(dep);
        buf.put_u8(priority.weight);
    }

    fn decode_settings(flags: FrameFlags, mut payload: Bytes) -> Result<SettingsFrame> {
        if flags.is_ack() {
            if !payload.is_empty() {
                return Err(Error::FrameSize("SETTINGS ACK must have an empty payload".to_string()));
            }
            return Ok(SettingsFrame::ack());
        }

        if payload.len() % 6 != 0 {
            return Err(Error::FrameSize(format!(
                "SETTINGS payload length {} is not a multiple of 6",
                payload.len()
            )));
        }

        let mut settings = Settings::new();
        while payload.has_remaining() {
            let id = payload.get_u16();
            let value = payload.get_u32();
            settings.set(id, value)?;
        }
        settings.validate()?;

        Ok(SettingsFrame::new(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::h2::settings::SettingsBuilder;

    fn round_trip(frame: Frame) -> Frame {
        let encoded = frame.serialize();
        let mut header = [0u8; FRAME_HEADER_SIZE];
        header.copy_from_slice(&encoded[..FRAME_HEADER_SIZE]);
        let header = FrameCodec::decode_header(&header);
        FrameCodec::decode_frame(header, encoded.slice(FRAME_HEADER_SIZE..)).unwrap()
    }

    #[test]
    fn test_encode_decode_header() {
        let flags = FrameFlags::from_u8(FrameFlags::END_STREAM | FrameFlags::END_HEADERS);
        let header = FrameCodec::encode_header(FrameType::Headers.as_u8(), flags, 42, 1234);
        let decoded = FrameCodec::decode_header(&header);

        assert_eq!(decoded.frame_type(), Some(FrameType::Headers));
        assert_eq!(decoded.flags, flags);
        assert_eq!(decoded.stream_id, 42);
        assert_eq!(decoded.length, 1234);
    }

    #[test]
    fn test_reserved_bit_ignored() {
        let mut header = FrameCodec::encode_header(0x0, FrameFlags::empty(), 1, 0);
        header[5] |= 0x80;
        assert_eq!(FrameCodec::decode_header(&header).stream_id, 1);
    }

    #[test]
    fn test_encode_data_frame() {
        let frame = Frame::from(DataFrame::new(1, Bytes::from("Hello"), true));
        let encoded = frame.serialize();

        assert_eq!(encoded[0..3], [0, 0, 5]); // Length = 5
        assert_eq!(encoded[3], FrameType::Data.as_u8());
        assert_eq!(encoded[4], FrameFlags::END_STREAM);
        assert_eq!(&encoded[5..9], &[0, 0, 0, 1]); // Stream ID = 1
        assert_eq!(&encoded[9..], b"Hello");
    }

    #[test]
    fn test_encode_data_frame_with_padding() {
        let frame = Frame::from(DataFrame::new(1, Bytes::from("Hi"), false).with_padding(10));
        let encoded = frame.serialize();

        // Length should be: 1 (pad length) + 2 (data) + 10 (padding) = 13
        assert_eq!(encoded[0..3], [0, 0, 13]);
        assert_eq!(encoded[4] & FrameFlags::PADDED, FrameFlags::PADDED);
        assert_eq!(encoded[9], 10);
        assert_eq!(&encoded[10..12], b"Hi");
        assert_eq!(&encoded[12..22], &[0u8; 10]);
    }

    #[test]
    fn test_encode_settings_ack() {
        let encoded = Frame::from(SettingsFrame::ack()).serialize();

        assert_eq!(encoded[0..3], [0, 0, 0]);
        assert_eq!(encoded[3], FrameType::Settings.as_u8());
        assert_eq!(encoded[4], FrameFlags::ACK);
    }

    #[test]
    fn test_round_trip_frames() {
        let settings = SettingsBuilder::new()
            .enable_push(false)
            .initial_window_size(100)
            .build()
            .unwrap();

        let frames = vec![
            Frame::from(DataFrame::new(1, Bytes::from("body"), true).with_padding(3)),
            Frame::from(
                HeadersFrame::new(3, Bytes::from_static(&[0x82, 0x84]), false, true)
                    .with_priority(PrioritySpec::new(1, true, 200)),
            ),
            Frame::from(SettingsFrame::new(settings)),
            Frame::from(SettingsFrame::ack()),
            Frame::from(WindowUpdateFrame::new(0, 1 << 20)),
            Frame::from(GoawayFrame::new(7, ErrorCode::ProtocolError, Bytes::from("bye"))),
            Frame::from(RstStreamFrame::new(5, ErrorCode::Cancel)),
            Frame::from(PingFrame::ack([9; 8])),
            Frame::from(ContinuationFrame {
                stream_id: 3,
                header_block: Bytes::from_static(b"\x86"),
                end_headers: true,
            }),
        ];

        for frame in frames {
            assert_eq!(round_trip(frame.clone()), frame);
        }
    }

    #[test]
    fn test_unknown_frame_preserved() {
        let header = FrameCodec::decode_header(&FrameCodec::encode_header(0xbb, FrameFlags::empty(), 1, 2));
        let frame = FrameCodec::decode_frame(header, Bytes::from_static(b"ab")).unwrap();

        match &frame {
            Frame::Unknown(unknown) => assert_eq!(unknown.kind, 0xbb),
            other => panic!("expected unknown frame, got {:?}", other),
        }
        assert_eq!(round_trip(frame.clone()), frame);
    }

    #[test]
    fn test_structural_errors() {
        let decode = |kind: FrameType, flags: u8, stream_id: u32, payload: &'static [u8]| {
            let header = FrameHeader {
                length: payload.len(),
                kind: kind.as_u8(),
                flags: FrameFlags::from_u8(flags),
                stream_id,
            };
            FrameCodec::decode_frame(header, Bytes::from_static(payload))
        };

        // Connection-only types on a stream, and vice versa
        assert!(matches!(decode(FrameType::Settings, 0, 1, b""), Err(Error::Protocol(_))));
        assert!(matches!(decode(FrameType::Data, 0, 0, b""), Err(Error::Protocol(_))));

        // Fixed-length payloads
        assert!(matches!(decode(FrameType::Ping, 0, 0, b"1234"), Err(Error::FrameSize(_))));
        assert!(matches!(decode(FrameType::WindowUpdate, 0, 0, b"12345"), Err(Error::FrameSize(_))));
        assert!(matches!(decode(FrameType::Settings, FrameFlags::ACK, 0, b"\0\0\0\0\0\0"), Err(Error::FrameSize(_))));
        assert!(matches!(decode(FrameType::Settings, 0, 0, b"\0\x04\0"), Err(Error::FrameSize(_))));

        // Padding longer than the payload
        assert!(matches!(decode(FrameType::Data, FrameFlags::PADDED, 1, b"\x05ab"), Err(Error::Protocol(_))));

        // Invalid settings values
        assert!(matches!(
            decode(FrameType::Settings, 0, 0, b"\0\x04\x80\0\0\0"),
            Err(Error::FlowControl(_))
        ));
    }

    #[test]
    fn test_unknown_error_code_decodes_as_internal() {
        let header = FrameHeader {
            length: 4,
            kind: FrameType::RstStream.as_u8(),
            flags: FrameFlags::empty(),
            stream_id: 1,
        };
        let frame = FrameCodec::decode_frame(header, Bytes::from_static(&[0, 0, 0xff, 0xff])).unwrap();
        assert_eq!(frame, Frame::from(RstStreamFrame::new(1, ErrorCode::InternalError)));
    }

    #[test]
    fn test_read_frame() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&Frame::from(PingFrame::new([1, 2, 3, 4, 5, 6, 7, 8])).serialize());
        wire.extend_from_slice(&Frame::from(WindowUpdateFrame::new(3, 10)).serialize());

        let mut reader = &wire[..];
        assert_eq!(
            FrameCodec::read_frame(&mut reader).unwrap(),
            Frame::from(PingFrame::new([1, 2, 3, 4, 5, 6, 7, 8]))
        );
        assert_eq!(
            FrameCodec::read_frame(&mut reader).unwrap(),
            Frame::from(WindowUpdateFrame::new(3, 10))
        );
        assert!(matches!(FrameCodec::read_frame(&mut reader), Err(Error::Io(_))));
    }
}
