//! HTTP/2 stream state machine
//!
//! This module implements the client side of the stream lifecycle defined in
//! RFC 7540 Section 5.1. A stream never touches the socket: every frame it
//! emits goes through the [`FrameSink`] the connection lends it for the call.

use super::flow_control::{FlowControlWindow, WindowManager};
use super::frames::*;
use super::hpack::HeaderCodec;
use super::response::H2Response;
use crate::error::{Error, ErrorCode, Result};
use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

/// Stream ID type
pub type StreamId = u32;

/// Outbound frame callback
///
/// Implemented by the connection's transport; DATA frames passed here are
/// charged against the connection-level send window.
pub trait FrameSink {
    /// Serialize and transmit one frame
    fn send_frame(&mut self, frame: Frame) -> Result<()>;
}

/// Stream state as defined in RFC 7540 Section 5.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Idle: No frames have been sent/received
    Idle,
    /// Open: Both sides can send frames
    Open,
    /// Half-closed (local): We can't send, they can
    HalfClosedLocal,
    /// Half-closed (remote): They can't send, we can
    HalfClosedRemote,
    /// Closed: Stream is closed
    Closed,
}

impl StreamState {
    /// Check if stream can send data
    pub fn can_send(&self) -> bool {
        matches!(self, StreamState::Open | StreamState::HalfClosedRemote)
    }

    /// Check if stream can receive data
    pub fn can_receive(&self) -> bool {
        matches!(self, StreamState::Open | StreamState::HalfClosedLocal)
    }

    /// Check if stream is closed
    pub fn is_closed(&self) -> bool {
        matches!(self, StreamState::Closed)
    }
}

/// HTTP/2 stream
#[derive(Debug)]
pub struct H2Stream {
    id: StreamId,
    state: StreamState,
    /// Request header list, pseudo-headers first
    request_headers: Vec<(String, String)>,
    /// Budget the peer granted us
    send_window: FlowControlWindow,
    /// Budget we granted the peer
    recv_window: WindowManager,
    /// Header block fragments awaiting END_HEADERS
    header_block: BytesMut,
    /// END_STREAM flag of the HEADERS frame that opened `header_block`
    block_end_stream: bool,
    status: Option<u16>,
    headers: Vec<(String, String)>,
    trailers: Vec<(String, String)>,
    body: BytesMut,
    end_stream_received: bool,
    reset: Option<ErrorCode>,
    response_taken: bool,
}

impl H2Stream {
    /// Create an idle stream
    ///
    /// `send_initial` is the peer's SETTINGS_INITIAL_WINDOW_SIZE,
    /// `recv_initial` the one we advertised.
    pub fn new(id: StreamId, send_initial: u32, recv_initial: u32) -> Self {
        H2Stream {
            id,
            state: StreamState::Idle,
            request_headers: Vec::new(),
            send_window: FlowControlWindow::with_initial_size(send_initial),
            recv_window: WindowManager::new(recv_initial),
            header_block: BytesMut::new(),
            block_end_stream: false,
            status: None,
            headers: Vec::new(),
            trailers: Vec::new(),
            body: BytesMut::new(),
            end_stream_received: false,
            reset: None,
            response_taken: false,
        }
    }

    /// Get stream ID
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Get stream state
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Get the outbound window
    pub fn send_window(&self) -> &FlowControlWindow {
        &self.send_window
    }

    /// Get the inbound window manager
    pub fn recv_window(&self) -> &WindowManager {
        &self.recv_window
    }

    /// Get the request header list
    pub fn request_headers(&self) -> &[(String, String)] {
        &self.request_headers
    }

    /// Error code the stream was reset with, if any
    pub fn reset_code(&self) -> Option<ErrorCode> {
        self.reset
    }

    /// Whether `take_response` already handed out the outcome
    pub fn response_taken(&self) -> bool {
        self.response_taken
    }

    /// Append a request header
    ///
    /// Only legal before the stream is opened.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        if self.state != StreamState::Idle {
            return Err(Error::InvalidState(format!(
                "Cannot add headers to stream {} in state {:?}",
                self.id, self.state
            )));
        }
        self.request_headers.push((name.into(), value.into()));
        Ok(())
    }

    /// Transmit the request headers
    ///
    /// The header block is split into HEADERS and CONTINUATION frames of at
    /// most `max_frame_size` bytes.
    pub fn open(
        &mut self,
        end_stream: bool,
        codec: &mut HeaderCodec,
        max_frame_size: usize,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        if self.state != StreamState::Idle {
            return Err(Error::InvalidState(format!(
                "Stream {} already opened ({:?})",
                self.id, self.state
            )));
        }

        let mut block = codec.encode(&self.request_headers)?;
        let first = block.split_to(block.len().min(max_frame_size));
        sink.send_frame(HeadersFrame::new(self.id, first, end_stream, block.is_empty()).into())?;

        while !block.is_empty() {
            let fragment = block.split_to(block.len().min(max_frame_size));
            sink.send_frame(
                ContinuationFrame {
                    stream_id: self.id,
                    header_block: fragment,
                    end_headers: block.is_empty(),
                }
                .into(),
            )?;
        }

        self.state = if end_stream {
            StreamState::HalfClosedLocal
        } else {
            StreamState::Open
        };
        debug!(stream_id = self.id, end_stream, "stream opened");
        Ok(())
    }

    /// Transmit request body data
    ///
    /// `data` must fit the stream's send window; the caller waits for
    /// window before calling. Frames are at most `max_frame_size` bytes.
    pub fn send_data(
        &mut self,
        mut data: Bytes,
        end_stream: bool,
        max_frame_size: usize,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        if self.state == StreamState::Idle {
            return Err(Error::InvalidState(format!("Stream {} not opened", self.id)));
        }
        if !self.state.can_send() {
            return Err(Error::StreamClosed(self.id));
        }
        if data.is_empty() && !end_stream {
            return Ok(());
        }

        self.send_window.consume(data.len())?;

        loop {
            let chunk = data.split_to(data.len().min(max_frame_size));
            let last = data.is_empty();
            sink.send_frame(DataFrame::new(self.id, chunk, end_stream && last).into())?;
            if last {
                break;
            }
        }

        if end_stream {
            self.close_local();
        }
        Ok(())
    }

    /// Process one inbound frame addressed to this stream
    ///
    /// Stream-level problems reset the stream and return `Ok`; an error is
    /// returned only when the whole connection must fail.
    pub fn receive_frame(
        &mut self,
        frame: Frame,
        codec: &mut HeaderCodec,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        match frame {
            Frame::Headers(f) => {
                self.header_block.extend_from_slice(&f.header_block);
                self.block_end_stream = f.end_stream;
                if f.end_headers {
                    self.finish_header_block(codec, sink)?;
                }
            }
            Frame::Continuation(f) => {
                self.header_block.extend_from_slice(&f.header_block);
                if f.end_headers {
                    self.finish_header_block(codec, sink)?;
                }
            }
            Frame::Data(f) => self.receive_data(f, sink)?,
            Frame::RstStream(f) => {
                debug!(stream_id = self.id, error_code = %f.error_code, "stream reset by peer");
                self.reset = Some(f.error_code);
                self.state = StreamState::Closed;
            }
            Frame::WindowUpdate(f) => match self.send_window.increase(f.size_increment) {
                Ok(window) => trace!(stream_id = self.id, window, "stream window increased"),
                Err(err) => {
                    let code = err.goaway_code().unwrap_or(ErrorCode::FlowControlError);
                    self.send_reset(code, sink)?;
                }
            },
            Frame::Priority(_) | Frame::Unknown(_) => {}
            other => {
                return Err(Error::Protocol(format!(
                    "Unexpected {} frame on stream {}",
                    other.name(),
                    self.id
                )))
            }
        }
        Ok(())
    }

    /// Reset the stream locally and tell the peer
    pub fn send_reset(&mut self, code: ErrorCode, sink: &mut dyn FrameSink) -> Result<()> {
        debug!(stream_id = self.id, error_code = %code, "resetting stream");
        self.reset = Some(code);
        self.state = StreamState::Closed;
        sink.send_frame(RstStreamFrame::new(self.id, code).into())
    }

    /// Apply a new peer SETTINGS_INITIAL_WINDOW_SIZE to the send window
    pub fn update_initial_send_window(&mut self, new_initial: u32) -> Result<()> {
        self.send_window.update_initial_size(new_initial)
    }

    /// Hand out the response once the stream has an outcome
    ///
    /// Returns `None` while the response is still incomplete or after the
    /// outcome was already taken.
    pub fn take_response(&mut self) -> Option<Result<H2Response>> {
        if self.response_taken {
            return None;
        }

        let complete = self.end_stream_received && self.status.is_some();

        // RST_STREAM(NO_ERROR) after a full response is not a failure (RFC 7540 Section 8.1)
        if let Some(code) = self.reset {
            if !(complete && code == ErrorCode::NoError) {
                self.response_taken = true;
                return Some(Err(Error::StreamReset {
                    stream_id: self.id,
                    error_code: code,
                }));
            }
        }

        let status = match self.status {
            Some(status) if complete => status,
            _ => return None,
        };

        self.response_taken = true;
        Some(Ok(H2Response {
            stream_id: self.id,
            status,
            headers: std::mem::take(&mut self.headers),
            trailers: std::mem::take(&mut self.trailers),
            body: self.body.split().freeze(),
        }))
    }

    fn receive_data(&mut self, frame: DataFrame, sink: &mut dyn FrameSink) -> Result<()> {
        if self.state == StreamState::Idle {
            return Err(Error::Protocol(format!("DATA on idle stream {}", self.id)));
        }
        if !self.state.can_receive() {
            return self.send_reset(ErrorCode::StreamClosed, sink);
        }
        if self.status.is_none() {
            return self.send_reset(ErrorCode::ProtocolError, sink);
        }

        if let Some(increment) = self.recv_window.handle_received_frame(frame.frame_size()) {
            // No point widening a window the peer just closed
            if !frame.end_stream {
                sink.send_frame(WindowUpdateFrame::new(self.id, increment).into())?;
            }
        }

        trace!(stream_id = self.id, len = frame.data.len(), "received data");
        self.body.extend_from_slice(&frame.data);

        if frame.end_stream {
            self.close_remote();
        }
        Ok(())
    }

    fn finish_header_block(&mut self, codec: &mut HeaderCodec, sink: &mut dyn FrameSink) -> Result<()> {
        let block = self.header_block.split().freeze();

        // Decode before any state check so the HPACK context stays in sync
        let decoded = codec.decode(&block)?;
        let end_stream = self.block_end_stream;

        if self.state == StreamState::Idle {
            return Err(Error::Protocol(format!("HEADERS on idle stream {}", self.id)));
        }
        if !self.state.can_receive() {
            return self.send_reset(ErrorCode::StreamClosed, sink);
        }

        if self.status.is_none() {
            let (status, headers) = match split_status(decoded) {
                Some(parsed) => parsed,
                None => return self.send_reset(ErrorCode::ProtocolError, sink),
            };

            if (100..200).contains(&status) {
                if end_stream {
                    return self.send_reset(ErrorCode::ProtocolError, sink);
                }
                trace!(stream_id = self.id, status, "skipping informational response");
                return Ok(());
            }

            debug!(stream_id = self.id, status, "response headers received");
            self.status = Some(status);
            self.headers = headers;
        } else {
            // Trailers must close the stream and carry no pseudo-headers
            if !end_stream || decoded.iter().any(|(name, _)| name.starts_with(':')) {
                return self.send_reset(ErrorCode::ProtocolError, sink);
            }
            self.trailers = decoded;
        }

        if end_stream {
            self.close_remote();
        }
        Ok(())
    }

    fn close_local(&mut self) {
        self.state = match self.state {
            StreamState::Open => StreamState::HalfClosedLocal,
            StreamState::HalfClosedRemote => StreamState::Closed,
            other => other,
        };
    }

    fn close_remote(&mut self) {
        self.end_stream_received = true;
        self.state = match self.state {
            StreamState::Open => StreamState::HalfClosedRemote,
            StreamState::HalfClosedLocal => StreamState::Closed,
            other => other,
        };
    }
}

/// Separate a valid `:status` from the regular headers
fn split_status(decoded: Vec<(String, String)>) -> Option<(u16, Vec<(String, String)>)> {
    let mut status = None;
    let mut headers = Vec::with_capacity(decoded.len());

    for (name, value) in decoded {
        if name == ":status" {
            if status.is_some() || value.len() != 3 {
                return None;
            }
            status = Some(value.parse::<u16>().ok().filter(|s| (100..=999).contains(s))?);
        } else if name.starts_with(':') {
            return None;
        } else {
            headers.push((name, value));
        }
    }

    status.map(|status| (status, headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    impl FrameSink for Vec<Frame> {
        fn send_frame(&mut self, frame: Frame) -> Result<()> {
            self.push(frame);
            Ok(())
        }
    }

    fn block(server: &mut HeaderCodec, pairs: &[(&str, &str)]) -> Bytes {
        let list: Vec<(String, String)> = pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        server.encode(&list).unwrap()
    }

    fn headers_frame(server: &mut HeaderCodec, pairs: &[(&str, &str)], end_stream: bool) -> Frame {
        HeadersFrame::new(1, block(server, pairs), end_stream, true).into()
    }

    fn open_stream(codec: &mut HeaderCodec, sink: &mut Vec<Frame>) -> H2Stream {
        let mut stream = H2Stream::new(1, 65535, 65535);
        stream.add_header(":method", "GET").unwrap();
        stream.add_header(":path", "/").unwrap();
        stream.open(true, codec, 16384, sink).unwrap();
        stream
    }

    #[test]
    fn test_stream_state_transitions() {
        let mut codec = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = H2Stream::new(1, 65535, 65535);
        assert_eq!(stream.state(), StreamState::Idle);

        // Idle -> Open (send HEADERS without END_STREAM)
        stream.open(false, &mut codec, 16384, &mut sink).unwrap();
        assert_eq!(stream.state(), StreamState::Open);

        // Open -> HalfClosedLocal (send DATA with END_STREAM)
        stream
            .send_data(Bytes::from(vec![0u8; 100]), true, 16384, &mut sink)
            .unwrap();
        assert_eq!(stream.state(), StreamState::HalfClosedLocal);
        assert_eq!(stream.send_window().size(), 65435);

        assert!(matches!(
            stream.send_data(Bytes::from("x"), false, 16384, &mut sink),
            Err(Error::StreamClosed(1))
        ));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_headers_frozen_after_open() {
        let mut codec = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = open_stream(&mut codec, &mut sink);

        assert!(matches!(stream.add_header("x", "y"), Err(Error::InvalidState(_))));
        assert!(matches!(
            stream.open(false, &mut codec, 16384, &mut sink),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_open_splits_header_block() {
        let mut codec = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = H2Stream::new(1, 65535, 65535);
        stream.add_header("x-long", "a".repeat(40)).unwrap();
        stream.open(true, &mut codec, 16, &mut sink).unwrap();

        assert!(sink.len() >= 3);
        match &sink[0] {
            Frame::Headers(h) => {
                assert!(h.end_stream);
                assert!(!h.end_headers);
                assert_eq!(h.header_block.len(), 16);
            }
            other => panic!("expected HEADERS, got {:?}", other),
        }
        let last = sink.len() - 1;
        for (i, frame) in sink.iter().enumerate().skip(1) {
            match frame {
                Frame::Continuation(c) => assert_eq!(c.end_headers, i == last),
                other => panic!("expected CONTINUATION, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_send_data_splits_frames() {
        let mut codec = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = H2Stream::new(1, 65535, 65535);
        stream.open(false, &mut codec, 16384, &mut sink).unwrap();
        sink.clear();

        stream
            .send_data(Bytes::from(vec![1u8; 25]), true, 10, &mut sink)
            .unwrap();

        let sizes: Vec<(usize, bool)> = sink
            .iter()
            .map(|f| match f {
                Frame::Data(d) => (d.data.len(), d.end_stream),
                other => panic!("expected DATA, got {:?}", other),
            })
            .collect();
        assert_eq!(sizes, vec![(10, false), (10, false), (5, true)]);
    }

    #[test]
    fn test_send_data_respects_window() {
        let mut codec = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = H2Stream::new(1, 10, 65535);
        stream.open(false, &mut codec, 16384, &mut sink).unwrap();

        assert!(stream
            .send_data(Bytes::from(vec![0u8; 11]), false, 16384, &mut sink)
            .is_err());
        assert_eq!(stream.send_window().size(), 10);
    }

    #[test]
    fn test_simple_response() {
        let mut codec = HeaderCodec::new();
        let mut server = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = open_stream(&mut codec, &mut sink);

        let frame = headers_frame(&mut server, &[(":status", "200"), ("content-type", "text/plain")], false);
        stream.receive_frame(frame, &mut codec, &mut sink).unwrap();
        assert!(stream.take_response().is_none());

        let data = DataFrame::new(1, Bytes::from("hello"), true);
        stream.receive_frame(data.into(), &mut codec, &mut sink).unwrap();
        assert_eq!(stream.state(), StreamState::Closed);

        let response = stream.take_response().unwrap().unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.body(), b"hello");
        assert!(stream.take_response().is_none());
    }

    #[test]
    fn test_informational_response_skipped() {
        let mut codec = HeaderCodec::new();
        let mut server = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = open_stream(&mut codec, &mut sink);

        let early = headers_frame(&mut server, &[(":status", "103"), ("link", "</a>")], false);
        stream.receive_frame(early, &mut codec, &mut sink).unwrap();
        let fin = headers_frame(&mut server, &[(":status", "204")], true);
        stream.receive_frame(fin, &mut codec, &mut sink).unwrap();

        let response = stream.take_response().unwrap().unwrap();
        assert_eq!(response.status(), 204);
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_missing_status_resets_stream() {
        let mut codec = HeaderCodec::new();
        let mut server = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = open_stream(&mut codec, &mut sink);
        sink.clear();

        let frame = headers_frame(&mut server, &[("content-type", "text/plain")], true);
        stream.receive_frame(frame, &mut codec, &mut sink).unwrap();

        assert_eq!(sink, vec![Frame::from(RstStreamFrame::new(1, ErrorCode::ProtocolError))]);
        assert!(matches!(
            stream.take_response(),
            Some(Err(Error::StreamReset {
                stream_id: 1,
                error_code: ErrorCode::ProtocolError
            }))
        ));
    }

    #[test]
    fn test_trailers_and_continuation() {
        let mut codec = HeaderCodec::new();
        let mut server = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = open_stream(&mut codec, &mut sink);

        let full = block(&mut server, &[(":status", "200"), ("x-a", "1")]);
        let (head, tail) = full.split_at(2);
        let headers = HeadersFrame::new(1, Bytes::copy_from_slice(head), false, false);
        stream.receive_frame(headers.into(), &mut codec, &mut sink).unwrap();
        let continuation = ContinuationFrame {
            stream_id: 1,
            header_block: Bytes::copy_from_slice(tail),
            end_headers: true,
        };
        stream.receive_frame(continuation.into(), &mut codec, &mut sink).unwrap();

        let trailers = headers_frame(&mut server, &[("grpc-status", "0")], true);
        stream.receive_frame(trailers, &mut codec, &mut sink).unwrap();

        let response = stream.take_response().unwrap().unwrap();
        assert_eq!(response.header("x-a"), Some("1"));
        assert_eq!(response.trailers(), &[("grpc-status".to_string(), "0".to_string())]);
    }

    #[test]
    fn test_reset_by_peer() {
        let mut codec = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = open_stream(&mut codec, &mut sink);

        let rst = RstStreamFrame::new(1, ErrorCode::RefusedStream);
        stream.receive_frame(rst.into(), &mut codec, &mut sink).unwrap();

        assert!(stream.state().is_closed());
        assert!(matches!(
            stream.take_response(),
            Some(Err(Error::StreamReset {
                error_code: ErrorCode::RefusedStream,
                ..
            }))
        ));
    }

    #[test]
    fn test_no_error_reset_after_complete_response() {
        let mut codec = HeaderCodec::new();
        let mut server = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = H2Stream::new(1, 65535, 65535);
        stream.open(false, &mut codec, 16384, &mut sink).unwrap();

        let frame = headers_frame(&mut server, &[(":status", "413")], true);
        stream.receive_frame(frame, &mut codec, &mut sink).unwrap();
        assert_eq!(stream.state(), StreamState::HalfClosedRemote);

        let rst = RstStreamFrame::new(1, ErrorCode::NoError);
        stream.receive_frame(rst.into(), &mut codec, &mut sink).unwrap();

        assert_eq!(stream.take_response().unwrap().unwrap().status(), 413);
    }

    #[test]
    fn test_data_after_end_stream_resets() {
        let mut codec = HeaderCodec::new();
        let mut server = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = H2Stream::new(1, 65535, 65535);
        stream.open(false, &mut codec, 16384, &mut sink).unwrap();

        let frame = headers_frame(&mut server, &[(":status", "200")], true);
        stream.receive_frame(frame, &mut codec, &mut sink).unwrap();
        sink.clear();

        let late = DataFrame::new(1, Bytes::from("late"), false);
        stream.receive_frame(late.into(), &mut codec, &mut sink).unwrap();
        assert_eq!(sink, vec![Frame::from(RstStreamFrame::new(1, ErrorCode::StreamClosed))]);
    }

    #[test]
    fn test_inbound_window_update() {
        let mut codec = HeaderCodec::new();
        let mut server = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = H2Stream::new(1, 65535, 4000);
        stream.open(true, &mut codec, 16384, &mut sink).unwrap();

        let frame = headers_frame(&mut server, &[(":status", "200")], false);
        stream.receive_frame(frame, &mut codec, &mut sink).unwrap();
        sink.clear();

        let data = DataFrame::new(1, Bytes::from(vec![0u8; 3500]), false);
        stream.receive_frame(data.into(), &mut codec, &mut sink).unwrap();
        assert_eq!(sink, vec![Frame::from(WindowUpdateFrame::new(1, 3500))]);
        assert_eq!(stream.recv_window().window_size(), 4000);
    }

    #[test]
    fn test_send_window_update_and_overflow() {
        let mut codec = HeaderCodec::new();
        let mut sink = Vec::new();
        let mut stream = H2Stream::new(1, 100, 65535);
        stream.open(false, &mut codec, 16384, &mut sink).unwrap();
        sink.clear();

        stream
            .receive_frame(WindowUpdateFrame::new(1, 50).into(), &mut codec, &mut sink)
            .unwrap();
        assert_eq!(stream.send_window().size(), 150);

        stream
            .receive_frame(WindowUpdateFrame::new(1, 0x7FFF_FFFF).into(), &mut codec, &mut sink)
            .unwrap();
        assert_eq!(sink, vec![Frame::from(RstStreamFrame::new(1, ErrorCode::FlowControlError))]);
        assert!(stream.state().is_closed());
    }

    #[test]
    fn test_initial_window_delta() {
        let mut stream = H2Stream::new(1, 65535, 65535);
        stream.update_initial_send_window(100).unwrap();
        assert_eq!(stream.send_window().size(), 100);
        stream.update_initial_send_window(1100).unwrap();
        assert_eq!(stream.send_window().size(), 1100);
    }

    #[test]
    fn test_split_status() {
        let ok = vec![(":status".to_string(), "200".to_string())];
        assert_eq!(split_status(ok).map(|(s, _)| s), Some(200));

        let bad = vec![(":status".to_string(), "2000".to_string())];
        assert!(split_status(bad).is_none());

        let unknown_pseudo = vec![
            (":status".to_string(), "200".to_string()),
            (":path".to_string(), "/".to_string()),
        ];
        assert!(split_status(unknown_pseudo).is_none());
    }
}
