//! HTTP/2 client connection
//!
//! [`Connection`] owns the session to one server and multiplexes any number
//! of request streams over it. All I/O is blocking and happens on the
//! caller's thread: `getresponse` reads and dispatches frames until the
//! requested stream has an outcome, and `send` does the same while it waits
//! for flow control window.

use super::codec::{FrameCodec, FRAME_HEADER_SIZE};
use super::flow_control::{FlowControlWindow, WindowManager};
use super::frames::*;
use super::hpack::HeaderCodec;
use super::response::H2Response;
use super::settings::{Settings, SettingsBuilder};
use super::stream::{FrameSink, H2Stream, StreamId, StreamState};
use super::{
    CONNECTION_PREFACE, CONNECTION_STREAM_ID, DEFAULT_INITIAL_WINDOW_SIZE, DEFAULT_MAX_FRAME_SIZE,
    MAX_STREAM_ID,
};
use crate::error::{Error, ErrorCode, Result};
use crate::session::{Connector, Session, SessionOps, ShutdownHandle, ALPN_H2};
use crate::tls::{TlsConfig, TlsConnector};
use bytes::{Bytes, BytesMut};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default bound on each blocking socket operation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection-specific header fields (RFC 7540 Section 8.1.2.2)
const CONNECTION_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Clone)]
struct ConnectionConfig {
    initial_window_size: u32,
    max_frame_size: u32,
    timeout: Option<Duration>,
}

/// Socket plus connection-level windows
///
/// This is the [`FrameSink`] streams write through, so every DATA frame is
/// charged against the connection window on its way out.
struct Transport<S: SessionOps> {
    session: Option<Session<S>>,
    /// Budget the peer granted us
    send_window: FlowControlWindow,
    /// Budget we granted the peer
    recv_window: WindowManager,
}

impl<S: SessionOps> Transport<S> {
    fn new() -> Self {
        Transport {
            session: None,
            send_window: FlowControlWindow::new(),
            recv_window: WindowManager::default(),
        }
    }

    fn read_frame(&mut self, max_frame_size: u32) -> Result<Frame> {
        let session = self.session.as_mut().ok_or(Error::ConnectionClosed)?;

        let mut header = [0u8; FRAME_HEADER_SIZE];
        session.read_exact(&mut header)?;
        let header = FrameCodec::decode_header(&header);

        if header.length > max_frame_size as usize {
            return Err(Error::FrameSize(format!(
                "Frame of {} bytes exceeds SETTINGS_MAX_FRAME_SIZE {}",
                header.length, max_frame_size
            )));
        }

        let mut payload = vec![0u8; header.length];
        session.read_exact(&mut payload)?;

        let frame = FrameCodec::decode_frame(header, Bytes::from(payload))?;
        trace!(
            stream_id = frame.stream_id(),
            frame = frame.name(),
            len = header.length,
            "received frame"
        );
        Ok(frame)
    }

    fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(err) = session.close() {
                trace!(error = %err, "session close failed");
            }
        }
    }
}

impl<S: SessionOps> FrameSink for Transport<S> {
    fn send_frame(&mut self, frame: Frame) -> Result<()> {
        let session = self.session.as_mut().ok_or(Error::ConnectionClosed)?;

        if let Frame::Data(data) = &frame {
            self.send_window.consume(data.frame_size())?;
        }

        let encoded = frame.serialize();
        trace!(
            stream_id = frame.stream_id(),
            frame = frame.name(),
            len = encoded.len() - FRAME_HEADER_SIZE,
            "sending frame"
        );
        session.write_all(&encoded)
    }
}

/// HTTP/2 client connection
pub struct Connection<C: Connector = TlsConnector> {
    host: String,
    port: u16,
    config: ConnectionConfig,
    connector: C,
    transport: Transport<C::Session>,
    codec: HeaderCodec,
    /// Live streams, keyed by id
    streams: BTreeMap<StreamId, H2Stream>,
    /// Outcomes of closed streams not yet returned by `getresponse`
    finished: BTreeMap<StreamId, Result<H2Response>>,
    recent_stream: Option<StreamId>,
    next_stream_id: StreamId,
    local_settings: Settings,
    remote_settings: Settings,
    settings_acked: bool,
    /// Stream whose header block awaits CONTINUATION frames
    continuation: Option<StreamId>,
    /// Header block fragments for streams no longer tracked
    orphan_block: BytesMut,
}

impl Connection<TlsConnector> {
    /// Create a TLS connection with default settings
    ///
    /// Nothing is sent until [`Connection::connect`] or the first request.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        ConnectionBuilder::new(host, port).build()
    }
}

impl<C: Connector> Connection<C> {
    /// Get destination host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get destination port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether a session is currently open
    pub fn is_connected(&self) -> bool {
        self.transport.session.is_some()
    }

    /// Id the next `putrequest` will assign
    pub fn next_stream_id(&self) -> StreamId {
        self.next_stream_id
    }

    /// Most recently created stream, the default target of stream operations
    pub fn recent_stream(&self) -> Option<StreamId> {
        self.recent_stream
    }

    /// Get a live stream
    pub fn stream(&self, stream_id: StreamId) -> Option<&H2Stream> {
        self.streams.get(&stream_id)
    }

    /// Connection-level outbound window
    pub fn out_flow_control_window(&self) -> i64 {
        self.transport.send_window.size()
    }

    /// Connection-level inbound window manager
    pub fn window_manager(&self) -> &WindowManager {
        &self.transport.recv_window
    }

    /// Settings we advertise
    pub fn local_settings(&self) -> &Settings {
        &self.local_settings
    }

    /// Settings the peer advertised
    pub fn remote_settings(&self) -> &Settings {
        &self.remote_settings
    }

    /// Whether the peer acknowledged our SETTINGS
    pub fn settings_acked(&self) -> bool {
        self.settings_acked
    }

    /// Handle for aborting blocked I/O from another thread
    pub fn shutdown_handle(&self) -> Option<ShutdownHandle> {
        let session = self.transport.session.as_ref()?;
        session.get_ref().shutdown_handle().map(ShutdownHandle::new)
    }

    /// Open the session and exchange the connection preface
    ///
    /// Does nothing if already connected. Streams created before the call
    /// are kept.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let result = self.handshake();
        if let Err(err) = &result {
            self.fail(err);
        }
        result
    }

    /// Close the session and reset all connection state
    ///
    /// The connection can be connected again afterwards.
    pub fn close(&mut self) {
        if self.is_connected() {
            debug!(host = %self.host, "closing connection");
            let goaway = GoawayFrame::new(0, ErrorCode::NoError, Bytes::new());
            if let Err(err) = self.transport.send_frame(goaway.into()) {
                debug!(error = %err, "GOAWAY not sent");
            }
        }
        self.reset();
    }

    /// Create a stream carrying the mandatory pseudo-headers
    ///
    /// Nothing is transmitted until [`Connection::endheaders`].
    pub fn putrequest(&mut self, method: &str, path: &str) -> Result<StreamId> {
        let stream_id = self.next_stream_id;
        if stream_id > MAX_STREAM_ID {
            return Err(Error::StreamIdsExhausted);
        }
        if let Some(max) = self.remote_settings.concurrency_limit() {
            if self.streams.len() >= max as usize {
                return Err(Error::TooManyStreams);
            }
        }

        let mut stream = H2Stream::new(
            stream_id,
            self.remote_settings.stream_window(),
            self.config.initial_window_size,
        );
        stream.add_header(":method", method)?;
        stream.add_header(":scheme", self.connector.scheme())?;
        stream.add_header(":authority", self.authority())?;
        stream.add_header(":path", path)?;

        self.streams.insert(stream_id, stream);
        self.recent_stream = Some(stream_id);
        self.next_stream_id += 2;

        debug!(stream_id, method, path, "stream created");
        Ok(stream_id)
    }

    /// Add a request header to a stream that has not been opened yet
    ///
    /// Names are lowercased. Connection-specific headers are rejected.
    pub fn putheader(&mut self, name: &str, value: &str, stream_id: Option<StreamId>) -> Result<()> {
        let name = validate_header(name, value)?;
        let stream_id = self.target(stream_id)?;
        let stream = self
            .streams
            .get_mut(&stream_id)
            .ok_or(Error::StreamNotFound(stream_id))?;
        stream.add_header(name, value)
    }

    /// Transmit a stream's headers, then `body` if given
    ///
    /// HEADERS carries END_STREAM only when `end_stream` is set and there is
    /// no body. Connects first if needed.
    pub fn endheaders(
        &mut self,
        body: Option<Bytes>,
        end_stream: bool,
        stream_id: Option<StreamId>,
    ) -> Result<()> {
        let stream_id = self.target(stream_id)?;
        self.connect()?;

        let max_frame_size = self.remote_settings.frame_size_limit() as usize;
        let stream = self
            .streams
            .get_mut(&stream_id)
            .ok_or(Error::StreamNotFound(stream_id))?;
        let result = stream.open(
            end_stream && body.is_none(),
            &mut self.codec,
            max_frame_size,
            &mut self.transport,
        );
        self.guard(result)?;

        if let Some(body) = body {
            self.send(body, end_stream, Some(stream_id))?;
        }
        Ok(())
    }

    /// Send request body data on an open stream
    ///
    /// Blocks, processing inbound frames, whenever the stream or connection
    /// window is exhausted. The last frame carries END_STREAM if `end_stream`.
    pub fn send(&mut self, data: impl Into<Bytes>, end_stream: bool, stream_id: Option<StreamId>) -> Result<()> {
        let stream_id = self.target(stream_id)?;
        let mut data = data.into();

        loop {
            let window = self.wait_for_window(stream_id, data.len())?;
            let chunk = data.split_to(data.len().min(window));
            let last = data.is_empty();

            let max_frame_size = self.remote_settings.frame_size_limit() as usize;
            let stream = self
                .streams
                .get_mut(&stream_id)
                .ok_or(Error::StreamNotFound(stream_id))?;
            let result = stream.send_data(chunk, end_stream && last, max_frame_size, &mut self.transport);
            self.guard(result)?;
            self.reap(stream_id);

            if last {
                return Ok(());
            }
        }
    }

    /// Issue a complete request
    ///
    /// Returns the stream id to pass to [`Connection::getresponse`].
    pub fn request(
        &mut self,
        method: &str,
        path: &str,
        body: Option<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<StreamId> {
        let stream_id = self.putrequest(method, path)?;

        for (name, value) in headers {
            if let Err(err) = self.putheader(name, value, Some(stream_id)) {
                self.streams.remove(&stream_id);
                return Err(err);
            }
        }

        self.endheaders(body, true, Some(stream_id))?;
        Ok(stream_id)
    }

    /// Block until a stream's response is complete
    ///
    /// With `None`, waits on the oldest stream whose response has not been
    /// returned yet.
    pub fn getresponse(&mut self, stream_id: Option<StreamId>) -> Result<H2Response> {
        let stream_id = match stream_id {
            Some(id) => id,
            None => self.oldest_outstanding().ok_or(Error::NoPendingStreams)?,
        };

        loop {
            if let Some(outcome) = self.finished.remove(&stream_id) {
                return outcome;
            }

            let stream = self
                .streams
                .get_mut(&stream_id)
                .ok_or(Error::StreamNotFound(stream_id))?;
            if stream.state() == StreamState::Idle {
                return Err(Error::InvalidState(format!(
                    "Stream {} has not been sent",
                    stream_id
                )));
            }
            if stream.response_taken() {
                return Err(Error::InvalidState(format!(
                    "Response for stream {} already returned",
                    stream_id
                )));
            }
            if let Some(outcome) = stream.take_response() {
                return outcome;
            }

            self.pump()?;
        }
    }

    fn handshake(&mut self) -> Result<()> {
        debug!(
            host = %self.host,
            port = self.port,
            scheme = self.connector.scheme(),
            "connecting"
        );

        let mut ops = self
            .connector
            .connect(&self.host, self.port, self.config.timeout)?;
        if ops.negotiated_protocol() != Some(ALPN_H2) {
            let protocol = ops.negotiated_protocol().map(<[u8]>::to_vec);
            if let Err(err) = ops.close() {
                trace!(error = %err, "session close failed");
            }
            return Err(Error::AlpnFailed(protocol));
        }

        let mut session = Session::new(ops, self.config.timeout);
        session.write_all(CONNECTION_PREFACE)?;
        self.transport.session = Some(session);
        self.transport
            .send_frame(SettingsFrame::new(self.local_settings.clone()).into())?;

        // The server preface is a SETTINGS frame (RFC 7540 Section 3.5)
        let frame = self.transport.read_frame(self.config.max_frame_size)?;
        match &frame {
            Frame::Settings(settings) if !settings.ack => {}
            other => {
                return Err(Error::Protocol(format!(
                    "Expected SETTINGS as first frame, got {}",
                    other.name()
                )))
            }
        }
        self.dispatch(frame)?;

        debug!(host = %self.host, "connection established");
        Ok(())
    }

    /// Read one frame and dispatch it
    ///
    /// Any failure here is fatal: the connection is reset before the error
    /// is returned.
    fn pump(&mut self) -> Result<()> {
        let result = match self.transport.read_frame(self.config.max_frame_size) {
            Ok(frame) => self.dispatch(frame),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.fail(err);
        }
        result
    }

    fn dispatch(&mut self, frame: Frame) -> Result<()> {
        let stream_id = frame.stream_id();
        self.track_header_block(&frame)?;

        if let Frame::Data(data) = &frame {
            if let Some(increment) = self.transport.recv_window.handle_received_frame(data.frame_size()) {
                self.transport
                    .send_frame(WindowUpdateFrame::new(CONNECTION_STREAM_ID, increment).into())?;
            }
        }

        if stream_id == CONNECTION_STREAM_ID {
            return self.receive_frame(frame);
        }

        if let Frame::PushPromise(_) = frame {
            return Err(Error::Protocol("PUSH_PROMISE received with push disabled".to_string()));
        }

        match self.streams.get_mut(&stream_id) {
            Some(stream) => {
                stream.receive_frame(frame, &mut self.codec, &mut self.transport)?;
                self.reap(stream_id);
                Ok(())
            }
            None => self.receive_untracked(frame),
        }
    }

    /// Connection-level frame handling
    fn receive_frame(&mut self, frame: Frame) -> Result<()> {
        match frame {
            Frame::Settings(f) if f.ack => {
                debug!("SETTINGS acknowledged");
                self.settings_acked = true;
                Ok(())
            }
            Frame::Settings(f) => {
                self.update_settings(&f.settings)?;
                self.transport.send_frame(SettingsFrame::ack().into())
            }
            Frame::WindowUpdate(f) => {
                let window = self.transport.send_window.increase(f.size_increment)?;
                trace!(window, "connection window increased");
                Ok(())
            }
            Frame::Ping(f) if f.ack => Ok(()),
            Frame::Ping(f) => self.transport.send_frame(PingFrame::ack(f.data).into()),
            Frame::Goaway(f) => {
                let debug_data = String::from_utf8_lossy(&f.debug_data).into_owned();
                if f.error_code == ErrorCode::NoError {
                    debug!(last_stream_id = f.last_stream_id, "peer closed connection");
                    Err(Error::ConnectionClosed)
                } else {
                    warn!(error_code = %f.error_code, debug_data = %debug_data, "GOAWAY received");
                    Err(Error::GoAway {
                        error_code: f.error_code,
                        debug_data,
                    })
                }
            }
            other => Err(Error::Protocol(format!(
                "Unexpected {} frame on stream 0",
                other.name()
            ))),
        }
    }

    fn update_settings(&mut self, settings: &Settings) -> Result<()> {
        if let Some(size) = settings.header_table_size {
            self.codec.set_header_table_size(size);
        }

        if let Some(new_size) = settings.initial_window_size {
            let old_size = self.remote_settings.stream_window();
            let delta = new_size as i64 - old_size as i64;

            for stream in self.streams.values_mut() {
                stream.update_initial_send_window(new_size)?;
            }

            let recv_window = &mut self.transport.recv_window;
            recv_window.adjust_initial_window_size(delta);
            let increment = match delta {
                d if d < 0 => recv_window.handle_received_frame(0),
                d if d > 0 => recv_window.grow(d),
                _ => None,
            };
            if let Some(increment) = increment {
                self.transport
                    .send_frame(WindowUpdateFrame::new(CONNECTION_STREAM_ID, increment).into())?;
            }

            debug!(old_size, new_size, streams = self.streams.len(), "initial window size changed");
        }

        self.remote_settings.merge(settings);
        debug!(?settings, "applied peer settings");
        Ok(())
    }

    /// Enforce that CONTINUATION frames follow their header block directly
    fn track_header_block(&mut self, frame: &Frame) -> Result<()> {
        match (self.continuation, frame) {
            (Some(expected), Frame::Continuation(f)) if f.stream_id == expected => {
                if f.end_headers {
                    self.continuation = None;
                }
            }
            (Some(expected), other) => {
                return Err(Error::Protocol(format!(
                    "Expected CONTINUATION on stream {}, got {} on stream {}",
                    expected,
                    other.name(),
                    other.stream_id()
                )))
            }
            (None, Frame::Continuation(f)) => {
                return Err(Error::Protocol(format!(
                    "CONTINUATION without a header block on stream {}",
                    f.stream_id
                )))
            }
            (None, Frame::Headers(f)) if !f.end_headers => self.continuation = Some(f.stream_id),
            _ => {}
        }
        Ok(())
    }

    /// Frames for streams we no longer (or never) tracked
    fn receive_untracked(&mut self, frame: Frame) -> Result<()> {
        let stream_id = frame.stream_id();
        let idle = stream_id % 2 == 0 || stream_id >= self.next_stream_id;
        if idle && !matches!(frame, Frame::Priority(_) | Frame::Unknown(_)) {
            return Err(Error::Protocol(format!(
                "{} frame on idle stream {}",
                frame.name(),
                stream_id
            )));
        }

        // Header blocks still update the shared HPACK context
        match frame {
            Frame::Headers(f) => {
                self.orphan_block.extend_from_slice(&f.header_block);
                if f.end_headers {
                    self.decode_orphan_block()?;
                }
            }
            Frame::Continuation(f) => {
                self.orphan_block.extend_from_slice(&f.header_block);
                if f.end_headers {
                    self.decode_orphan_block()?;
                }
            }
            other => trace!(stream_id, frame = other.name(), "ignoring frame for closed stream"),
        }
        Ok(())
    }

    fn decode_orphan_block(&mut self) -> Result<()> {
        let block = self.orphan_block.split();
        self.codec.decode(&block)?;
        Ok(())
    }

    /// Pump until both windows allow at least one byte on `stream_id`
    ///
    /// Returns the number of bytes that may be sent now.
    fn wait_for_window(&mut self, stream_id: StreamId, wanted: usize) -> Result<usize> {
        loop {
            let stream = match self.streams.get(&stream_id) {
                Some(stream) => stream,
                None => return Err(self.departed(stream_id)),
            };
            if stream.state() == StreamState::Idle {
                return Err(Error::InvalidState(format!("Stream {} not opened", stream_id)));
            }
            if !stream.state().can_send() {
                return Err(Error::StreamClosed(stream_id));
            }

            let window = stream
                .send_window()
                .available()
                .min(self.transport.send_window.available());
            if wanted == 0 || window > 0 {
                return Ok(window);
            }

            debug!(
                stream_id,
                stream_window = stream.send_window().size(),
                connection_window = self.transport.send_window.size(),
                "waiting for flow control window"
            );
            self.pump()?;
        }
    }

    /// Error describing why a stream is no longer in the table
    fn departed(&self, stream_id: StreamId) -> Error {
        match self.finished.get(&stream_id) {
            Some(Err(Error::StreamReset {
                stream_id,
                error_code,
            })) => Error::StreamReset {
                stream_id: *stream_id,
                error_code: *error_code,
            },
            Some(_) => Error::StreamClosed(stream_id),
            None if stream_id % 2 == 1 && stream_id < self.next_stream_id => Error::StreamClosed(stream_id),
            None => Error::StreamNotFound(stream_id),
        }
    }

    /// Move a closed stream's outcome out of the stream table
    fn reap(&mut self, stream_id: StreamId) {
        let closed = self
            .streams
            .get(&stream_id)
            .map_or(false, |stream| stream.state().is_closed());
        if !closed {
            return;
        }

        if let Some(mut stream) = self.streams.remove(&stream_id) {
            debug!(stream_id, "stream closed");
            if let Some(outcome) = stream.take_response() {
                self.finished.insert(stream_id, outcome);
            }
        }
    }

    fn oldest_outstanding(&self) -> Option<StreamId> {
        let finished = self.finished.keys().next().copied();
        let live = self
            .streams
            .iter()
            .find(|(_, stream)| stream.state() != StreamState::Idle && !stream.response_taken())
            .map(|(id, _)| *id);

        match (finished, live) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn target(&self, stream_id: Option<StreamId>) -> Result<StreamId> {
        stream_id.or(self.recent_stream).ok_or(Error::NoPendingStreams)
    }

    fn authority(&self) -> String {
        let default_port = if self.connector.scheme() == "https" { 443 } else { 80 };
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        if self.port == default_port {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }

    /// Reset the connection if `result` carries a fatal error
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_fatal() {
                self.fail(err);
            }
        }
        result
    }

    fn fail(&mut self, err: &Error) {
        warn!(host = %self.host, error = %err, "connection failed");
        if let Some(code) = err.goaway_code() {
            let goaway = GoawayFrame::new(0, code, Bytes::from(err.to_string()));
            if let Err(send_err) = self.transport.send_frame(goaway.into()) {
                debug!(error = %send_err, "GOAWAY not sent");
            }
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.transport.close();
        self.transport.send_window = FlowControlWindow::new();
        self.transport.recv_window = WindowManager::default();
        self.codec = HeaderCodec::new();
        self.streams.clear();
        self.finished.clear();
        self.recent_stream = None;
        self.next_stream_id = 1;
        self.remote_settings = Settings::new();
        self.settings_acked = false;
        self.continuation = None;
        self.orphan_block.clear();
    }
}

/// Lowercase a request header name and reject what HTTP/2 forbids
fn validate_header(name: &str, value: &str) -> Result<String> {
    let name = name.to_ascii_lowercase();

    if name.is_empty() || name.starts_with(':') {
        return Err(Error::InvalidHeader(format!("Invalid header name {:?}", name)));
    }
    if CONNECTION_HEADERS.contains(&name.as_str()) {
        return Err(Error::InvalidHeader(format!(
            "Connection-specific header {:?} is not allowed in HTTP/2",
            name
        )));
    }
    if name == "te" && !value.eq_ignore_ascii_case("trailers") {
        return Err(Error::InvalidHeader(format!(
            "TE header may only carry \"trailers\", got {:?}",
            value
        )));
    }
    if value.contains(|c: char| matches!(c, '\r' | '\n' | '\0')) {
        return Err(Error::InvalidHeader(format!(
            "Header {:?} value contains a forbidden character",
            name
        )));
    }

    Ok(name)
}

/// Connection builder
pub struct ConnectionBuilder {
    host: String,
    port: u16,
    initial_window_size: u32,
    max_frame_size: u32,
    timeout: Option<Duration>,
    tls: Option<TlsConfig>,
}

impl ConnectionBuilder {
    /// Create a builder for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ConnectionBuilder {
            host: host.into(),
            port,
            initial_window_size: DEFAULT_INITIAL_WINDOW_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            timeout: Some(DEFAULT_TIMEOUT),
            tls: None,
        }
    }

    /// Set the advertised stream-level initial window size
    pub fn initial_window_size(mut self, size: u32) -> Self {
        self.initial_window_size = size;
        self
    }

    /// Set the largest frame payload accepted from the peer
    pub fn max_frame_size(mut self, size: u32) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Bound every blocking socket operation (`None` blocks forever)
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom TLS configuration
    pub fn tls(mut self, config: TlsConfig) -> Self {
        self.tls = Some(config);
        self
    }

    /// Build a TLS connection
    pub fn build(mut self) -> Result<Connection<TlsConnector>> {
        let connector = match self.tls.take() {
            Some(config) => TlsConnector::new(config),
            None => TlsConnector::with_defaults()?,
        };
        self.build_with(connector)
    }

    /// Build a connection over any connector
    pub fn build_with<C: Connector>(self, connector: C) -> Result<Connection<C>> {
        let local_settings = SettingsBuilder::new()
            .enable_push(false)
            .initial_window_size(self.initial_window_size)
            .max_frame_size(self.max_frame_size)
            .build()?;

        Ok(Connection {
            host: self.host,
            port: self.port,
            config: ConnectionConfig {
                initial_window_size: self.initial_window_size,
                max_frame_size: self.max_frame_size,
                timeout: self.timeout,
            },
            connector,
            transport: Transport::new(),
            codec: HeaderCodec::new(),
            streams: BTreeMap::new(),
            finished: BTreeMap::new(),
            recent_stream: None,
            next_stream_id: 1,
            local_settings,
            remote_settings: Settings::new(),
            settings_acked: false,
            continuation: None,
            orphan_block: BytesMut::new(),
        })
    }
}
