//! SETTINGS parameters (RFC 7540 Section 6.5)
//!
//! A [`Settings`] value records only the parameters a peer actually carried;
//! the accessors fold in the protocol defaults.

use super::{DEFAULT_HEADER_TABLE_SIZE, DEFAULT_INITIAL_WINDOW_SIZE, DEFAULT_MAX_FRAME_SIZE, MAX_WINDOW_SIZE};
use crate::error::{Error, Result};
use std::fmt;

/// Largest legal SETTINGS_MAX_FRAME_SIZE (2^24 - 1)
pub const MAX_MAX_FRAME_SIZE: u32 = 0x00FF_FFFF;

/// Parameter identifiers this engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SettingsParameter {
    HeaderTableSize = 0x1,
    EnablePush = 0x2,
    MaxConcurrentStreams = 0x3,
    InitialWindowSize = 0x4,
    MaxFrameSize = 0x5,
    MaxHeaderListSize = 0x6,
}

impl SettingsParameter {
    /// Every known parameter, in identifier order
    pub const ALL: [SettingsParameter; 6] = [
        SettingsParameter::HeaderTableSize,
        SettingsParameter::EnablePush,
        SettingsParameter::MaxConcurrentStreams,
        SettingsParameter::InitialWindowSize,
        SettingsParameter::MaxFrameSize,
        SettingsParameter::MaxHeaderListSize,
    ];

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// `None` for identifiers outside RFC 7540
    pub fn from_u16(id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_u16() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SettingsParameter::HeaderTableSize => "HEADER_TABLE_SIZE",
            SettingsParameter::EnablePush => "ENABLE_PUSH",
            SettingsParameter::MaxConcurrentStreams => "MAX_CONCURRENT_STREAMS",
            SettingsParameter::InitialWindowSize => "INITIAL_WINDOW_SIZE",
            SettingsParameter::MaxFrameSize => "MAX_FRAME_SIZE",
            SettingsParameter::MaxHeaderListSize => "MAX_HEADER_LIST_SIZE",
        }
    }
}

impl fmt::Display for SettingsParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SETTINGS_{}", self.name())
    }
}

/// One endpoint's settings as carried on the wire
///
/// `None` means the parameter was never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub header_table_size: Option<u32>,
    pub enable_push: Option<bool>,
    /// Unlimited when absent
    pub max_concurrent_streams: Option<u32>,
    pub initial_window_size: Option<u32>,
    pub max_frame_size: Option<u32>,
    /// Advisory only; unlimited when absent
    pub max_header_list_size: Option<u32>,
}

impl Settings {
    pub fn new() -> Self {
        Settings::default()
    }

    pub fn header_table_limit(&self) -> u32 {
        self.header_table_size.unwrap_or(DEFAULT_HEADER_TABLE_SIZE)
    }

    pub fn push_enabled(&self) -> bool {
        self.enable_push.unwrap_or(true)
    }

    pub fn concurrency_limit(&self) -> Option<u32> {
        self.max_concurrent_streams
    }

    /// Initial stream window in effect
    pub fn stream_window(&self) -> u32 {
        self.initial_window_size.unwrap_or(DEFAULT_INITIAL_WINDOW_SIZE)
    }

    /// Largest DATA or HEADERS payload the endpoint accepts
    pub fn frame_size_limit(&self) -> u32 {
        self.max_frame_size.unwrap_or(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn header_list_limit(&self) -> Option<u32> {
        self.max_header_list_size
    }

    fn value(&self, param: SettingsParameter) -> Option<u32> {
        match param {
            SettingsParameter::HeaderTableSize => self.header_table_size,
            SettingsParameter::EnablePush => self.enable_push.map(u32::from),
            SettingsParameter::MaxConcurrentStreams => self.max_concurrent_streams,
            SettingsParameter::InitialWindowSize => self.initial_window_size,
            SettingsParameter::MaxFrameSize => self.max_frame_size,
            SettingsParameter::MaxHeaderListSize => self.max_header_list_size,
        }
    }

    /// Record one `(identifier, value)` pair read off the wire.
    ///
    /// Unknown identifiers are ignored (RFC 7540 Section 6.5.2).
    pub fn set(&mut self, id: u16, value: u32) -> Result<()> {
        let Some(param) = SettingsParameter::from_u16(id) else {
            return Ok(());
        };
        let slot = match param {
            SettingsParameter::EnablePush => {
                if value > 1 {
                    return Err(Error::InvalidSettings(format!("{} = {}, want 0 or 1", param, value)));
                }
                self.enable_push = Some(value == 1);
                return Ok(());
            }
            SettingsParameter::HeaderTableSize => &mut self.header_table_size,
            SettingsParameter::MaxConcurrentStreams => &mut self.max_concurrent_streams,
            SettingsParameter::InitialWindowSize => &mut self.initial_window_size,
            SettingsParameter::MaxFrameSize => &mut self.max_frame_size,
            SettingsParameter::MaxHeaderListSize => &mut self.max_header_list_size,
        };
        *slot = Some(value);
        Ok(())
    }

    /// Pairs to serialize, in identifier order
    pub fn parameters(&self) -> Vec<(SettingsParameter, u32)> {
        SettingsParameter::ALL
            .into_iter()
            .filter_map(|param| self.value(param).map(|v| (param, v)))
            .collect()
    }

    /// Range checks from RFC 7540 Section 6.5.2.
    ///
    /// An oversized initial window is a flow-control error, a bad frame
    /// size a protocol error.
    pub fn validate(&self) -> Result<()> {
        match self.initial_window_size {
            Some(size) if size > MAX_WINDOW_SIZE => {
                return Err(Error::FlowControl(format!(
                    "SETTINGS_INITIAL_WINDOW_SIZE {} above 2^31-1",
                    size
                )));
            }
            _ => {}
        }

        match self.max_frame_size {
            Some(size) if !(DEFAULT_MAX_FRAME_SIZE..=MAX_MAX_FRAME_SIZE).contains(&size) => {
                Err(Error::InvalidSettings(format!(
                    "SETTINGS_MAX_FRAME_SIZE {} not in {}..={}",
                    size, DEFAULT_MAX_FRAME_SIZE, MAX_MAX_FRAME_SIZE
                )))
            }
            _ => Ok(()),
        }
    }

    /// Overlay whatever `update` carries onto `self`
    pub fn merge(&mut self, update: &Settings) {
        self.header_table_size = update.header_table_size.or(self.header_table_size);
        self.enable_push = update.enable_push.or(self.enable_push);
        self.max_concurrent_streams = update.max_concurrent_streams.or(self.max_concurrent_streams);
        self.initial_window_size = update.initial_window_size.or(self.initial_window_size);
        self.max_frame_size = update.max_frame_size.or(self.max_frame_size);
        self.max_header_list_size = update.max_header_list_size.or(self.max_header_list_size);
    }
}

/// Chained construction of local settings, validated on `build`
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        SettingsBuilder::default()
    }

    pub fn header_table_size(mut self, size: u32) -> Self {
        self.settings.header_table_size = Some(size);
        self
    }

    pub fn enable_push(mut self, on: bool) -> Self {
        self.settings.enable_push = Some(on);
        self
    }

    pub fn max_concurrent_streams(mut self, limit: u32) -> Self {
        self.settings.max_concurrent_streams = Some(limit);
        self
    }

    pub fn initial_window_size(mut self, size: u32) -> Self {
        self.settings.initial_window_size = Some(size);
        self
    }

    pub fn max_frame_size(mut self, size: u32) -> Self {
        self.settings.max_frame_size = Some(size);
        self
    }

    pub fn max_header_list_size(mut self, size: u32) -> Self {
        self.settings.max_header_list_size = Some(size);
        self
    }

    pub fn build(self) -> Result<Settings> {
        self.settings.validate().map(|()| self.settings)
    }
}
