//! HTTP/2 flow control
//!
//! This module implements flow control as defined in RFC 7540 Section 5.2.
//!
//! Each scope (the connection, and every stream) carries two windows:
//!
//! - a [`FlowControlWindow`] tracking the budget the peer has granted us for
//!   outbound DATA, grown by the peer's WINDOW_UPDATE frames;
//! - a [`WindowManager`] tracking the budget we granted the peer, which is
//!   the only place that decides when we emit a WINDOW_UPDATE.

use super::{DEFAULT_INITIAL_WINDOW_SIZE, MAX_WINDOW_SIZE};
use crate::error::{Error, Result};

/// Outbound flow control window
///
/// Tracks the available window size for sending data. The size is signed:
/// a SETTINGS change may legally push it below zero.
#[derive(Debug, Clone)]
pub struct FlowControlWindow {
    /// Initial window size
    initial_size: u32,
    /// Current window size (can be negative if over-committed)
    current_size: i64,
}

impl FlowControlWindow {
    /// Create a new flow control window with default size
    pub fn new() -> Self {
        Self::with_initial_size(DEFAULT_INITIAL_WINDOW_SIZE)
    }

    /// Create a new flow control window with specified initial size
    pub fn with_initial_size(initial_size: u32) -> Self {
        FlowControlWindow {
            initial_size,
            current_size: initial_size as i64,
        }
    }

    /// Get current window size
    pub fn size(&self) -> i64 {
        self.current_size
    }

    /// Get initial window size
    pub fn initial_size(&self) -> u32 {
        self.initial_size
    }

    /// Bytes that may be sent right now
    pub fn available(&self) -> usize {
        self.current_size.max(0) as usize
    }

    /// Check if window can send specified amount
    pub fn can_send(&self, amount: usize) -> bool {
        self.current_size >= amount as i64
    }

    /// Consume window capacity for sending data
    ///
    /// Fails without consuming anything if `amount` exceeds the window.
    pub fn consume(&mut self, amount: usize) -> Result<()> {
        if !self.can_send(amount) {
            return Err(Error::Internal(format!(
                "Send of {} bytes exceeds flow control window of {}",
                amount, self.current_size
            )));
        }

        self.current_size -= amount as i64;
        Ok(())
    }

    /// Increase window size (WINDOW_UPDATE)
    ///
    /// Returns the new window size
    pub fn increase(&mut self, increment: u32) -> Result<i64> {
        if increment == 0 {
            return Err(Error::Protocol(
                "Window update increment must be non-zero".to_string(),
            ));
        }

        let new_size = self.current_size + increment as i64;

        // Check for overflow (RFC 7540 Section 6.9.1)
        if new_size > MAX_WINDOW_SIZE as i64 {
            return Err(Error::FlowControl(format!(
                "Window size {} exceeds maximum (2^31-1)",
                new_size
            )));
        }

        self.current_size = new_size;
        Ok(self.current_size)
    }

    /// Update initial window size from SETTINGS
    ///
    /// The difference between the new and old initial size is applied to the
    /// current size (RFC 7540 Section 6.9.2).
    pub fn update_initial_size(&mut self, new_initial_size: u32) -> Result<()> {
        let diff = new_initial_size as i64 - self.initial_size as i64;
        let new_current = self.current_size + diff;

        if new_current > MAX_WINDOW_SIZE as i64 {
            return Err(Error::FlowControl(format!(
                "New window size {} exceeds maximum (2^31-1)",
                new_current
            )));
        }

        self.initial_size = new_initial_size;
        self.current_size = new_current;

        Ok(())
    }
}

impl Default for FlowControlWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Inbound flow control manager
///
/// Decides when a WINDOW_UPDATE must be emitted for one scope. Once the
/// remaining window would fall under a quarter of the initial window (or
/// under 1000 bytes) it is topped back up to the initial size in one
/// increment, so the window never runs dry while the peer still has data
/// in flight.
///
/// Separately it tracks the window the peer believes it has, so no
/// increment ever takes that past 2^31-1.
#[derive(Debug, Clone)]
pub struct WindowManager {
    window_size: i64,
    initial_window_size: i64,
    advertised: i64,
}

impl WindowManager {
    /// Smallest remaining window tolerated before replenishing
    pub const MIN_WINDOW: i64 = 1000;

    /// Create a manager for a window of `initial_window_size` bytes
    pub fn new(initial_window_size: u32) -> Self {
        WindowManager {
            window_size: initial_window_size as i64,
            initial_window_size: initial_window_size as i64,
            advertised: initial_window_size as i64,
        }
    }

    /// Remaining receive budget
    pub fn window_size(&self) -> i64 {
        self.window_size
    }

    /// Negotiated baseline
    pub fn initial_window_size(&self) -> i64 {
        self.initial_window_size
    }

    /// Window as the peer sees it: grants minus DATA received
    pub fn advertised_window(&self) -> i64 {
        self.advertised
    }

    /// Account for `length` bytes of received DATA
    ///
    /// Returns the WINDOW_UPDATE increment to send, if one is due.
    pub fn handle_received_frame(&mut self, length: usize) -> Option<u32> {
        let future = self.window_size - length as i64;
        self.advertised -= length as i64;

        if future < self.initial_window_size / 4 || future < Self::MIN_WINDOW {
            let increment = (self.initial_window_size - future).min(self.headroom());
            if increment > 0 {
                self.window_size = future + increment;
                self.advertised += increment;
                return Some(increment as u32);
            }
        }

        self.window_size = future;
        None
    }

    /// Grant up to `delta` extra bytes outside the replenishment rule
    ///
    /// The grant is capped so the peer's window stays within 2^31-1;
    /// `None` when nothing can be granted.
    pub fn grow(&mut self, delta: i64) -> Option<u32> {
        let increment = delta.min(self.headroom());
        if increment <= 0 {
            return None;
        }
        self.advertised += increment;
        Some(increment as u32)
    }

    fn headroom(&self) -> i64 {
        MAX_WINDOW_SIZE as i64 - self.advertised
    }

    /// Shift the baseline and the current window by `delta`
    ///
    /// The current window may go negative.
    pub fn adjust_initial_window_size(&mut self, delta: i64) {
        self.initial_window_size += delta;
        self.window_size += delta;
    }
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_WINDOW_SIZE)
    }
}
