//! Watering cooldown countdown

/// Whole-second countdown gating new watering requests
///
/// The countdown itself is clock-free: the session delivers one [`tick`]
/// per second while [`remaining`] is non-zero. Starting again replaces the
/// current countdown rather than adding to it.
///
/// [`tick`]: CooldownTimer::tick
/// [`remaining`]: CooldownTimer::remaining
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownTimer {
    remaining: u32,
}

impl CooldownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the countdown to `seconds`
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
    }

    /// Advance by one second; never goes below zero. Returns the new value.
    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    /// Stop the countdown immediately (teardown only)
    pub fn clear(&mut self) {
        self.remaining = 0;
    }

    /// Seconds left before watering is permitted
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Watering is permitted
    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }
}
