//! Auto-return countdown for secondary screens.
//!
//! `remaining == None` means "no timer", which is distinct from a timer
//! at zero. The countdown never exposes zero: the tick that would reach
//! it reports [`TickOutcome::Expired`] and clears the value instead.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No running countdown; nothing happened.
    Idle,
    /// Decremented; the new remaining value.
    Counting(u32),
    /// The countdown ran out and has been cleared.
    Expired,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Countdown {
    remaining: Option<u32>,
    running: bool,
}

impl Countdown {
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running && self.remaining.is_some()
    }

    /// Set the value and start decrementing.
    pub fn start(&mut self, seconds: u32) {
        self.remaining = Some(seconds);
        self.running = true;
    }

    /// Stop and remove the timer entirely.
    pub fn clear(&mut self) {
        self.remaining = None;
        self.running = false;
    }

    /// Set the value without changing whether it is running.
    pub fn reset(&mut self, seconds: u32) {
        self.remaining = Some(seconds);
    }

    /// Add seconds to the current value; an absent value counts as zero.
    pub fn extend(&mut self, seconds: u32) {
        self.remaining = Some(self.remaining.unwrap_or(0).saturating_add(seconds));
    }

    /// Stop decrementing but keep the displayed value.
    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Advance by one whole second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        match self.remaining {
            None => TickOutcome::Idle,
            Some(secs) if secs <= 1 => {
                self.clear();
                TickOutcome::Expired
            }
            Some(secs) => {
                self.remaining = Some(secs - 1);
                TickOutcome::Counting(secs - 1)
            }
        }
    }
}
