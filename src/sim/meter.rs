//! Saturating hazard meter
//!
//! Damage, fatigue and the fade overlay all follow the same update rule:
//! clamp the stored value to [0, 1], then add this tick's signed delta.
//! A meter can therefore overshoot 1 for one tick (the trigger for falling)
//! while the next update starts again from the clamped level.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Meter(f32);

impl Meter {
    pub const EMPTY: Meter = Meter(0.0);
    pub const FULL: Meter = Meter(1.0);

    pub fn new(value: f32) -> Self {
        Self(value)
    }

    /// Raw value, may sit slightly outside [0, 1]
    #[inline]
    pub fn value(&self) -> f32 {
        self.0
    }

    /// Value clamped to [0, 1]
    #[inline]
    pub fn level(&self) -> f32 {
        self.0.clamp(0.0, 1.0)
    }

    /// Clamp, then add a signed delta
    #[inline]
    pub fn integrate(&mut self, delta: f32) {
        self.0 = self.level() + delta;
    }

    /// Clamp, then add a non-negative amount
    #[inline]
    pub fn accrue(&mut self, amount: f32) {
        self.integrate(amount.max(0.0));
    }

    /// Clamp, then subtract a non-negative amount, never dropping below 0
    #[inline]
    pub fn recover(&mut self, amount: f32) {
        self.0 = (self.level() - amount.max(0.0)).max(0.0);
    }

    /// The meter has reached its limit
    #[inline]
    pub fn is_spent(&self) -> bool {
        self.0 >= 1.0
    }

    /// Actuator strength multiplier: full below 0.5, falling linearly to 0 at 1
    #[inline]
    pub fn derating(&self) -> f32 {
        1.0 - 2.0 * (self.0 - 0.5).clamp(0.0, 0.5)
    }
}
