//! Full-screen fade overlay used for respawn and win transitions
//!
//! Tone (black..white) and alpha (clear..opaque) each move at a constant rate.
//! Integration clamps before adding, so a finished fade never runs away but a
//! fade requested mid-way keeps the current level and simply reverses.

use serde::{Deserialize, Serialize};

use super::meter::Meter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fade {
    tone: Meter,
    alpha: Meter,
    delta_tone: f32,
    delta_alpha: f32,
    tone_duration: f32,
    alpha_duration: f32,
}

impl Fade {
    /// Start fully black and opaque, then fade in
    pub fn new(tone_duration: f32, alpha_duration: f32) -> Self {
        let mut fade = Self {
            tone: Meter::EMPTY,
            alpha: Meter::FULL,
            delta_tone: 0.0,
            delta_alpha: 0.0,
            tone_duration,
            alpha_duration,
        };
        fade.request(false, false);
        fade
    }

    /// Head toward white (`tone`) and/or opaque (`alpha`)
    ///
    /// While the overlay is invisible the tone snaps to its target instead of
    /// animating.
    pub fn request(&mut self, tone: bool, alpha: bool) {
        if self.alpha.value() <= 0.0 {
            self.tone = if tone { Meter::FULL } else { Meter::EMPTY };
            self.delta_tone = 0.0;
        } else {
            self.delta_tone = (if tone { 2.0 } else { -2.0 }) / self.tone_duration;
        }
        self.delta_alpha = (if alpha { 2.0 } else { -2.0 }) / self.alpha_duration;
    }

    pub fn step(&mut self, dt: f32) {
        self.tone.integrate(self.delta_tone * dt);
        self.alpha.integrate(self.delta_alpha * dt);
    }

    pub fn tone(&self) -> f32 {
        self.tone.level()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha.level()
    }

    /// The overlay covers part of the screen
    pub fn is_visible(&self) -> bool {
        self.alpha() > 0.0
    }
}
