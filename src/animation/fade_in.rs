//! Fade between two fixed brightness levels
//!
//! Every listed channel follows the same curve from `start` to `end`.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use super::rules::{ensure_brightness, ensure_duration};
use super::{Animation, AnimationKind, Frame, PlaybackState};
use crate::error::Result;
use crate::{Brightness, Channel, Easing};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeInOptions {
    /// Brightness at progress 0
    pub start: Brightness,
    /// Brightness at progress 100
    pub end: Brightness,
    /// Duration in milliseconds
    pub duration: u64,
    pub leds: Vec<Channel>,
}

#[derive(Debug, Clone)]
pub struct FadeIn {
    state: PlaybackState,
    options: FadeInOptions,
}

impl FadeIn {
    pub fn new(options: FadeInOptions) -> Result<Self> {
        ensure_brightness("start", options.start)?;
        ensure_brightness("end", options.end)?;
        ensure_duration("duration", options.duration)?;
        Ok(Self {
            state: PlaybackState::new(Duration::from_millis(options.duration), true),
            options,
        })
    }

    pub fn options(&self) -> &FadeInOptions {
        &self.options
    }
}

impl Animation for FadeIn {
    const KIND: AnimationKind = AnimationKind::FadeIn;

    fn state(&self) -> &PlaybackState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PlaybackState {
        &mut self.state
    }

    fn leds(&self) -> &[Channel] {
        &self.options.leds
    }

    fn set_leds(&mut self, leds: Vec<Channel>) {
        self.options.leds = leds;
    }

    fn render(&mut self, eased: f32, _easing: Easing) -> Frame {
        if !self.state.is_started() {
            return Frame::new();
        }
        let start = f32::from(self.options.start);
        let range = f32::from(self.options.end) - start;
        let value = start + range * eased;
        self.options.leds.iter().map(|&led| (led, value)).collect()
    }
}
