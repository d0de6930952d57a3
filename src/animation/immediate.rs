//! Jump straight to a brightness
//!
//! Lives on the timeline for a short nominal window so the runner sees it,
//! and emits its output exactly once per lifecycle.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use super::rules::{ensure_brightness, ensure_duration};
use super::{Animation, AnimationKind, Frame, PlaybackState};
use crate::error::Result;
use crate::{Brightness, Channel, Easing};

/// Nominal window of an immediate change
pub const IMMEDIATE_DURATION: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmediateOptions {
    pub brightness: Brightness,
    /// Override of the nominal window, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub leds: Vec<Channel>,
}

#[derive(Debug, Clone)]
pub struct Immediate {
    state: PlaybackState,
    options: ImmediateOptions,
    done: bool,
}

impl Immediate {
    pub fn new(options: ImmediateOptions) -> Result<Self> {
        ensure_brightness("brightness", options.brightness)?;
        if let Some(duration) = options.duration {
            ensure_duration("duration", duration)?;
        }
        let supplied = options.duration.map(Duration::from_millis);
        let (duration, explicit) =
            super::resolve_duration::<Self>(supplied, Some(IMMEDIATE_DURATION))?;
        Ok(Self {
            state: PlaybackState::new(duration, explicit),
            options,
            done: false,
        })
    }

    pub fn options(&self) -> &ImmediateOptions {
        &self.options
    }

    /// Whether the single frame has been emitted
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

impl Animation for Immediate {
    const KIND: AnimationKind = AnimationKind::Immediate;

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

    fn calculate_duration(&self) -> Option<Duration> {
        Some(IMMEDIATE_DURATION)
    }

    fn render(&mut self, _eased: f32, _easing: Easing) -> Frame {
        if self.done || !self.state.is_started() {
            return Frame::new();
        }
        self.done = true;
        let value = f32::from(self.options.brightness);
        self.options.leds.iter().map(|&led| (led, value)).collect()
    }

    fn reset(&mut self) {
        self.state.reset();
        self.done = false;
    }
}
