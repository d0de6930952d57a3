//! Fade every channel from its own current level to a common target
//!
//! Levels are snapshotted from the sink when the fade starts. Channels that
//! begin far apart move at different rates but arrive together.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use super::rules::{ensure_brightness, ensure_duration};
use super::{Animation, AnimationKind, Frame, PlaybackState};
use crate::error::Result;
use crate::sink::SinkHandle;
use crate::{Brightness, Channel, Easing};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeToOptions {
    /// Target brightness
    pub brightness: Brightness,
    /// Duration in milliseconds
    pub duration: u64,
    pub leds: Vec<Channel>,
}

#[derive(Debug, Clone)]
pub struct FadeTo {
    state: PlaybackState,
    options: FadeToOptions,
    sink: SinkHandle,
    /// Levels at start, aligned with `options.leds`
    origin: Vec<Brightness>,
}

impl FadeTo {
    pub fn new(options: FadeToOptions, sink: SinkHandle) -> Result<Self> {
        ensure_brightness("brightness", options.brightness)?;
        ensure_duration("duration", options.duration)?;
        Ok(Self::from_parts(options, sink))
    }

    /// Build from options already known to be valid
    pub(crate) fn from_parts(options: FadeToOptions, sink: SinkHandle) -> Self {
        Self {
            state: PlaybackState::new(Duration::from_millis(options.duration), true),
            options,
            sink,
            origin: Vec::new(),
        }
    }

    /// Single channel step used by composite primitives
    pub(crate) fn step(
        led: Channel,
        brightness: Brightness,
        duration: Duration,
        sink: SinkHandle,
    ) -> Self {
        Self::from_parts(
            FadeToOptions {
                brightness,
                duration: duration.as_millis(),
                leds: vec![led],
            },
            sink,
        )
    }

    pub fn options(&self) -> &FadeToOptions {
        &self.options
    }

    pub fn target(&self) -> Brightness {
        self.options.brightness
    }

    /// Levels captured at start; empty before that
    pub fn origin(&self) -> &[Brightness] {
        &self.origin
    }
}

impl Animation for FadeTo {
    const KIND: AnimationKind = AnimationKind::FadeTo;

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
        self.origin.clear();
    }

    fn on_start(&mut self) {
        self.origin = self.sink.snapshot(&self.options.leds);
    }

    fn render(&mut self, eased: f32, _easing: Easing) -> Frame {
        if !self.state.is_started() {
            return Frame::new();
        }
        let end = f32::from(self.options.brightness);
        self.options
            .leds
            .iter()
            .zip(&self.origin)
            .map(|(&led, &from)| {
                let from = f32::from(from);
                (led, from + (end - from) * eased)
            })
            .collect()
    }

    fn reset(&mut self) {
        self.state.reset();
        self.origin.clear();
    }
}
