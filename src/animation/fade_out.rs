//! Fade from wherever the channels are down to a fixed level
//!
//! Without an explicit `start` the origin of each channel is read from the
//! sink the first time the fade renders, so it picks up values written
//! earlier in the same tick by primitives placed before it.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use super::rules::{ensure_brightness, ensure_duration};
use super::{Animation, AnimationKind, Frame, PlaybackState};
use crate::error::{ConfigError, Result};
use crate::sink::SinkHandle;
use crate::{Brightness, Channel, Easing};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeOutOptions {
    /// Fixed origin; read from the sink when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Brightness>,
    pub end: Brightness,
    /// Duration in milliseconds
    pub duration: u64,
    pub leds: Vec<Channel>,
}

#[derive(Debug, Clone)]
pub struct FadeOut {
    state: PlaybackState,
    options: FadeOutOptions,
    sink: Option<SinkHandle>,
    /// Origin per channel, aligned with `options.leds`
    origin: Option<Vec<Brightness>>,
}

impl FadeOut {
    pub fn new(options: FadeOutOptions, sink: Option<SinkHandle>) -> Result<Self> {
        if let Some(start) = options.start {
            ensure_brightness("start", start)?;
        }
        ensure_brightness("end", options.end)?;
        ensure_duration("duration", options.duration)?;
        if options.start.is_none() && sink.is_none() {
            return Err(ConfigError::MissingSink {
                kind: Self::KIND.as_str(),
            });
        }
        Ok(Self {
            state: PlaybackState::new(Duration::from_millis(options.duration), true),
            options,
            sink,
            origin: None,
        })
    }

    pub fn options(&self) -> &FadeOutOptions {
        &self.options
    }

    /// Captured origin levels, once rendered
    pub fn origin(&self) -> Option<&[Brightness]> {
        self.origin.as_deref()
    }

    fn capture_origin(&self) -> Vec<Brightness> {
        match (self.options.start, &self.sink) {
            (Some(start), _) => vec![start; self.options.leds.len()],
            (None, Some(sink)) => sink.snapshot(&self.options.leds),
            // Rejected by the constructor
            (None, None) => vec![0; self.options.leds.len()],
        }
    }
}

impl Animation for FadeOut {
    const KIND: AnimationKind = AnimationKind::FadeOut;

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
        self.origin = None;
    }

    fn render(&mut self, eased: f32, _easing: Easing) -> Frame {
        if !self.state.is_started() {
            return Frame::new();
        }
        if self.origin.is_none() {
            self.origin = Some(self.capture_origin());
        }
        let Some(origin) = &self.origin else {
            return Frame::new();
        };

        let end = f32::from(self.options.end);
        self.options
            .leds
            .iter()
            .zip(origin)
            .map(|(&led, &from)| {
                let from = f32::from(from);
                (led, from - (from - end) * eased)
            })
            .collect()
    }

    fn reset(&mut self) {
        self.state.reset();
        self.origin = None;
    }
}
