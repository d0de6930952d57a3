//! Fade channels to a target one after another
//!
//! Internally a timeline of single-channel [`FadeTo`] steps, each taking an
//! equal slice of the total duration and starting where the previous one
//! ends.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use super::rules::{ensure_brightness, ensure_duration, ensure_min_len};
use super::{Animation, AnimationKind, FadeTo, Frame, PlaybackState, Primitive};
use crate::error::Result;
use crate::sink::SinkHandle;
use crate::timeline::Timeline;
use crate::{Brightness, Channel, Easing};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceOptions {
    /// Target brightness of every channel
    pub brightness: Brightness,
    /// Total duration in milliseconds
    pub duration: u64,
    pub leds: Vec<Channel>,
}

#[derive(Debug, Clone)]
pub struct Sequence {
    state: PlaybackState,
    options: SequenceOptions,
    sink: SinkHandle,
    steps: Timeline,
}

impl Sequence {
    pub fn new(options: SequenceOptions, sink: SinkHandle) -> Result<Self> {
        ensure_brightness("brightness", options.brightness)?;
        ensure_min_len("leds", options.leds.len(), 1)?;
        ensure_duration("duration", options.duration)?;
        let steps = build_steps(&options, &sink);
        Ok(Self {
            state: PlaybackState::new(Duration::from_millis(options.duration), true),
            options,
            sink,
            steps,
        })
    }

    pub fn options(&self) -> &SequenceOptions {
        &self.options
    }

    /// Duration of a single channel's fade
    pub fn step_duration(&self) -> Duration {
        step_duration(&self.options)
    }

    /// The internal per-channel timeline
    pub fn timeline(&self) -> &Timeline {
        &self.steps
    }
}

fn step_duration(options: &SequenceOptions) -> Duration {
    let count = options.leds.len().max(1) as u64;
    Duration::from_millis(options.duration / count)
}

#[allow(clippy::cast_possible_truncation)]
fn build_steps(options: &SequenceOptions, sink: &SinkHandle) -> Timeline {
    let step = step_duration(options);
    let mut steps = Timeline::new();
    for (index, &led) in options.leds.iter().enumerate() {
        let fade = FadeTo::step(led, options.brightness, step, sink.clone());
        steps.add(step * index as u32, Primitive::FadeTo(fade));
    }
    steps
}

impl Animation for Sequence {
    const KIND: AnimationKind = AnimationKind::Sequence;

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
        self.steps = build_steps(&self.options, &self.sink);
    }

    fn on_start(&mut self) {
        if let Some(start) = self.state.absolute_start() {
            self.steps.set_start_time(start);
        }
    }

    /// Children follow their own progress; `eased` is not used.
    fn render(&mut self, _eased: f32, easing: Easing) -> Frame {
        let Some(now) = self.state.current() else {
            return Frame::new();
        };
        self.steps.set_current_position(now);
        self.steps.render_active(easing)
    }

    fn reset(&mut self) {
        self.state.reset();
        self.steps.reset();
    }

    fn renew_id(&mut self) {
        self.state = self.state.duplicate();
        self.steps.renew_ids();
    }
}
