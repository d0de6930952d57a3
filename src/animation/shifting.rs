//! Rotate the brightness pattern across channels
//!
//! At start the current level of every channel is captured. Each shift
//! rotates that pattern by one channel and fades every channel to its new
//! level, so a lit step appears to travel up or down the stairs. With
//! bouncing enabled the direction flips after every `bounce_after` shifts.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use super::rules::{MAX_SHIFTS, ensure_duration, ensure_min_len};
use super::{Animation, AnimationKind, FadeTo, Frame, PlaybackState, Primitive};
use crate::error::{ConfigError, Result};
use crate::sink::SinkHandle;
use crate::timeline::Timeline;
use crate::{Brightness, Channel, Easing};

const DIRECTION_UP: &str = "up";
const DIRECTION_DOWN: &str = "down";

/// Rotation direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDirection {
    /// Each channel takes the level of the next one
    #[default]
    Up,
    /// Each channel takes the level of the previous one
    Down,
}

impl ShiftDirection {
    pub const NAMES: &'static [&'static str] = &[DIRECTION_UP, DIRECTION_DOWN];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => DIRECTION_UP,
            Self::Down => DIRECTION_DOWN,
        }
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftingOptions {
    /// Number of rotations
    pub shifts: u32,
    /// Total duration in milliseconds
    pub duration: u64,
    pub leds: Vec<Channel>,
    #[serde(default)]
    pub direction: ShiftDirection,
    #[serde(default)]
    pub bouncing: bool,
    /// Shifts between direction flips; defaults to the channel count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounce_after: Option<u32>,
}

/// Rotate a brightness pattern by one channel.
pub fn shift_levels(levels: &[Brightness], direction: ShiftDirection) -> Vec<Brightness> {
    let mut shifted = levels.to_vec();
    if shifted.len() >= 2 {
        match direction {
            ShiftDirection::Up => shifted.rotate_left(1),
            ShiftDirection::Down => shifted.rotate_right(1),
        }
    }
    shifted
}

#[derive(Debug, Clone)]
pub struct Shifting {
    state: PlaybackState,
    options: ShiftingOptions,
    sink: SinkHandle,
    /// Built when the primitive starts, from the levels at that moment
    steps: Option<Timeline>,
}

impl Shifting {
    pub fn new(options: ShiftingOptions, sink: SinkHandle) -> Result<Self> {
        ensure_min_len("leds", options.leds.len(), 2)?;
        ensure_duration("duration", options.duration)?;
        if options.shifts == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "shifts",
                min: 1.0,
            });
        }
        if options.shifts > MAX_SHIFTS {
            return Err(ConfigError::AboveMaximum {
                field: "shifts",
                max: f64::from(MAX_SHIFTS),
            });
        }
        if options.bounce_after == Some(0) {
            return Err(ConfigError::BelowMinimum {
                field: "bounceAfter",
                min: 1.0,
            });
        }
        Ok(Self {
            state: PlaybackState::new(Duration::from_millis(options.duration), true),
            options,
            sink,
            steps: None,
        })
    }

    pub fn options(&self) -> &ShiftingOptions {
        &self.options
    }

    /// Shifts between direction flips
    pub fn bounce_after(&self) -> u32 {
        self.options.bounce_after.unwrap_or_else(|| {
            u32::try_from(self.options.leds.len()).unwrap_or(u32::MAX)
        })
    }

    /// Target pattern of every shift, starting from `levels`
    pub fn plan(&self, levels: &[Brightness]) -> Vec<Vec<Brightness>> {
        let bounce_after = self.bounce_after();
        let mut direction = self.options.direction;
        let mut current = levels.to_vec();
        let mut plan = Vec::with_capacity(self.options.shifts as usize);
        for shift in 0..self.options.shifts {
            current = shift_levels(&current, direction);
            plan.push(current.clone());
            if self.options.bouncing && (shift + 1) % bounce_after == 0 {
                direction = direction.reversed();
            }
        }
        plan
    }

    /// The internal timeline, once started
    pub fn timeline(&self) -> Option<&Timeline> {
        self.steps.as_ref()
    }

    fn shift_offset(&self, shift: u32) -> Duration {
        let total = self.options.duration;
        let shifts = u64::from(self.options.shifts);
        Duration::from_millis((u64::from(shift) * total * 2 + shifts) / (shifts * 2))
    }

    fn build_steps(&self, levels: &[Brightness]) -> Timeline {
        let step = Duration::from_millis(self.options.duration / u64::from(self.options.shifts));
        let mut steps = Timeline::new();
        for (shift, targets) in (0..self.options.shifts).zip(self.plan(levels)) {
            let offset = self.shift_offset(shift);
            for (&led, &target) in self.options.leds.iter().zip(&targets) {
                let fade = FadeTo::step(led, target, step, self.sink.clone());
                steps.add(offset, Primitive::FadeTo(fade));
            }
        }
        steps
    }
}

impl Animation for Shifting {
    const KIND: AnimationKind = AnimationKind::Shifting;

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
        self.steps = None;
    }

    fn on_start(&mut self) {
        let levels = self.sink.snapshot(&self.options.leds);
        let mut steps = self.build_steps(&levels);
        if let Some(start) = self.state.absolute_start() {
            steps.set_start_time(start);
        }
        self.steps = Some(steps);
    }

    /// Children follow their own progress; `eased` is not used.
    fn render(&mut self, _eased: f32, easing: Easing) -> Frame {
        let (Some(now), Some(steps)) = (self.state.current(), self.steps.as_mut()) else {
            return Frame::new();
        };
        steps.set_current_position(now);
        steps.render_active(easing)
    }

    fn reset(&mut self) {
        self.state.reset();
        self.steps = None;
    }

    fn renew_id(&mut self) {
        self.state = self.state.duplicate();
        if let Some(steps) = &mut self.steps {
            steps.renew_ids();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_up_and_down() {
        assert_eq!(shift_levels(&[1, 2, 3], ShiftDirection::Up), vec![2, 3, 1]);
        assert_eq!(shift_levels(&[1, 2, 3], ShiftDirection::Down), vec![3, 1, 2]);
    }

    #[test]
    fn bouncing_flips_after_configured_shifts() {
        let sink = SinkHandle::new(crate::sink::MemorySink::new());
        let shifting = Shifting::new(
            ShiftingOptions {
                shifts: 4,
                duration: 400,
                leds: vec![1, 2, 3],
                direction: ShiftDirection::Up,
                bouncing: true,
                bounce_after: Some(2),
            },
            sink,
        )
        .unwrap();

        let plan = shifting.plan(&[10, 20, 30]);
        assert_eq!(
            plan,
            vec![
                vec![20, 30, 10],
                vec![30, 10, 20],
                vec![20, 30, 10],
                vec![10, 20, 30],
            ]
        );
    }
}
