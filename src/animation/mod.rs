//! Animation primitives with compile-time known variants
//!
//! Every primitive owns a [`PlaybackState`] and implements [`Animation`].
//! Timelines store them in the [`Primitive`] enum so nested timelines need
//! no trait objects.

mod fade_in;
mod fade_out;
mod fade_to;
mod immediate;
pub mod rules;
mod sequence;
mod shifting;
mod state;

use core::fmt;
use core::str::FromStr;
use std::collections::{BTreeMap, BTreeSet};

use embassy_time::{Duration, Instant};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use fade_in::{FadeIn, FadeInOptions};
pub use fade_out::{FadeOut, FadeOutOptions};
pub use fade_to::{FadeTo, FadeToOptions};
pub use immediate::{IMMEDIATE_DURATION, Immediate, ImmediateOptions};
pub use rules::{FieldType, Range, ValidationRules};
pub use sequence::{Sequence, SequenceOptions};
pub use shifting::{ShiftDirection, Shifting, ShiftingOptions, shift_levels};
pub use state::{AnimationId, PlaybackState, progress_percent};

use crate::error::{ConfigError, Result};
use crate::sink::SinkHandle;
use crate::{Channel, Easing};
use rules::{BRIGHTNESS_RANGE, DURATION_RANGE, SHIFTS_RANGE};

/// Channel to brightness produced by one render, before rounding
pub type Frame = BTreeMap<Channel, f32>;

const KIND_FADE_IN: &str = "FadeIn";
const KIND_FADE_OUT: &str = "FadeOut";
const KIND_FADE_TO: &str = "FadeTo";
const KIND_IMMEDIATE: &str = "Immediate";
const KIND_SEQUENCE: &str = "Sequence";
const KIND_SHIFTING: &str = "Shifting";

pub trait Animation {
    const KIND: AnimationKind;

    fn state(&self) -> &PlaybackState;

    fn state_mut(&mut self) -> &mut PlaybackState;

    /// Channels this primitive writes
    fn leds(&self) -> &[Channel];

    /// Replace the channel list, dropping anything derived from the old one
    fn set_leds(&mut self, leds: Vec<Channel>);

    /// Duration used when none was given explicitly
    fn calculate_duration(&self) -> Option<Duration> {
        None
    }

    /// Called once, on the evaluation that first finds the primitive active
    fn on_start(&mut self) {}

    /// Produce channel values for the current position.
    ///
    /// `eased` is the eased progress in `[0, 1]`. Composites hand `easing` to
    /// their children instead.
    fn render(&mut self, eased: f32, easing: Easing) -> Frame;

    fn reset(&mut self) {
        self.state_mut().reset();
    }

    /// Issue fresh ids for this primitive and anything nested in it,
    /// back in the pre-start lifecycle
    fn renew_id(&mut self) {
        let fresh = self.state().duplicate();
        *self.state_mut() = fresh;
    }

    /// Place the primitive relative to its timeline's start time
    fn set_absolute_position(&mut self, timeline_start: Instant) {
        if !self.state().has_explicit_duration() {
            if let Some(duration) = self.calculate_duration() {
                self.state_mut().set_duration(duration);
            }
        }
        self.state_mut().set_absolute_position(timeline_start);
    }

    fn set_current_position(&mut self, now: Instant) {
        if self.state_mut().advance(now) {
            self.on_start();
        }
    }
}

/// Resolve an optional duration against a calculated fallback.
///
/// Returns the duration and whether it was given explicitly.
pub(crate) fn resolve_duration<A: Animation>(
    supplied: Option<Duration>,
    calculated: Option<Duration>,
) -> Result<(Duration, bool)> {
    match (supplied, calculated) {
        (Some(duration), _) => Ok((duration, true)),
        (None, Some(duration)) => Ok((duration, false)),
        (None, None) => Err(ConfigError::MissingDuration {
            kind: A::KIND.as_str(),
        }),
    }
}

/// Known primitive kinds, as named in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    FadeIn,
    FadeOut,
    FadeTo,
    Immediate,
    Sequence,
    Shifting,
}

const FADE_IN_RULES: ValidationRules = ValidationRules {
    required: &["start", "end", "duration", "leds"],
    types: &[
        ("start", FieldType::Integer),
        ("end", FieldType::Integer),
        ("duration", FieldType::Integer),
        ("leds", FieldType::Array),
    ],
    ranges: &[
        ("start", BRIGHTNESS_RANGE),
        ("end", BRIGHTNESS_RANGE),
        ("duration", DURATION_RANGE),
    ],
    min_lengths: &[],
    enums: &[],
};

const FADE_OUT_RULES: ValidationRules = ValidationRules {
    required: &["end", "duration", "leds"],
    types: &[
        ("start", FieldType::Integer),
        ("end", FieldType::Integer),
        ("duration", FieldType::Integer),
        ("leds", FieldType::Array),
    ],
    ranges: &[
        ("start", BRIGHTNESS_RANGE),
        ("end", BRIGHTNESS_RANGE),
        ("duration", DURATION_RANGE),
    ],
    min_lengths: &[],
    enums: &[],
};

const FADE_TO_RULES: ValidationRules = ValidationRules {
    required: &["brightness", "duration", "leds"],
    types: &[
        ("brightness", FieldType::Integer),
        ("duration", FieldType::Integer),
        ("leds", FieldType::Array),
    ],
    ranges: &[("brightness", BRIGHTNESS_RANGE), ("duration", DURATION_RANGE)],
    min_lengths: &[],
    enums: &[],
};

const IMMEDIATE_RULES: ValidationRules = ValidationRules {
    required: &["brightness", "leds"],
    types: &[
        ("brightness", FieldType::Integer),
        ("duration", FieldType::Integer),
        ("leds", FieldType::Array),
    ],
    ranges: &[("brightness", BRIGHTNESS_RANGE), ("duration", DURATION_RANGE)],
    min_lengths: &[],
    enums: &[],
};

const SEQUENCE_RULES: ValidationRules = ValidationRules {
    required: &["brightness", "duration", "leds"],
    types: &[
        ("brightness", FieldType::Integer),
        ("duration", FieldType::Integer),
        ("leds", FieldType::Array),
    ],
    ranges: &[("brightness", BRIGHTNESS_RANGE), ("duration", DURATION_RANGE)],
    min_lengths: &[("leds", 1)],
    enums: &[],
};

/// `bounceAfter` must fit a `u32`
const BOUNCE_AFTER_RANGE: Range = Range::between(1.0, 4_294_967_295.0);

const SHIFTING_RULES: ValidationRules = ValidationRules {
    required: &["shifts", "duration", "leds"],
    types: &[
        ("shifts", FieldType::Integer),
        ("duration", FieldType::Integer),
        ("leds", FieldType::Array),
        ("direction", FieldType::String),
        ("bouncing", FieldType::Boolean),
        ("bounceAfter", FieldType::Integer),
    ],
    ranges: &[
        ("shifts", SHIFTS_RANGE),
        ("duration", DURATION_RANGE),
        ("bounceAfter", BOUNCE_AFTER_RANGE),
    ],
    min_lengths: &[("leds", 2)],
    enums: &[("direction", ShiftDirection::NAMES)],
};

impl AnimationKind {
    pub const ALL: [Self; 6] = [
        Self::FadeIn,
        Self::FadeOut,
        Self::FadeTo,
        Self::Immediate,
        Self::Sequence,
        Self::Shifting,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FadeIn => KIND_FADE_IN,
            Self::FadeOut => KIND_FADE_OUT,
            Self::FadeTo => KIND_FADE_TO,
            Self::Immediate => KIND_IMMEDIATE,
            Self::Sequence => KIND_SEQUENCE,
            Self::Shifting => KIND_SHIFTING,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            KIND_FADE_IN => Some(Self::FadeIn),
            KIND_FADE_OUT => Some(Self::FadeOut),
            KIND_FADE_TO => Some(Self::FadeTo),
            KIND_IMMEDIATE => Some(Self::Immediate),
            KIND_SEQUENCE => Some(Self::Sequence),
            KIND_SHIFTING => Some(Self::Shifting),
            _ => None,
        }
    }

    /// Option rules checked before construction
    pub const fn rules(self) -> &'static ValidationRules {
        match self {
            Self::FadeIn => &FADE_IN_RULES,
            Self::FadeOut => &FADE_OUT_RULES,
            Self::FadeTo => &FADE_TO_RULES,
            Self::Immediate => &IMMEDIATE_RULES,
            Self::Sequence => &SEQUENCE_RULES,
            Self::Shifting => &SHIFTING_RULES,
        }
    }

    /// Whether the kind reads prior brightness from a sink
    ///
    /// FadeOut only needs one when no explicit `start` is given.
    pub const fn requires_sink(self) -> bool {
        matches!(self, Self::FadeTo | Self::Sequence | Self::Shifting)
    }
}

impl FromStr for AnimationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_from_str(s).ok_or_else(|| ConfigError::UnknownKind(s.into()))
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive slot - enum containing all primitive kinds
#[derive(Debug, Clone)]
pub enum Primitive {
    FadeIn(FadeIn),
    FadeOut(FadeOut),
    FadeTo(FadeTo),
    Immediate(Immediate),
    Sequence(Sequence),
    Shifting(Shifting),
}

macro_rules! dispatch {
    ($slot:expr, $inner:ident => $body:expr) => {
        match $slot {
            Primitive::FadeIn($inner) => $body,
            Primitive::FadeOut($inner) => $body,
            Primitive::FadeTo($inner) => $body,
            Primitive::Immediate($inner) => $body,
            Primitive::Sequence($inner) => $body,
            Primitive::Shifting($inner) => $body,
        }
    };
}

fn parse_options<T: DeserializeOwned>(options: &Map<String, Value>) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(options.clone()))?)
}

fn require_sink(kind: AnimationKind, sink: Option<&SinkHandle>) -> Result<SinkHandle> {
    sink.cloned().ok_or(ConfigError::MissingSink {
        kind: kind.as_str(),
    })
}

impl Primitive {
    /// Validate raw options and build the primitive.
    pub fn from_options(
        kind: AnimationKind,
        options: &Map<String, Value>,
        sink: Option<&SinkHandle>,
    ) -> Result<Self> {
        kind.rules().check(kind.as_str(), options)?;
        let primitive = match kind {
            AnimationKind::FadeIn => Self::FadeIn(FadeIn::new(parse_options(options)?)?),
            AnimationKind::FadeOut => {
                Self::FadeOut(FadeOut::new(parse_options(options)?, sink.cloned())?)
            }
            AnimationKind::FadeTo => {
                let sink = require_sink(kind, sink)?;
                Self::FadeTo(FadeTo::new(parse_options(options)?, sink)?)
            }
            AnimationKind::Immediate => {
                Self::Immediate(Immediate::new(parse_options(options)?)?)
            }
            AnimationKind::Sequence => {
                let sink = require_sink(kind, sink)?;
                Self::Sequence(Sequence::new(parse_options(options)?, sink)?)
            }
            AnimationKind::Shifting => {
                let sink = require_sink(kind, sink)?;
                Self::Shifting(Shifting::new(parse_options(options)?, sink)?)
            }
        };
        Ok(primitive)
    }

    pub fn kind(&self) -> AnimationKind {
        match self {
            Self::FadeIn(_) => FadeIn::KIND,
            Self::FadeOut(_) => FadeOut::KIND,
            Self::FadeTo(_) => FadeTo::KIND,
            Self::Immediate(_) => Immediate::KIND,
            Self::Sequence(_) => Sequence::KIND,
            Self::Shifting(_) => Shifting::KIND,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        dispatch!(self, p => p.state())
    }

    pub fn id(&self) -> &AnimationId {
        self.state().id()
    }

    pub fn leds(&self) -> &[Channel] {
        dispatch!(self, p => p.leds())
    }

    /// Every channel this primitive may write, including nested steps
    pub fn channels(&self) -> BTreeSet<Channel> {
        self.leds().iter().copied().collect()
    }

    pub fn duration(&self) -> Duration {
        self.state().duration()
    }

    pub fn progress(&self) -> u8 {
        self.state().progress()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn is_started(&self) -> bool {
        self.state().is_started()
    }

    pub fn is_ended(&self) -> bool {
        self.state().is_ended()
    }

    pub fn set_relative_position(&mut self, offset: Duration) {
        dispatch!(self, p => p.state_mut().set_relative_position(offset));
    }

    pub fn set_absolute_position(&mut self, timeline_start: Instant) {
        dispatch!(self, p => p.set_absolute_position(timeline_start));
    }

    pub fn set_current_position(&mut self, now: Instant) {
        dispatch!(self, p => p.set_current_position(now));
    }

    /// Render with the progress eased by `easing`.
    ///
    /// Empty until the primitive has been found active at least once.
    pub fn render(&mut self, easing: Easing) -> Frame {
        let eased = easing.apply_percent(self.progress());
        dispatch!(self, p => p.render(eased, easing))
    }

    /// Render with an already eased progress value
    pub fn render_eased(&mut self, eased: f32, easing: Easing) -> Frame {
        dispatch!(self, p => p.render(eased, easing))
    }

    pub fn reset(&mut self) {
        dispatch!(self, p => Animation::reset(p));
    }

    /// Independent copy for placing the same primitive again.
    ///
    /// Options are deep-copied, the lifecycle is reset and a new id issued.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.reset();
        copy.renew_id();
        copy
    }

    /// Replace the ids of this primitive and its nested steps.
    ///
    /// The lifecycle goes back to pre-start; the offset is kept.
    pub fn renew_id(&mut self) {
        dispatch!(self, p => p.renew_id());
    }

    /// Copy of this primitive driving a different channel list
    #[must_use]
    pub fn with_leds(&self, leds: Vec<Channel>) -> Self {
        let mut copy = self.duplicate();
        dispatch!(&mut copy, p => p.set_leds(leds));
        copy
    }

    fn options_json(&self) -> core::result::Result<String, serde_json::Error> {
        dispatch!(self, p => serde_json::to_string(p.options()))
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.options_json() {
            Ok(options) => write!(f, "{}:{options}", self.kind()),
            Err(_) => write!(f, "{}", self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::sink::MemorySink;

    fn options(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in AnimationKind::ALL {
            assert_eq!(kind.as_str().parse::<AnimationKind>().unwrap(), kind);
        }
        assert!(matches!(
            "Blink".parse::<AnimationKind>(),
            Err(ConfigError::UnknownKind(name)) if name == "Blink"
        ));
    }

    #[test]
    fn sink_backed_kinds_need_a_sink() {
        let err = Primitive::from_options(
            AnimationKind::FadeTo,
            &options(json!({"brightness": 100, "duration": 10, "leds": [1]})),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSink { kind: "FadeTo" }));

        let err = Primitive::from_options(
            AnimationKind::FadeOut,
            &options(json!({"end": 0, "duration": 10, "leds": [1]})),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSink { kind: "FadeOut" }));

        let fade_out = Primitive::from_options(
            AnimationKind::FadeOut,
            &options(json!({"start": 4095, "end": 0, "duration": 10, "leds": [1]})),
            None,
        );
        assert!(fade_out.is_ok());
    }

    #[test]
    fn duplicate_is_independent() {
        let sink = SinkHandle::new(MemorySink::new());
        let mut original = Primitive::from_options(
            AnimationKind::FadeTo,
            &options(json!({"brightness": 100, "duration": 10, "leds": [1]})),
            Some(&sink),
        )
        .unwrap();
        original.set_relative_position(Duration::from_millis(20));
        original.set_absolute_position(Instant::from_millis(0));
        original.set_current_position(Instant::from_millis(25));
        assert!(original.is_started());

        let copy = original.duplicate();
        assert_ne!(copy.id(), original.id());
        assert!(!copy.is_started());
        assert_eq!(copy.state().relative_offset(), Duration::from_millis(20));
        assert!(original.is_started());
    }

    #[test]
    fn display_shows_kind_and_options() {
        let primitive = Primitive::from_options(
            AnimationKind::FadeIn,
            &options(json!({"start": 0, "end": 10, "duration": 5, "leds": [2]})),
            None,
        )
        .unwrap();
        assert_eq!(
            primitive.to_string(),
            r#"FadeIn:{"start":0,"end":10,"duration":5,"leds":[2]}"#
        );
    }
}
