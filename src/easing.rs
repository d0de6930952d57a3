//! Easing curves
//!
//! Every curve maps normalized progress in `[0, 1]` to eased progress. Inputs
//! outside the range are clamped, and both ends are pinned so a finished
//! primitive always lands exactly on its target.

use core::f32::consts::PI;
use core::fmt;
use core::str::FromStr;

use crate::error::ConfigError;

const EASING_NAME_LINEAR: &str = "linear";
const EASING_NAME_IN_QUAD: &str = "ease_in_quad";
const EASING_NAME_OUT_QUAD: &str = "ease_out_quad";
const EASING_NAME_IN_OUT_QUAD: &str = "ease_in_out_quad";
const EASING_NAME_IN_CUBIC: &str = "ease_in_cubic";
const EASING_NAME_OUT_CUBIC: &str = "ease_out_cubic";
const EASING_NAME_IN_OUT_CUBIC: &str = "ease_in_out_cubic";
const EASING_NAME_IN_QUART: &str = "ease_in_quart";
const EASING_NAME_OUT_QUART: &str = "ease_out_quart";
const EASING_NAME_IN_OUT_QUART: &str = "ease_in_out_quart";
const EASING_NAME_IN_SINE: &str = "ease_in_sine";
const EASING_NAME_OUT_SINE: &str = "ease_out_sine";
const EASING_NAME_IN_OUT_SINE: &str = "ease_in_out_sine";
const EASING_NAME_IN_ELASTIC: &str = "ease_in_elastic";
const EASING_NAME_OUT_ELASTIC: &str = "ease_out_elastic";
const EASING_NAME_IN_BOUNCE: &str = "ease_in_bounce";
const EASING_NAME_OUT_BOUNCE: &str = "ease_out_bounce";

/// Plain easing function signature
pub type EasingFn = fn(f32) -> f32;

/// Known easing curves, selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InSine,
    OutSine,
    InOutSine,
    InElastic,
    OutElastic,
    InBounce,
    OutBounce,
}

impl Easing {
    /// All curves in declaration order
    pub const ALL: [Self; 17] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
        Self::InQuart,
        Self::OutQuart,
        Self::InOutQuart,
        Self::InSine,
        Self::OutSine,
        Self::InOutSine,
        Self::InElastic,
        Self::OutElastic,
        Self::InBounce,
        Self::OutBounce,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => EASING_NAME_LINEAR,
            Self::InQuad => EASING_NAME_IN_QUAD,
            Self::OutQuad => EASING_NAME_OUT_QUAD,
            Self::InOutQuad => EASING_NAME_IN_OUT_QUAD,
            Self::InCubic => EASING_NAME_IN_CUBIC,
            Self::OutCubic => EASING_NAME_OUT_CUBIC,
            Self::InOutCubic => EASING_NAME_IN_OUT_CUBIC,
            Self::InQuart => EASING_NAME_IN_QUART,
            Self::OutQuart => EASING_NAME_OUT_QUART,
            Self::InOutQuart => EASING_NAME_IN_OUT_QUART,
            Self::InSine => EASING_NAME_IN_SINE,
            Self::OutSine => EASING_NAME_OUT_SINE,
            Self::InOutSine => EASING_NAME_IN_OUT_SINE,
            Self::InElastic => EASING_NAME_IN_ELASTIC,
            Self::OutElastic => EASING_NAME_OUT_ELASTIC,
            Self::InBounce => EASING_NAME_IN_BOUNCE,
            Self::OutBounce => EASING_NAME_OUT_BOUNCE,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|easing| easing.as_str() == s)
    }

    /// The raw curve function
    pub const fn function(self) -> EasingFn {
        match self {
            Self::Linear => linear,
            Self::InQuad => ease_in_quad,
            Self::OutQuad => ease_out_quad,
            Self::InOutQuad => ease_in_out_quad,
            Self::InCubic => ease_in_cubic,
            Self::OutCubic => ease_out_cubic,
            Self::InOutCubic => ease_in_out_cubic,
            Self::InQuart => ease_in_quart,
            Self::OutQuart => ease_out_quart,
            Self::InOutQuart => ease_in_out_quart,
            Self::InSine => ease_in_sine,
            Self::OutSine => ease_out_sine,
            Self::InOutSine => ease_in_out_sine,
            Self::InElastic => ease_in_elastic,
            Self::OutElastic => ease_out_elastic,
            Self::InBounce => ease_in_bounce,
            Self::OutBounce => ease_out_bounce,
        }
    }

    /// Apply the curve to normalized progress
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        (self.function())(t)
    }

    /// Apply the curve to an integer percentage (0-100)
    pub fn apply_percent(self, progress: u8) -> f32 {
        self.apply(f32::from(progress) / 100.0)
    }
}

impl FromStr for Easing {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_from_str(s).ok_or_else(|| ConfigError::UnknownEasing(s.into()))
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn linear(t: f32) -> f32 {
    t
}

pub fn ease_in_quad(t: f32) -> f32 {
    t * t
}

pub fn ease_out_quad(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - libm::powf(-2.0 * t + 2.0, 2.0) / 2.0
    }
}

pub fn ease_in_cubic(t: f32) -> f32 {
    t * t * t
}

pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - libm::powf(1.0 - t, 3.0)
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - libm::powf(-2.0 * t + 2.0, 3.0) / 2.0
    }
}

pub fn ease_in_quart(t: f32) -> f32 {
    libm::powf(t, 4.0)
}

pub fn ease_out_quart(t: f32) -> f32 {
    1.0 - libm::powf(1.0 - t, 4.0)
}

pub fn ease_in_out_quart(t: f32) -> f32 {
    if t < 0.5 {
        8.0 * libm::powf(t, 4.0)
    } else {
        1.0 - libm::powf(-2.0 * t + 2.0, 4.0) / 2.0
    }
}

pub fn ease_in_sine(t: f32) -> f32 {
    1.0 - libm::cosf(t * PI / 2.0)
}

pub fn ease_out_sine(t: f32) -> f32 {
    libm::sinf(t * PI / 2.0)
}

pub fn ease_in_out_sine(t: f32) -> f32 {
    -(libm::cosf(PI * t) - 1.0) / 2.0
}

const ELASTIC_PERIOD: f32 = (2.0 * PI) / 3.0;

pub fn ease_in_elastic(t: f32) -> f32 {
    -libm::powf(2.0, 10.0 * t - 10.0) * libm::sinf((t * 10.0 - 10.75) * ELASTIC_PERIOD)
}

pub fn ease_out_elastic(t: f32) -> f32 {
    libm::powf(2.0, -10.0 * t) * libm::sinf((t * 10.0 - 0.75) * ELASTIC_PERIOD) + 1.0
}

pub fn ease_out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984_375
    }
}

pub fn ease_in_bounce(t: f32) -> f32 {
    1.0 - ease_out_bounce(1.0 - t)
}
