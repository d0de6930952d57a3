//! Declarative animation configuration
//!
//! ```json
//! {
//!   "name": "welcome",
//!   "description": "fade the stairs up, then down",
//!   "easing": "ease_in_out_quad",
//!   "loop": false,
//!   "timeline": [
//!     { "type": "FadeIn", "at": 0, "options": { "start": 0, "end": 4095, "duration": 150, "leds": [1, 2] } }
//!   ]
//! }
//! ```

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::animation::AnimationKind;
use crate::animation::rules::MAX_DURATION_MS;
use crate::easing::Easing;
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub timeline: Vec<TimelineStep>,
    /// Easing curve name, linear when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    /// Restart the timeline every time it completes
    #[serde(default, rename = "loop")]
    pub looping: bool,
}

/// One primitive placed on the timeline, options still raw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStep {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Offset in milliseconds
    #[serde(default)]
    pub at: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

impl AnimationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Configured easing, linear when unset
    pub fn easing(&self) -> Result<Easing> {
        self.easing
            .as_deref()
            .map_or(Ok(Easing::default()), str::parse)
    }
}

impl TimelineStep {
    pub fn new(kind: AnimationKind, at: u64, options: Map<String, Value>) -> Self {
        Self {
            kind: Some(kind.as_str().into()),
            at: Value::from(at),
            options: Some(options),
        }
    }

    pub fn kind(&self) -> Result<AnimationKind> {
        self.kind
            .as_deref()
            .ok_or(ConfigError::InvalidStep { field: "type" })?
            .parse()
    }

    /// Offset from the timeline start; must be a whole number of milliseconds
    #[allow(clippy::cast_precision_loss)]
    pub fn offset(&self) -> Result<Duration> {
        let millis = self
            .at
            .as_u64()
            .ok_or(ConfigError::InvalidStep { field: "at" })?;
        if millis > MAX_DURATION_MS {
            return Err(ConfigError::AboveMaximum {
                field: "at",
                max: MAX_DURATION_MS as f64,
            });
        }
        Ok(Duration::from_millis(millis))
    }

    pub fn options(&self, kind: AnimationKind) -> Result<&Map<String, Value>> {
        self.options.as_ref().ok_or(ConfigError::MissingOptions {
            kind: kind.as_str(),
        })
    }
}
