//! Configured stair animation
//!
//! Turns an [`AnimationConfig`] into a runner with a populated timeline.
//! A config is validated as a whole before anything is placed, so a bad
//! step never leaves a half-built timeline behind.

use serde_json::{Map, Value};

use crate::animation::Primitive;
use crate::clock::Clock;
use crate::config::AnimationConfig;
use crate::error::Result;
use crate::runner::LedstripAnimation;
use crate::sink::SinkHandle;
use crate::tick::TickSource;
use crate::timeline::Timeline;
use crate::{Channel, Easing, Instant};

/// Build a timeline from `config`.
///
/// Steps with an empty or missing `leds` list drive every channel the sink
/// knows about. Errors name the index of the offending step.
pub fn build_timeline(config: &AnimationConfig, sink: &SinkHandle) -> Result<Timeline> {
    let fallback = sink.channels();
    let mut placed = Vec::with_capacity(config.timeline.len());

    for (index, step) in config.timeline.iter().enumerate() {
        let build = || -> Result<_> {
            let kind = step.kind()?;
            let offset = step.offset()?;
            let options = with_fallback_leds(step.options(kind)?, &fallback);
            let primitive = Primitive::from_options(kind, &options, Some(sink))?;
            Ok((offset, primitive))
        };
        placed.push(build().map_err(|err| err.at_step(index))?);
    }

    let mut timeline = Timeline::new();
    for (offset, primitive) in placed {
        timeline.add(offset, primitive);
    }
    Ok(timeline)
}

fn with_fallback_leds(options: &Map<String, Value>, fallback: &[Channel]) -> Map<String, Value> {
    let mut options = options.clone();
    let empty = match options.get("leds") {
        None | Some(Value::Null) => true,
        Some(Value::Array(leds)) => leds.is_empty(),
        Some(_) => false,
    };
    if empty && !fallback.is_empty() {
        options.insert("leds".into(), Value::from(fallback.to_vec()));
    }
    options
}

/// A named animation built from configuration, ready to run.
pub struct StairAnimation<C: Clock, T: TickSource> {
    config: AnimationConfig,
    runner: LedstripAnimation<C, T>,
}

impl<C: Clock, T: TickSource> StairAnimation<C, T> {
    pub fn from_config(
        config: AnimationConfig,
        sink: SinkHandle,
        clock: C,
        ticks: T,
    ) -> Result<Self> {
        let easing = config.easing()?;
        let timeline = build_timeline(&config, &sink)?;
        let mut runner = LedstripAnimation::new(sink, clock, ticks).with_timeline(timeline);
        runner.set_easing(easing).set_looping(config.looping);

        tracing::info!(
            name = %config.name,
            steps = config.timeline.len(),
            duration_ms = runner.timeline().duration().as_millis(),
            "animation built"
        );
        Ok(Self { config, runner })
    }

    pub fn from_json(json: &str, sink: SinkHandle, clock: C, ticks: T) -> Result<Self> {
        Self::from_config(AnimationConfig::from_json(json)?, sink, clock, ticks)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn description(&self) -> &str {
        &self.config.description
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn start(&mut self) -> &mut Self {
        self.runner.start(None);
        self
    }

    pub fn start_at(&mut self, at: Instant) -> &mut Self {
        self.runner.start(Some(at));
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        self.runner.stop();
        self
    }

    pub fn set_easing(&mut self, easing: Easing) -> &mut Self {
        self.runner.set_easing(easing);
        self
    }

    pub fn set_looping(&mut self, enabled: bool) -> &mut Self {
        self.runner.set_looping(enabled);
        self
    }

    /// Rebuild from a new config.
    ///
    /// The animation is stopped and the new timeline installed only once the
    /// whole config validated; on error the current one stays in place.
    pub fn update_config(&mut self, config: AnimationConfig) -> Result<()> {
        let easing = config.easing()?;
        let timeline = build_timeline(&config, self.runner.sink())?;
        self.runner.set_timeline(timeline);
        self.runner.set_easing(easing).set_looping(config.looping);
        tracing::info!(name = %config.name, "animation config updated");
        self.config = config;
        Ok(())
    }

    pub fn runner(&self) -> &LedstripAnimation<C, T> {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut LedstripAnimation<C, T> {
        &mut self.runner
    }
}

impl<C: Clock, T: TickSource> core::fmt::Debug for StairAnimation<C, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StairAnimation")
            .field("name", &self.config.name)
            .field("runner", &self.runner)
            .finish()
    }
}
