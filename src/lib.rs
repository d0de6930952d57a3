pub mod animation;
pub mod clock;
pub mod config;
pub mod control;
pub mod easing;
pub mod error;
pub mod runner;
pub mod sink;
pub mod stair;
pub mod tick;
pub mod timeline;

pub use animation::{
    Animation, AnimationId, AnimationKind, FadeIn, FadeInOptions, FadeOut, FadeOutOptions,
    FadeTo, FadeToOptions, Frame, Immediate, ImmediateOptions, PlaybackState, Primitive,
    Sequence, SequenceOptions, ShiftDirection, Shifting, ShiftingOptions,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AnimationConfig, TimelineStep};
pub use control::{CommandReceiver, QueueFull, RunnerCommand, RunnerHandle};
pub use easing::Easing;
pub use error::{ConfigError, RenderError, SinkError};
pub use runner::{Hook, LedstripAnimation, RunnerStatus, TickOutcome};
pub use sink::{BrightnessSink, MemorySink, SinkHandle};
pub use stair::{StairAnimation, build_timeline};
pub use tick::{ImmediateTicks, IntervalTicks, ManualTicks, TickSource};
pub use timeline::Timeline;

pub use embassy_time::{Duration, Instant};

/// PWM channel index
pub type Channel = u16;

/// Channel brightness, `0..=MAX_BRIGHTNESS`
pub type Brightness = u16;

/// Full scale of a 12-bit PWM channel
pub const MAX_BRIGHTNESS: Brightness = 4095;
