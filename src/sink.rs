//! Brightness sinks
//!
//! A sink is the single shared map from channel to brightness. The runner
//! writes it every tick, primitives read it to find out where a channel
//! currently stands before fading it somewhere else.

use core::cell::RefCell;
use core::fmt;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use critical_section::Mutex;

use crate::error::SinkError;
use crate::{Brightness, Channel, MAX_BRIGHTNESS};

/// Abstract brightness output
///
/// Implement this trait to drive real PWM hardware. Values handed to
/// `set_brightness` through a [`SinkHandle`] are already clamped to
/// `0..=MAX_BRIGHTNESS`.
pub trait BrightnessSink {
    /// Write the brightness of a single channel
    fn set_brightness(&mut self, channel: Channel, value: Brightness) -> Result<(), SinkError>;

    /// Last written brightness of a channel, `0` if never set
    fn brightness(&self, channel: Channel) -> Brightness;

    /// Channels known to this sink
    ///
    /// Used as the default channel list for animation steps that don't
    /// name any. Empty if the sink has no fixed mapping.
    fn channels(&self) -> Vec<Channel> {
        Vec::new()
    }
}

/// Clamp any integer brightness into the 12-bit PWM range
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]
pub const fn clamp_brightness(value: i32) -> Brightness {
    if value < 0 {
        0
    } else if value > MAX_BRIGHTNESS as i32 {
        MAX_BRIGHTNESS
    } else {
        value as Brightness
    }
}

type SharedSink = Mutex<RefCell<Box<dyn BrightnessSink + Send>>>;

/// Cloneable, thread safe handle to a brightness sink.
///
/// Every clone talks to the same sink. Access is serialized with a critical
/// section, so the handle can be shared between the runner and whatever
/// else inspects the lights (a status endpoint, a test).
#[derive(Clone)]
pub struct SinkHandle {
    inner: Arc<SharedSink>,
}

impl SinkHandle {
    pub fn new<S>(sink: S) -> Self
    where
        S: BrightnessSink + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(RefCell::new(Box::new(sink)))),
        }
    }

    /// Set brightness, clamping out of range values.
    pub fn set_brightness(&self, channel: Channel, value: i32) -> Result<(), SinkError> {
        let value = clamp_brightness(value);
        self.with(|sink| sink.set_brightness(channel, value))
    }

    /// Current brightness of a channel
    pub fn brightness(&self, channel: Channel) -> Brightness {
        self.with(|sink| sink.brightness(channel))
    }

    /// Channels known to the underlying sink
    pub fn channels(&self) -> Vec<Channel> {
        self.with(|sink| sink.channels())
    }

    /// Read brightness of several channels in one critical section
    pub fn snapshot(&self, channels: &[Channel]) -> Vec<Brightness> {
        self.with(|sink| channels.iter().map(|&ch| sink.brightness(ch)).collect())
    }

    /// Set every given channel to the same value.
    ///
    /// Keeps going after a failed write and returns the first error.
    pub fn set_all(
        &self,
        channels: impl IntoIterator<Item = Channel>,
        value: i32,
    ) -> Result<(), SinkError> {
        let value = clamp_brightness(value);
        self.with(|sink| {
            let mut first_error = None;
            for channel in channels {
                if let Err(err) = sink.set_brightness(channel, value) {
                    first_error.get_or_insert(err);
                }
            }
            first_error.map_or(Ok(()), Err)
        })
    }

    /// Run a closure with exclusive access to the sink.
    ///
    /// The closure must not call back into a clone of this handle.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn BrightnessSink) -> R) -> R {
        critical_section::with(|cs| {
            let mut sink = self.inner.borrow(cs).borrow_mut();
            f(&mut **sink)
        })
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkHandle").finish_non_exhaustive()
    }
}

/// In-memory sink
///
/// Stores brightness per channel. With a channel list configured, writes to
/// any other channel are rejected the same way a pin mapping rejects an
/// unmapped step.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    levels: BTreeMap<Channel, Brightness>,
    mapping: Option<BTreeSet<Channel>>,
}

impl MemorySink {
    /// Sink accepting any channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink restricted to the given channels
    pub fn with_channels(channels: impl IntoIterator<Item = Channel>) -> Self {
        Self {
            levels: BTreeMap::new(),
            mapping: Some(channels.into_iter().collect()),
        }
    }

    /// All written levels, ordered by channel
    pub fn levels(&self) -> &BTreeMap<Channel, Brightness> {
        &self.levels
    }
}

impl BrightnessSink for MemorySink {
    fn set_brightness(&mut self, channel: Channel, value: Brightness) -> Result<(), SinkError> {
        if let Some(mapping) = &self.mapping {
            if !mapping.contains(&channel) {
                return Err(SinkError::UnknownChannel(channel));
            }
        }
        self.levels.insert(channel, value.min(MAX_BRIGHTNESS));
        Ok(())
    }

    fn brightness(&self, channel: Channel) -> Brightness {
        self.levels.get(&channel).copied().unwrap_or(0)
    }

    fn channels(&self) -> Vec<Channel> {
        match &self.mapping {
            Some(mapping) => mapping.iter().copied().collect(),
            None => Vec::new(),
        }
    }
}
