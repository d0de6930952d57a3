//! Scheduling loop driving one timeline into a brightness sink
//!
//! Each tick samples the clock, advances the timeline, renders every active
//! primitive in offset order and writes its values to the sink before the
//! next primitive renders. Primitives that read the sink lazily therefore
//! see what earlier primitives wrote in the same tick.

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

use embassy_time::{Duration, Instant};

use crate::animation::{Frame, Primitive};
use crate::clock::{Clock, SystemClock};
use crate::control::{self, CommandReceiver, RunnerCommand, RunnerHandle};
use crate::error::{RenderError, SinkError};
use crate::sink::SinkHandle;
use crate::tick::{ImmediateTicks, TickSource};
use crate::timeline::Timeline;
use crate::{Channel, Easing};

/// Observer called after every rendering tick with the active primitives.
pub type Hook = Box<dyn FnMut(&[&Primitive], &RunnerStatus) + Send>;

/// Snapshot of the runner handed to hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerStatus {
    pub started: bool,
    pub start_time: Option<Instant>,
    pub current_time: Option<Instant>,
    pub looping: bool,
    pub easing: Easing,
    /// Completed loop cycles since construction
    pub cycles: u64,
}

/// What a call to [`LedstripAnimation::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, nothing rendered
    Idle,
    /// Frame rendered, next tick scheduled
    Rendered,
    /// Timeline completed and the runner stopped
    Finished,
    /// Timeline completed and a new cycle began
    Restarted,
}

pub struct LedstripAnimation<C: Clock = SystemClock, T: TickSource = ImmediateTicks> {
    timeline: Timeline,
    sink: SinkHandle,
    clock: C,
    ticks: T,
    handle: RunnerHandle,
    commands: CommandReceiver,
    hooks: Vec<Hook>,

    easing: Easing,
    started: bool,
    start_time: Option<Instant>,
    current_time: Option<Instant>,
    loop_infinite: bool,
    cycles: u64,
    reported_errors: HashSet<SinkError>,
}

impl<C: Clock, T: TickSource> LedstripAnimation<C, T> {
    pub fn new(sink: SinkHandle, clock: C, ticks: T) -> Self {
        let (handle, commands) = control::channel();
        Self {
            timeline: Timeline::new(),
            sink,
            clock,
            ticks,
            handle,
            commands,
            hooks: Vec::new(),
            easing: Easing::default(),
            started: false,
            start_time: None,
            current_time: None,
            loop_infinite: false,
            cycles: 0,
            reported_errors: HashSet::new(),
        }
    }

    /// Replace the timeline, stopping first if running
    #[must_use]
    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.set_timeline(timeline);
        self
    }

    pub fn set_timeline(&mut self, timeline: Timeline) {
        self.stop();
        self.timeline = timeline;
    }

    /// Place a primitive on the timeline
    pub fn add(&mut self, offset: Duration, primitive: Primitive) -> &mut Self {
        self.timeline.add(offset, primitive);
        self
    }

    pub fn add_hook<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(&[&Primitive], &RunnerStatus) + Send + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn set_easing(&mut self, easing: Easing) -> &mut Self {
        self.easing = easing;
        self
    }

    pub fn set_looping(&mut self, enabled: bool) -> &mut Self {
        self.loop_infinite = enabled;
        self
    }

    /// Handle for controlling the runner from elsewhere.
    ///
    /// Commands are applied at the start of the next tick.
    pub fn handle(&self) -> RunnerHandle {
        self.handle.clone()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn sink(&self) -> &SinkHandle {
        &self.sink
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }

    pub const fn easing(&self) -> Easing {
        self.easing
    }

    pub const fn is_started(&self) -> bool {
        self.started
    }

    pub const fn is_looping(&self) -> bool {
        self.loop_infinite
    }

    pub const fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    pub const fn current_time(&self) -> Option<Instant> {
        self.current_time
    }

    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn status(&self) -> RunnerStatus {
        RunnerStatus {
            started: self.started,
            start_time: self.start_time,
            current_time: self.current_time,
            looping: self.loop_infinite,
            easing: self.easing,
            cycles: self.cycles,
        }
    }

    /// Start at `at` (now when `None`) and render the first frame.
    ///
    /// Starting a running animation restarts it from the beginning.
    pub fn start(&mut self, at: Option<Instant>) -> &mut Self {
        self.begin(at);
        self.tick();
        self
    }

    /// Stop, cancel the pending tick and black out.
    ///
    /// The blackout covers every channel the timeline writes and every
    /// channel the sink knows about. Does nothing when already stopped.
    pub fn stop(&mut self) -> &mut Self {
        if !self.started {
            return self;
        }
        self.started = false;
        self.ticks.cancel();
        self.timeline.reset();

        let mut channels = self.timeline.channels();
        channels.extend(self.sink.channels());
        tracing::debug!(channels = channels.len(), "animation stopped");
        if let Err(err) = self.sink.set_all(channels, 0) {
            report_sink_error(&mut self.reported_errors, err);
        }
        self
    }

    /// Run one tick of the loop.
    pub fn tick(&mut self) -> TickOutcome {
        self.process_commands();
        if !self.started {
            return TickOutcome::Idle;
        }
        let Some(start) = self.start_time else {
            return TickOutcome::Idle;
        };

        let now = self.clock.now();
        self.current_time = Some(now);
        self.timeline.set_current_position(now);

        let easing = self.easing;
        let mut written = 0;
        for item in self.timeline.active_items_mut() {
            let frame = item.render(easing);
            written += write_frame(&self.sink, &mut self.reported_errors, frame);
        }
        tracing::trace!(
            elapsed_ms = self.timeline.elapsed().as_millis(),
            written,
            "tick"
        );

        self.notify_hooks();

        let finished = start
            .checked_add(self.timeline.duration())
            .is_some_and(|end| now >= end);
        if finished {
            self.stop();
            if self.loop_infinite {
                self.cycles += 1;
                tracing::debug!(cycles = self.cycles, "animation loop restart");
                self.begin(None);
                self.ticks.schedule_next();
                return TickOutcome::Restarted;
            }
            return TickOutcome::Finished;
        }

        if self.started {
            self.ticks.schedule_next();
        }
        TickOutcome::Rendered
    }

    /// Tick until the tick source has nothing pending.
    ///
    /// Returns once the animation finished without looping or was stopped.
    pub fn run(&mut self) {
        loop {
            self.process_commands();
            if !self.ticks.wait_next() {
                break;
            }
            self.tick();
        }
    }

    /// Enter the running state without rendering
    fn begin(&mut self, at: Option<Instant>) {
        if self.started {
            self.ticks.cancel();
            self.timeline.reset();
        }
        let start = at.unwrap_or_else(|| self.clock.now());
        self.started = true;
        self.start_time = Some(start);
        self.timeline.set_start_time(start);
        tracing::debug!(
            start_ms = start.as_millis(),
            duration_ms = self.timeline.duration().as_millis(),
            looping = self.loop_infinite,
            "animation started"
        );
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.commands.try_receive() {
            tracing::debug!(?command, "runner command");
            match command {
                RunnerCommand::Start(at) => {
                    self.begin(at);
                    self.ticks.schedule_next();
                }
                RunnerCommand::Stop => {
                    self.stop();
                }
                RunnerCommand::SetLooping(enabled) => {
                    self.set_looping(enabled);
                }
            }
        }
    }

    fn notify_hooks(&mut self) {
        if self.hooks.is_empty() {
            return;
        }
        let status = self.status();
        let items = self.timeline.active_items();
        for hook in &mut self.hooks {
            let result = catch_unwind(AssertUnwindSafe(|| hook(items.as_slice(), &status)));
            if result.is_err() {
                tracing::warn!("animation hook panicked");
            }
        }
    }
}

impl<C: Clock, T: TickSource> core::fmt::Debug for LedstripAnimation<C, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LedstripAnimation")
            .field("timeline", &self.timeline)
            .field("easing", &self.easing)
            .field("started", &self.started)
            .field("start_time", &self.start_time)
            .field("current_time", &self.current_time)
            .field("loop_infinite", &self.loop_infinite)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

/// Round and write a frame, returning how many channels were written.
#[allow(clippy::cast_possible_truncation)]
fn write_frame(sink: &SinkHandle, reported: &mut HashSet<SinkError>, frame: Frame) -> usize {
    let mut written = 0;
    for (channel, value) in frame {
        if let Err(err) = check_value(channel, value) {
            tracing::warn!(error = %err, "dropping render value");
            continue;
        }
        match sink.set_brightness(channel, libm::roundf(value) as i32) {
            Ok(()) => written += 1,
            Err(err) => report_sink_error(reported, err),
        }
    }
    written
}

const fn check_value(channel: Channel, value: f32) -> Result<(), RenderError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RenderError::NonFinite { channel, value })
    }
}

/// Warn about each distinct sink error once per runner
fn report_sink_error(reported: &mut HashSet<SinkError>, err: SinkError) {
    if !reported.contains(&err) {
        tracing::warn!(error = %err, "brightness sink rejected a write");
        reported.insert(err);
    }
}
