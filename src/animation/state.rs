use core::fmt;

use embassy_time::{Duration, Instant};
use rand::Rng;

/// Characters used for generated animation ids
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of generated animation ids
pub const ID_LEN: usize = 8;

/// Short random identifier, for logs and equality checks only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnimationId(heapless::String<ID_LEN>);

impl AnimationId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut id = heapless::String::new();
        for _ in 0..ID_LEN {
            let index = rng.gen_range(0..ID_ALPHABET.len());
            // Capacity matches the loop bound
            let _ = id.push(char::from(ID_ALPHABET[index]));
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress in percent (0-100) of `elapsed` over `duration`, rounded.
///
/// A zero duration is complete the moment it is evaluated.
#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
pub const fn progress_percent(elapsed: Duration, duration: Duration) -> u8 {
    let total = duration.as_ticks();
    if total == 0 {
        return 100;
    }
    let elapsed = elapsed.as_ticks();
    if elapsed >= total {
        return 100;
    }
    let (elapsed, total) = (elapsed as u128, total as u128);
    ((elapsed * 100 + total / 2) / total) as u8
}

/// Lifecycle and timing of one primitive placed on a timeline.
///
/// Positions are relative to the owning timeline until it receives a start
/// time, after which the absolute window `[absolute_start, absolute_end]`
/// is known and every [`advance`](Self::advance) recomputes progress.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    id: AnimationId,
    duration: Duration,
    explicit_duration: bool,
    relative_offset: Duration,
    absolute_start: Option<Instant>,
    absolute_end: Option<Instant>,
    current: Option<Instant>,
    progress: u8,
    active: bool,
    started: bool,
    ended: bool,
}

impl PlaybackState {
    pub(crate) fn new(duration: Duration, explicit_duration: bool) -> Self {
        Self {
            id: AnimationId::generate(),
            duration,
            explicit_duration,
            relative_offset: Duration::from_ticks(0),
            absolute_start: None,
            absolute_end: None,
            current: None,
            progress: 0,
            active: false,
            started: false,
            ended: false,
        }
    }

    pub fn id(&self) -> &AnimationId {
        &self.id
    }

    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether the duration came from options rather than a calculation
    pub const fn has_explicit_duration(&self) -> bool {
        self.explicit_duration
    }

    pub const fn relative_offset(&self) -> Duration {
        self.relative_offset
    }

    pub const fn absolute_start(&self) -> Option<Instant> {
        self.absolute_start
    }

    pub const fn absolute_end(&self) -> Option<Instant> {
        self.absolute_end
    }

    /// Time of the latest evaluation that found this primitive active
    pub const fn current(&self) -> Option<Instant> {
        self.current
    }

    pub const fn progress(&self) -> u8 {
        self.progress
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub const fn is_started(&self) -> bool {
        self.started
    }

    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    pub(crate) fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub(crate) fn set_relative_position(&mut self, offset: Duration) {
        self.relative_offset = offset;
    }

    /// Windows past the end of representable time saturate at `Instant::MAX`.
    pub(crate) fn set_absolute_position(&mut self, timeline_start: Instant) {
        let start = timeline_start
            .checked_add(self.relative_offset)
            .unwrap_or(Instant::MAX);
        self.absolute_start = Some(start);
        self.absolute_end = Some(start.checked_add(self.duration).unwrap_or(Instant::MAX));
    }

    /// Evaluate the state at `now`.
    ///
    /// Returns `true` exactly once per lifecycle: on the evaluation that
    /// first finds the primitive active. A primitive that was active on the
    /// previous evaluation stays active until it has produced its final
    /// frame, even if `now` already lies past the window.
    pub(crate) fn advance(&mut self, now: Instant) -> bool {
        let (Some(start), Some(end)) = (self.absolute_start, self.absolute_end) else {
            self.active = false;
            self.current = None;
            self.progress = 0;
            return false;
        };

        let in_window = start <= now && now <= end;
        let instant_done = self.duration.as_ticks() == 0 && now >= start && !self.started;
        let mut entered = false;

        if !self.ended && (in_window || self.active || instant_done) {
            if !self.started {
                self.started = true;
                entered = true;
            }
            self.active = true;
            self.current = Some(now);
            self.progress =
                progress_percent(now.saturating_duration_since(start), self.duration);
        } else {
            self.active = false;
            self.current = None;
        }

        if now >= end {
            self.progress = 100;
            self.ended = true;
        } else if now < start {
            self.progress = 0;
            self.active = false;
        }

        entered
    }

    /// Back to the pre-start state. Duration and identity are kept.
    pub(crate) fn reset(&mut self) {
        self.absolute_start = None;
        self.absolute_end = None;
        self.current = None;
        self.progress = 0;
        self.active = false;
        self.started = false;
        self.ended = false;
    }

    /// Fresh copy with a new id and pre-start lifecycle
    pub(crate) fn duplicate(&self) -> Self {
        let mut copy = Self::new(self.duration, self.explicit_duration);
        copy.relative_offset = self.relative_offset;
        copy
    }
}
