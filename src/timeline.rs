//! Primitives bucketed by their offset from a common start time
//!
//! Buckets are kept in a `BTreeMap` so every scan walks offsets in
//! ascending order, and within one offset in insertion order.

use std::collections::{BTreeMap, BTreeSet};

use embassy_time::{Duration, Instant};

use crate::animation::{Frame, Primitive};
use crate::{Channel, Easing};

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    buckets: BTreeMap<Duration, Vec<Primitive>>,
    duration: Duration,
    start_time: Option<Instant>,
    current_position: Option<Instant>,
    diff: Duration,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `primitive` at `offset` from the timeline start.
    ///
    /// An end past the representable range saturates instead of wrapping.
    pub fn add(&mut self, offset: Duration, mut primitive: Primitive) -> &mut Self {
        primitive.set_relative_position(offset);
        let end = offset
            .checked_add(primitive.duration())
            .unwrap_or(Duration::MAX);
        self.duration = self.duration.max(end);
        if let Some(start) = self.start_time {
            primitive.set_absolute_position(start);
        }
        self.buckets.entry(offset).or_default().push(primitive);
        self
    }

    /// Builder form of [`add`](Self::add)
    #[must_use]
    pub fn with(mut self, offset: Duration, primitive: Primitive) -> Self {
        self.add(offset, primitive);
        self
    }

    /// End of the last primitive, relative to the start
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of placed primitives
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub const fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    pub const fn current_position(&self) -> Option<Instant> {
        self.current_position
    }

    /// Time since the start as of the last position update
    pub const fn elapsed(&self) -> Duration {
        self.diff
    }

    /// Anchor every primitive at `start`.
    pub fn set_start_time(&mut self, start: Instant) -> &mut Self {
        self.start_time = Some(start);
        for primitive in self.buckets.values_mut().flatten() {
            primitive.set_absolute_position(start);
        }
        self
    }

    /// Evaluate every primitive at `now`.
    pub fn set_current_position(&mut self, now: Instant) -> &mut Self {
        self.current_position = Some(now);
        self.diff = self
            .start_time
            .map_or(Duration::from_ticks(0), |start| {
                now.saturating_duration_since(start)
            });
        for primitive in self.buckets.values_mut().flatten() {
            primitive.set_current_position(now);
        }
        self
    }

    /// Primitives with their offsets, ascending
    pub fn items(&self) -> impl Iterator<Item = (Duration, &Primitive)> {
        self.buckets
            .iter()
            .flat_map(|(&offset, bucket)| bucket.iter().map(move |p| (offset, p)))
    }

    /// Currently active primitives, ascending by offset
    pub fn active_items(&self) -> Vec<&Primitive> {
        self.buckets
            .values()
            .flatten()
            .filter(|p| p.is_active())
            .collect()
    }

    pub fn active_items_mut(&mut self) -> impl Iterator<Item = &mut Primitive> {
        self.buckets
            .values_mut()
            .flatten()
            .filter(|p| p.is_active())
    }

    /// Every channel any primitive may write
    pub fn channels(&self) -> BTreeSet<Channel> {
        self.buckets
            .values()
            .flatten()
            .flat_map(Primitive::channels)
            .collect()
    }

    /// Render all active primitives into one frame.
    ///
    /// Later offsets win when two primitives write the same channel.
    pub fn render_active(&mut self, easing: Easing) -> Frame {
        let mut frame = Frame::new();
        for primitive in self.active_items_mut() {
            frame.extend(primitive.render(easing));
        }
        frame
    }

    /// Issue fresh ids to every placed primitive
    pub fn renew_ids(&mut self) {
        for primitive in self.buckets.values_mut().flatten() {
            primitive.renew_id();
        }
    }

    /// Back to the pre-start state, keeping every primitive in place.
    pub fn reset(&mut self) {
        self.start_time = None;
        self.current_position = None;
        self.diff = Duration::from_ticks(0);
        for primitive in self.buckets.values_mut().flatten() {
            primitive.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{FadeIn, FadeInOptions};

    fn fade_in(duration: u64) -> Primitive {
        Primitive::FadeIn(
            FadeIn::new(FadeInOptions {
                start: 0,
                end: 100,
                duration,
                leds: vec![1],
            })
            .unwrap(),
        )
    }

    #[test]
    fn duration_tracks_latest_end() {
        let mut timeline = Timeline::new();
        timeline
            .add(Duration::from_millis(0), fade_in(100))
            .add(Duration::from_millis(300), fade_in(50))
            .add(Duration::from_millis(100), fade_in(400));
        assert_eq!(timeline.duration(), Duration::from_millis(500));
        assert_eq!(timeline.len(), 3);
    }

    #[test]
    fn items_are_ordered_by_offset() {
        let timeline = Timeline::new()
            .with(Duration::from_millis(200), fade_in(10))
            .with(Duration::from_millis(0), fade_in(10))
            .with(Duration::from_millis(100), fade_in(10));
        let offsets: Vec<_> = timeline.items().map(|(offset, _)| offset.as_millis()).collect();
        assert_eq!(offsets, vec![0, 100, 200]);
    }

    #[test]
    fn far_offsets_saturate() {
        let mut timeline = Timeline::new().with(Duration::MAX, fade_in(100));
        assert_eq!(timeline.duration(), Duration::MAX);

        timeline.set_start_time(Instant::from_millis(5));
        timeline.set_current_position(Instant::from_millis(10));
        assert!(timeline.active_items().is_empty());
    }

    #[test]
    fn unstarted_timeline_has_nothing_active() {
        let mut timeline = Timeline::new().with(Duration::from_millis(0), fade_in(10));
        timeline.set_current_position(Instant::from_millis(5));
        assert!(timeline.active_items().is_empty());
        assert_eq!(timeline.elapsed(), Duration::from_ticks(0));
    }
}
