mod tests {
    use stairled_composer::{
        Duration, Easing, FadeIn, FadeInOptions, Immediate, ImmediateOptions, Instant, Primitive,
        Timeline,
    };

    fn fade(start: u16, end: u16, duration: u64, led: u16) -> Primitive {
        Primitive::FadeIn(
            FadeIn::new(FadeInOptions {
                start,
                end,
                duration,
                leds: vec![led],
            })
            .unwrap(),
        )
    }

    fn immediate(brightness: u16, led: u16) -> Primitive {
        Primitive::Immediate(
            Immediate::new(ImmediateOptions {
                brightness,
                duration: None,
                leds: vec![led],
            })
            .unwrap(),
        )
    }

    #[test]
    fn start_time_anchors_every_offset() {
        let mut timeline = Timeline::new()
            .with(Duration::from_millis(0), fade(0, 10, 100, 1))
            .with(Duration::from_millis(250), fade(0, 10, 100, 2));
        timeline.set_start_time(Instant::from_millis(1000));

        let starts: Vec<_> = timeline
            .items()
            .map(|(_, item)| item.state().absolute_start().map(|t| t.as_millis()))
            .collect();
        assert_eq!(starts, vec![Some(1000), Some(1250)]);
        assert_eq!(timeline.duration(), Duration::from_millis(350));
    }

    #[test]
    fn active_items_follow_the_clock() {
        let mut timeline = Timeline::new()
            .with(Duration::from_millis(0), fade(0, 10, 100, 1))
            .with(Duration::from_millis(50), fade(0, 10, 100, 2))
            .with(Duration::from_millis(200), fade(0, 10, 100, 3));
        timeline.set_start_time(Instant::from_millis(0));

        timeline.set_current_position(Instant::from_millis(75));
        let leds: Vec<_> = timeline
            .active_items()
            .iter()
            .flat_map(|item| item.leds().to_vec())
            .collect();
        assert_eq!(leds, vec![1, 2]);
        assert_eq!(timeline.elapsed(), Duration::from_millis(75));

        // Both earlier fades deliver their final frame here
        timeline.set_current_position(Instant::from_millis(150));
        assert_eq!(timeline.active_items().len(), 2);

        timeline.set_current_position(Instant::from_millis(250));
        let leds: Vec<_> = timeline
            .active_items()
            .iter()
            .flat_map(|item| item.leds().to_vec())
            .collect();
        assert_eq!(leds, vec![3]);
    }

    #[test]
    fn later_offsets_win_on_shared_channels() {
        let mut timeline = Timeline::new()
            .with(Duration::from_millis(10), immediate(200, 1))
            .with(Duration::from_millis(0), fade(0, 100, 100, 1));
        timeline.set_start_time(Instant::from_millis(0));
        timeline.set_current_position(Instant::from_millis(0));
        timeline.set_current_position(Instant::from_millis(20));

        let frame = timeline.render_active(Easing::Linear);
        assert_eq!(frame[&1], 200.0);
    }

    #[test]
    fn reset_allows_replay() {
        let mut timeline = Timeline::new().with(Duration::from_millis(0), immediate(42, 1));
        timeline.set_start_time(Instant::from_millis(0));
        timeline.set_current_position(Instant::from_millis(0));
        assert_eq!(timeline.render_active(Easing::Linear)[&1], 42.0);

        timeline.reset();
        assert_eq!(timeline.start_time(), None);
        assert_eq!(timeline.current_position(), None);
        assert!(timeline.active_items().is_empty());

        timeline.set_start_time(Instant::from_millis(500));
        timeline.set_current_position(Instant::from_millis(500));
        assert_eq!(timeline.render_active(Easing::Linear)[&1], 42.0);
    }

    #[test]
    fn duplicates_are_placed_independently() {
        let original = fade(0, 100, 100, 1);
        let copy = original.duplicate();
        let mut timeline = Timeline::new()
            .with(Duration::from_millis(0), original)
            .with(Duration::from_millis(500), copy);
        timeline.set_start_time(Instant::from_millis(0));
        timeline.set_current_position(Instant::from_millis(50));

        assert_eq!(timeline.active_items().len(), 1);
        assert_eq!(timeline.duration(), Duration::from_millis(600));
        assert_eq!(timeline.channels().into_iter().collect::<Vec<_>>(), vec![1]);
    }
}
