mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use stairled_composer::{
        Brightness, BrightnessSink, Channel, Duration, Easing, FadeIn, FadeInOptions, FadeOut,
        FadeOutOptions, FadeTo, FadeToOptions, Immediate, ImmediateOptions, Instant,
        LedstripAnimation, ManualClock, ManualTicks, MemorySink, Primitive, SinkError,
        SinkHandle, TickOutcome, TickSource,
    };

    type Writes = Arc<Mutex<Vec<(Channel, Brightness)>>>;

    /// Sink that remembers every write in order
    struct RecordingSink {
        levels: BTreeMap<Channel, Brightness>,
        writes: Writes,
    }

    impl BrightnessSink for RecordingSink {
        fn set_brightness(&mut self, channel: Channel, value: Brightness) -> Result<(), SinkError> {
            self.levels.insert(channel, value);
            self.writes.lock().unwrap().push((channel, value));
            Ok(())
        }

        fn brightness(&self, channel: Channel) -> Brightness {
            self.levels.get(&channel).copied().unwrap_or(0)
        }
    }

    fn recording() -> (SinkHandle, Writes) {
        let writes = Writes::default();
        let sink = SinkHandle::new(RecordingSink {
            levels: BTreeMap::new(),
            writes: Arc::clone(&writes),
        });
        (sink, writes)
    }

    fn runner(
        sink: &SinkHandle,
        clock: &ManualClock,
    ) -> LedstripAnimation<ManualClock, ManualTicks> {
        LedstripAnimation::new(sink.clone(), clock.clone(), ManualTicks::new())
    }

    fn at(clock: &ManualClock, millis: u64) {
        clock.set(Instant::from_millis(millis));
    }

    #[test]
    fn fade_in_then_fade_out() {
        let (sink, _) = recording();
        let clock = ManualClock::from_millis(1000);
        let mut animation = runner(&sink, &clock);
        animation
            .add(
                Duration::from_millis(0),
                Primitive::FadeIn(
                    FadeIn::new(FadeInOptions {
                        start: 0,
                        end: 4095,
                        duration: 100,
                        leds: vec![0],
                    })
                    .unwrap(),
                ),
            )
            .add(
                Duration::from_millis(100),
                Primitive::FadeOut(
                    FadeOut::new(
                        FadeOutOptions {
                            start: None,
                            end: 0,
                            duration: 100,
                            leds: vec![0],
                        },
                        Some(sink.clone()),
                    )
                    .unwrap(),
                ),
            );

        animation.start(None);
        assert!(animation.is_started());
        assert_eq!(sink.brightness(0), 0);

        at(&clock, 1050);
        assert_eq!(animation.tick(), TickOutcome::Rendered);
        assert!(sink.brightness(0).abs_diff(2048) <= 1);

        at(&clock, 1150);
        assert_eq!(animation.tick(), TickOutcome::Rendered);
        let falling = sink.brightness(0);
        assert!(falling.abs_diff(2048) <= 1, "got {falling}");

        at(&clock, 1175);
        animation.tick();
        assert!(sink.brightness(0) < falling);

        at(&clock, 1200);
        assert_eq!(animation.tick(), TickOutcome::Finished);
        assert_eq!(sink.brightness(0), 0);
        assert!(!animation.is_started());
    }

    #[test]
    fn fade_to_midpoint_rounds() {
        let (sink, _) = recording();
        sink.set_brightness(1, 4095).unwrap();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        let fade = FadeTo::new(
            FadeToOptions {
                brightness: 2000,
                duration: 1000,
                leds: vec![1, 2],
            },
            sink.clone(),
        )
        .unwrap();
        animation.add(Duration::from_millis(0), Primitive::FadeTo(fade));
        animation.start(None);

        at(&clock, 500);
        animation.tick();
        assert_eq!(sink.brightness(1), 3048);
        assert_eq!(sink.brightness(2), 1000);

        // Rounds to 100% one millisecond before the stop blackout
        at(&clock, 999);
        animation.tick();
        assert_eq!(sink.brightness(1), 2000);
        assert_eq!(sink.brightness(2), 2000);
    }

    #[test]
    fn looping_blacks_out_and_restarts() {
        let (sink, writes) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.set_looping(true).add(
            Duration::from_millis(0),
            Primitive::Immediate(
                Immediate::new(ImmediateOptions {
                    brightness: 3000,
                    duration: Some(100),
                    leds: vec![5],
                })
                .unwrap(),
            ),
        );

        animation.start(None);
        at(&clock, 50);
        animation.tick();
        at(&clock, 100);
        assert_eq!(animation.tick(), TickOutcome::Restarted);
        assert!(animation.is_started());
        assert_eq!(animation.start_time(), Some(Instant::from_millis(100)));
        assert_eq!(animation.cycles(), 1);
        assert!(animation.ticks().is_pending());

        at(&clock, 150);
        animation.tick();
        at(&clock, 200);
        assert_eq!(animation.tick(), TickOutcome::Restarted);
        at(&clock, 250);
        animation.tick();

        let log = writes.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![(5, 3000), (5, 0), (5, 3000), (5, 0), (5, 3000)],
            "each cycle writes once, then blacks out"
        );
        assert_eq!(sink.brightness(5), 3000);
    }

    #[test]
    fn stop_is_idempotent_and_blacks_out() {
        let (sink, writes) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.add(
            Duration::from_millis(0),
            Primitive::FadeIn(
                FadeIn::new(FadeInOptions {
                    start: 4095,
                    end: 4095,
                    duration: 1000,
                    leds: vec![1, 2],
                })
                .unwrap(),
            ),
        );
        animation.start(None);
        assert_eq!(sink.brightness(2), 4095);
        assert!(animation.ticks().is_pending());

        animation.stop();
        assert!(!animation.ticks().is_pending());
        assert_eq!(sink.brightness(1), 0);
        assert_eq!(sink.brightness(2), 0);

        let count = writes.lock().unwrap().len();
        animation.stop();
        assert_eq!(writes.lock().unwrap().len(), count);

        at(&clock, 10);
        assert_eq!(animation.tick(), TickOutcome::Idle);
    }

    fn fade_in(end: u16, duration: u64, leds: Vec<Channel>) -> Primitive {
        Primitive::FadeIn(
            FadeIn::new(FadeInOptions {
                start: 0,
                end,
                duration,
                leds,
            })
            .unwrap(),
        )
    }

    #[test]
    fn stop_blacks_out_channels_outside_the_timeline() {
        let sink = SinkHandle::new(MemorySink::with_channels([0, 1, 2]));
        sink.set_brightness(2, 4000).unwrap();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.add(Duration::from_millis(0), fade_in(4095, 100, vec![0]));

        animation.start(None);
        at(&clock, 50);
        animation.tick();
        assert!(sink.brightness(0) > 0);

        animation.stop();
        assert_eq!(sink.snapshot(&[0, 1, 2]), vec![0, 0, 0]);
    }

    #[test]
    fn empty_timeline_finishes_on_first_tick() {
        let (sink, writes) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.handle().start(None).unwrap();

        assert_eq!(animation.tick(), TickOutcome::Finished);
        assert!(!animation.is_started());
        assert!(!animation.ticks().is_pending());
        assert!(writes.lock().unwrap().is_empty());
        assert_eq!(animation.tick(), TickOutcome::Idle);
    }

    #[test]
    fn empty_looping_timeline_restarts_once_per_tick() {
        let (sink, _) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.set_looping(true);
        animation.handle().start(None).unwrap();

        for cycle in 1..=3 {
            assert_eq!(animation.tick(), TickOutcome::Restarted);
            assert_eq!(animation.cycles(), cycle);
            assert!(animation.is_started());
            assert!(animation.ticks().is_pending());
        }
    }

    #[test]
    fn zero_length_fade_renders_before_blackout() {
        let (sink, writes) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.add(Duration::from_millis(0), fade_in(4095, 0, vec![1]));
        animation.handle().start(None).unwrap();

        assert_eq!(animation.tick(), TickOutcome::Finished);
        assert_eq!(*writes.lock().unwrap(), vec![(1, 4095), (1, 0)]);
    }

    #[test]
    fn zero_length_looping_fade_renders_every_cycle() {
        let (sink, writes) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation
            .set_looping(true)
            .add(Duration::from_millis(0), fade_in(4095, 0, vec![1]));
        animation.handle().start(None).unwrap();

        assert_eq!(animation.tick(), TickOutcome::Restarted);
        assert_eq!(animation.tick(), TickOutcome::Restarted);
        assert_eq!(animation.cycles(), 2);
        assert_eq!(
            *writes.lock().unwrap(),
            vec![(1, 4095), (1, 0), (1, 4095), (1, 0)]
        );
    }

    #[test]
    fn restart_while_running_begins_a_new_cycle() {
        let (sink, _) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.add(
            Duration::from_millis(0),
            Primitive::FadeIn(
                FadeIn::new(FadeInOptions {
                    start: 0,
                    end: 1000,
                    duration: 100,
                    leds: vec![1],
                })
                .unwrap(),
            ),
        );
        animation.start(None);
        at(&clock, 80);
        animation.tick();
        assert_eq!(sink.brightness(1), 800);

        animation.start(None);
        assert_eq!(animation.start_time(), Some(Instant::from_millis(80)));
        assert_eq!(sink.brightness(1), 0);
    }

    #[test]
    fn start_in_the_future_waits() {
        let (sink, writes) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.add(
            Duration::from_millis(0),
            Primitive::Immediate(
                Immediate::new(ImmediateOptions {
                    brightness: 10,
                    duration: None,
                    leds: vec![1],
                })
                .unwrap(),
            ),
        );
        animation.start(Some(Instant::from_millis(500)));
        assert!(writes.lock().unwrap().is_empty());

        at(&clock, 500);
        animation.tick();
        assert_eq!(sink.brightness(1), 10);
    }

    #[test]
    fn hooks_see_active_items_and_survive_panics() {
        let (sink, _) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        animation
            .set_easing(Easing::InQuad)
            .add(
                Duration::from_millis(0),
                Primitive::FadeIn(
                    FadeIn::new(FadeInOptions {
                        start: 0,
                        end: 100,
                        duration: 100,
                        leds: vec![1],
                    })
                    .unwrap(),
                ),
            )
            .add_hook(|_, _| panic!("broken hook"))
            .add_hook(move |items, status| {
                record
                    .lock()
                    .unwrap()
                    .push((items.len(), items.first().map(|i| i.progress()), status.easing));
            });

        animation.start(None);
        at(&clock, 50);
        animation.tick();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(1, Some(0), Easing::InQuad), (1, Some(50), Easing::InQuad)]
        );
        assert_eq!(sink.brightness(1), 25);
    }

    #[test]
    fn handle_commands_apply_on_next_tick() {
        let (sink, _) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.add(
            Duration::from_millis(0),
            Primitive::FadeIn(
                FadeIn::new(FadeInOptions {
                    start: 500,
                    end: 500,
                    duration: 1000,
                    leds: vec![3],
                })
                .unwrap(),
            ),
        );
        let handle = animation.handle();

        handle.start(None).unwrap();
        handle.set_looping(true).unwrap();
        assert_eq!(animation.tick(), TickOutcome::Rendered);
        assert!(animation.is_looping());
        assert_eq!(sink.brightness(3), 500);

        handle.stop().unwrap();
        assert_eq!(animation.tick(), TickOutcome::Idle);
        assert_eq!(sink.brightness(3), 0);
    }

    #[test]
    fn run_returns_when_finished() {
        let (sink, _) = recording();
        let clock = ManualClock::from_millis(0);
        let mut animation = runner(&sink, &clock);
        animation.add(
            Duration::from_millis(0),
            Primitive::Immediate(
                Immediate::new(ImmediateOptions {
                    brightness: 7,
                    duration: Some(0),
                    leds: vec![1],
                })
                .unwrap(),
            ),
        );
        animation.start(None);
        animation.run();
        assert!(!animation.is_started());
        assert!(!animation.ticks().is_pending());
    }
}
