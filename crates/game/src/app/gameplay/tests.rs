    use std::sync::{Arc, Mutex};

    use engine::{
        run_loop, Intent, LoopConfig, LoopExit, PersistenceError, Simulation, TickControl, Vec2,
    };

    use super::puzzles::PuzzleKind;
    use super::snapshot::SessionSnapshot;
    use super::types::Direction;
    use super::*;

    const DT: f32 = 1.0 / 60.0;
    /// Sanctum x positions: on the landmark, and left of it on the same row.
    const ON_LANDMARK_X: f32 = 370.0;
    const APPROACH_X: f32 = 200.0;

    #[derive(Default)]
    struct MemoryStore {
        stored: Option<SessionSnapshot>,
        saves: Vec<SessionSnapshot>,
        fail_load: bool,
        fail_save: bool,
    }

    #[derive(Clone, Default)]
    struct MemoryGateway(Arc<Mutex<MemoryStore>>);

    impl MemoryGateway {
        fn holding(snapshot: SessionSnapshot) -> Self {
            let gateway = Self::default();
            gateway.0.lock().expect("store").stored = Some(snapshot);
            gateway
        }

        fn save_count(&self) -> usize {
            self.0.lock().expect("store").saves.len()
        }

        fn last_save(&self) -> SessionSnapshot {
            self.0
                .lock()
                .expect("store")
                .saves
                .last()
                .cloned()
                .expect("at least one save")
        }
    }

    impl PersistenceGateway for MemoryGateway {
        fn load(&mut self, _player_id: &str) -> Result<Option<SessionSnapshot>, PersistenceError> {
            let store = self.0.lock().expect("store");
            if store.fail_load {
                return Err(PersistenceError::Rejected("backend offline".to_string()));
            }
            Ok(store.stored.clone())
        }

        fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
            let mut store = self.0.lock().expect("store");
            if store.fail_save {
                return Err(PersistenceError::Rejected("backend offline".to_string()));
            }
            store.stored = Some(snapshot.clone());
            store.saves.push(snapshot.clone());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryScores(Arc<Mutex<Vec<CompletionRecord>>>);

    impl ScoreReporter for MemoryScores {
        fn report(&mut self, record: &CompletionRecord) -> Result<(), PersistenceError> {
            self.0.lock().expect("scores").push(record.clone());
            Ok(())
        }
    }

    fn start_session(gateway: &MemoryGateway, scores: &MemoryScores) -> GameSession {
        GameSession::start(
            SessionConfig::default(),
            build_world(),
            "ivy",
            "#22aa66",
            Box::new(gateway.clone()),
            Some(Box::new(scores.clone())),
        )
    }

    fn run_ticks(session: &mut GameSession, intent: Intent, ticks: usize) -> Vec<TickReport> {
        (0..ticks).map(|_| session.tick(DT, &intent)).collect()
    }

    fn all_events(reports: &[TickReport]) -> Vec<SessionEvent> {
        reports
            .iter()
            .flat_map(|report| report.events.iter().cloned())
            .collect()
    }

    fn place(session: &mut GameSession, region: usize, x: f32, y: f32) {
        assert!(session.place_player(region, Vec2::new(x, y)));
    }

    fn gate_closed(session: &GameSession, region: usize) -> bool {
        session.world().regions[region]
            .gate
            .as_ref()
            .expect("gate")
            .closed
    }

    /// Snapshot of a session in the Sanctum at `pos_x` with every seed
    /// collected except those listed.
    fn endgame_snapshot(
        session: &GameSession,
        missing: &[(usize, usize)],
        pos_x: f32,
    ) -> SessionSnapshot {
        let mut snapshot = session.snapshot();
        for seeds in &mut snapshot.seeds {
            seeds.iter_mut().for_each(|collected| *collected = true);
        }
        for &(region, index) in missing {
            snapshot.seeds[region][index] = false;
        }
        snapshot.region = 4;
        snapshot.pos_x = pos_x;
        snapshot.pos_y = 270.0;
        snapshot.game_time = 12.5;
        snapshot
    }

    #[test]
    fn fresh_session_starts_at_world_start_without_saving() {
        let gateway = MemoryGateway::default();
        let session = start_session(&gateway, &MemoryScores::default());

        assert_eq!(session.current_region(), 0);
        assert_eq!(session.player().position, Vec2::new(96.0, 276.0));
        assert_eq!(session.player().name, "ivy");
        assert_eq!(session.game_time(), 0.0);
        assert!(!session.is_paused());
        assert_eq!(gateway.save_count(), 0);
    }

    #[test]
    fn collecting_a_seed_saves_once_and_starts_the_flash() {
        let gateway = MemoryGateway::default();
        let mut session = start_session(&gateway, &MemoryScores::default());
        place(&mut session, 0, 150.0, 440.0);

        let report = session.tick(DT, &Intent::idle());

        assert_eq!(
            report.events,
            vec![SessionEvent::SeedCollected {
                region: 0,
                index: 0
            }]
        );
        assert!(report.saved);
        assert_eq!(session.collect_flash(), COLLECT_FLASH_SECONDS);
        assert!(gateway.last_save().seeds[0][0]);

        let report = session.tick(DT, &Intent::idle());
        assert!(report.events.is_empty());
        assert!(!report.saved);
        assert!(session.collect_flash() < COLLECT_FLASH_SECONDS);
        assert_eq!(gateway.save_count(), 1);
    }

    #[test]
    fn pushed_crate_and_player_on_plates_solve_grove_and_open_gate() {
        let gateway = MemoryGateway::default();
        let mut session = start_session(&gateway, &MemoryScores::default());
        place(&mut session, 0, 390.0, 420.0);

        let reports = run_ticks(&mut session, Intent::moving(1.0, 0.0), 40);
        assert!(all_events(&reports).is_empty());
        assert!(session.world().regions[0].crates[0].position.x > 480.0);
        assert!(gate_closed(&session, 0));

        place(&mut session, 0, 228.0, 132.0);
        let report = session.tick(DT, &Intent::idle());

        assert_eq!(
            report.events,
            vec![SessionEvent::PuzzleSolved {
                region: 0,
                kind: PuzzleKind::PressurePlate
            }]
        );
        assert!(report.saved);
        assert!(!gate_closed(&session, 0));
        assert!(gateway.last_save().puzzles[0].solved);
    }

    #[test]
    fn closed_gate_keeps_player_in_region() {
        let mut session = start_session(&MemoryGateway::default(), &MemoryScores::default());
        place(&mut session, 0, 700.0, 290.0);

        run_ticks(&mut session, Intent::moving(1.0, 0.0), 60);

        assert_eq!(session.current_region(), 0);
        assert!(session.player().rect().right() <= 768.0);
    }

    #[test]
    fn open_gate_lets_player_into_next_region() {
        let gateway = MemoryGateway::default();
        let mut session = start_session(&gateway, &MemoryScores::default());
        let mut snapshot = session.snapshot();
        snapshot.puzzles[0].solved = true;
        assert!(session.restore(&snapshot).is_empty());
        assert!(!gate_closed(&session, 0));
        place(&mut session, 0, 700.0, 290.0);

        let mut crossing = None;
        for _ in 0..60 {
            let report = session.tick(DT, &Intent::moving(1.0, 0.0));
            if !report.events.is_empty() {
                crossing = Some(report);
                break;
            }
        }

        let report = crossing.expect("player crossed the exit");
        assert_eq!(
            report.events,
            vec![SessionEvent::RegionChanged {
                from: 0,
                to: 1,
                via: Direction::Right
            }]
        );
        assert!(report.saved);
        assert_eq!(session.current_region(), 1);
        assert_eq!(session.player().position.x, TRANSITION_INSET);
        assert!((session.player().position.y - 290.0).abs() < 1e-3);
        assert_eq!(session.collect_flash(), 0.0);
        assert_eq!(gateway.last_save().region, 1);
    }

    #[test]
    fn ruins_sequence_solves_in_order_through_the_session() {
        let mut session = start_session(&MemoryGateway::default(), &MemoryScores::default());
        let pads = [(164.0, 132.0), (388.0, 420.0), (612.0, 132.0)];
        let mut solved_events = Vec::new();

        for (x, y) in pads {
            place(&mut session, 1, x, y);
            solved_events.extend(session.tick(DT, &Intent::idle()).events);
            place(&mut session, 1, 300.0, 300.0);
            solved_events.extend(session.tick(DT, &Intent::idle()).events);
        }

        assert_eq!(
            solved_events,
            vec![SessionEvent::PuzzleSolved {
                region: 1,
                kind: PuzzleKind::StrictSequence
            }]
        );
        assert!(!gate_closed(&session, 1));
    }

    #[test]
    fn lantern_switches_toggle_on_interact_only() {
        let mut session = start_session(&MemoryGateway::default(), &MemoryScores::default());
        let switches = [(164.0, 164.0), (388.0, 292.0), (644.0, 164.0)];

        place(&mut session, 3, switches[0].0, switches[0].1);
        run_ticks(&mut session, Intent::idle(), 3);
        assert!(!session.snapshot().puzzles[3]
            .active
            .as_ref()
            .expect("active flags")[0]);

        let mut events = Vec::new();
        for (x, y) in switches {
            place(&mut session, 3, x, y);
            events.extend(session.tick(DT, &Intent::interact()).events);
        }

        assert_eq!(
            events,
            vec![SessionEvent::PuzzleSolved {
                region: 3,
                kind: PuzzleKind::ToggleSwitch
            }]
        );
        assert!(!gate_closed(&session, 3));
    }

    #[test]
    fn win_fires_exactly_once_when_the_player_reaches_the_landmark() {
        let gateway = MemoryGateway::default();
        let scores = MemoryScores::default();
        let mut session = start_session(&gateway, &scores);
        let snapshot = endgame_snapshot(&session, &[], APPROACH_X);
        assert!(session.restore(&snapshot).is_empty());
        assert!(!session.is_won());

        let idle = run_ticks(&mut session, Intent::idle(), 5);
        assert!(all_events(&idle).is_empty());
        assert!(!session.is_won());
        assert!(scores.0.lock().expect("scores").is_empty());

        let walk = run_ticks(&mut session, Intent::moving(1.0, 0.0), 90);
        let won: Vec<_> = walk
            .iter()
            .filter(|report| {
                report
                    .events
                    .iter()
                    .any(|event| matches!(event, SessionEvent::Won { .. }))
            })
            .collect();
        assert_eq!(won.len(), 1);
        assert!(won[0].saved);

        let expected_ms = (session.game_time() * 1000.0).round() as u64;
        assert_eq!(
            won[0].events,
            vec![SessionEvent::Won {
                completion_time_ms: expected_ms
            }]
        );
        assert!(session.is_won());
        assert!(session.is_paused());
        assert_eq!(
            *scores.0.lock().expect("scores"),
            vec![CompletionRecord {
                player_name: "ivy".to_string(),
                completion_time_ms: expected_ms
            }]
        );

        let saves_after_win = gateway.save_count();
        let later = run_ticks(&mut session, Intent::moving(-1.0, 0.0), 10);
        assert!(all_events(&later).is_empty());
        assert_eq!(gateway.save_count(), saves_after_win);
        assert_eq!(scores.0.lock().expect("scores").len(), 1);

        session.resume();
        assert!(session.is_paused());
        assert_eq!(
            Simulation::tick(&mut session, DT, &Intent::idle()),
            TickControl::Stop
        );
    }

    #[test]
    fn resuming_a_save_from_the_winning_tick_does_not_report_again() {
        let gateway = MemoryGateway::default();
        let first_scores = MemoryScores::default();
        let mut first = start_session(&gateway, &first_scores);
        first.restore(&endgame_snapshot(&first, &[], APPROACH_X));
        run_ticks(&mut first, Intent::moving(1.0, 0.0), 90);
        assert!(first.is_won());
        assert_eq!(first_scores.0.lock().expect("scores").len(), 1);

        let scores = MemoryScores::default();
        let mut resumed = start_session(&MemoryGateway::holding(gateway.last_save()), &scores);

        assert!(resumed.is_won());
        assert!(resumed.is_paused());
        let reports = run_ticks(&mut resumed, Intent::idle(), 3);
        assert!(all_events(&reports).is_empty());
        assert!(scores.0.lock().expect("scores").is_empty());
    }

    #[test]
    fn landmark_without_every_seed_does_not_win() {
        let scores = MemoryScores::default();
        let mut session = start_session(&MemoryGateway::default(), &scores);
        let snapshot = endgame_snapshot(&session, &[(4, 1)], ON_LANDMARK_X);
        session.restore(&snapshot);

        let reports = run_ticks(&mut session, Intent::idle(), 5);

        assert!(all_events(&reports).is_empty());
        assert!(!session.is_won());
        assert!(scores.0.lock().expect("scores").is_empty());
    }

    #[test]
    fn paused_session_ignores_ticks() {
        let mut session = start_session(&MemoryGateway::default(), &MemoryScores::default());
        let start = session.player().position;

        session.pause();
        let report = session.tick(DT, &Intent::moving(0.0, 1.0));
        assert_eq!(report, TickReport::default());
        assert_eq!(session.player().position, start);
        assert_eq!(session.game_time(), 0.0);

        session.resume();
        session.tick(DT, &Intent::moving(0.0, 1.0));
        assert!(session.player().position.y > start.y);
        assert!(session.game_time() > 0.0);
    }

    #[test]
    fn diagonal_intent_is_normalized_to_player_speed() {
        let mut session = start_session(&MemoryGateway::default(), &MemoryScores::default());
        let start = session.player().position;

        session.tick(DT, &Intent::moving(1.0, 1.0));

        let moved = session.player().position;
        let distance = ((moved.x - start.x).powi(2) + (moved.y - start.y).powi(2)).sqrt();
        assert!((distance - PLAYER_SPEED_PX_PER_SECOND * DT).abs() < 1e-3);
    }

    #[test]
    fn start_resumes_saved_progress_including_sequence_flags() {
        let first_gateway = MemoryGateway::default();
        let mut first = start_session(&first_gateway, &MemoryScores::default());
        place(&mut first, 1, 164.0, 132.0);
        first.tick(DT, &Intent::idle());
        let saved = first.snapshot();
        assert_eq!(saved.puzzles[1].entered_correct_pad, Some(true));
        assert_eq!(saved.puzzles[1].last_hit_index, Some(0));

        let mut resumed =
            start_session(&MemoryGateway::holding(saved.clone()), &MemoryScores::default());
        assert_eq!(resumed.snapshot(), saved);
        assert_eq!(resumed.current_region(), 1);

        place(&mut resumed, 1, 300.0, 300.0);
        resumed.tick(DT, &Intent::idle());
        assert_eq!(resumed.snapshot().puzzles[1].current_index, Some(1));
    }

    #[test]
    fn failed_load_starts_fresh() {
        let gateway = MemoryGateway::default();
        gateway.0.lock().expect("store").fail_load = true;

        let session = start_session(&gateway, &MemoryScores::default());

        assert_eq!(session.current_region(), 0);
        assert_eq!(session.world().remaining_collectibles(), 13);
    }

    #[test]
    fn save_failure_leaves_the_session_running() {
        let gateway = MemoryGateway::default();
        gateway.0.lock().expect("store").fail_save = true;
        let mut session = start_session(&gateway, &MemoryScores::default());
        place(&mut session, 0, 150.0, 440.0);

        let report = session.tick(DT, &Intent::idle());

        assert_eq!(report.events.len(), 1);
        assert!(!report.saved);
        assert!(session.world().regions[0].collectibles[0].collected);
        assert!(!session.is_paused());
    }

    #[test]
    fn restore_skips_parts_that_do_not_fit() {
        let mut session = start_session(&MemoryGateway::default(), &MemoryScores::default());
        let mut snapshot = session.snapshot();
        snapshot.seeds[2] = vec![true];
        snapshot.seeds[0] = vec![true, true, true];
        snapshot.region = 99;

        let issues = session.restore(&snapshot);

        assert_eq!(issues.len(), 2);
        assert_eq!(session.current_region(), 0);
        assert_eq!(session.player().position, Vec2::new(96.0, 276.0));
        assert_eq!(session.world().regions[0].remaining_collectibles(), 0);
        assert_eq!(session.world().regions[2].remaining_collectibles(), 2);
    }

    #[test]
    fn headless_loop_stops_when_the_game_is_won() {
        let mut session = start_session(&MemoryGateway::default(), &MemoryScores::default());
        let snapshot = endgame_snapshot(&session, &[], APPROACH_X);
        session.restore(&snapshot);
        let config = LoopConfig {
            realtime: false,
            ..LoopConfig::default()
        };
        let mut intents = std::iter::repeat(Intent::moving(1.0, 0.0)).take(200);

        let summary = run_loop(&config, &mut session, &mut intents);

        assert_eq!(summary.exit, LoopExit::SimulationStopped);
        assert!(summary.ticks_run < 200);
        assert!(session.is_won());
    }
