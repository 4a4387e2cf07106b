//! End-to-end game flows through the public `Game` API

use std::cell::RefCell;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use rally_reflex::RatingTable;
use rally_reflex::persistence::{KeyValueStore, MemoryStore, StoreError};
use rally_reflex::platform::prompt::ScriptedPrompts;
use rally_reflex::platform::{ManualFrames, ManualIntervals, PromptRequest, Route};
use rally_reflex::rating;
use rally_reflex::sim::{
    Game, GameConfig, GameEvent, GamePhase, InputEvent, Key, Level1Round, Level1Setup, Level2Car,
    Level2Round, LevelState, settle_prompts,
};

/// Store whose contents the test can still read after handing it to the game
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<MemoryStore>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.0.borrow_mut().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.0.borrow_mut().remove(key)
    }
}

struct Table {
    game: RefCell<Game>,
    frames: ManualFrames,
    timers: ManualIntervals,
    store: SharedStore,
    timestamp: f64,
}

impl Table {
    fn new(start_level: u8) -> Self {
        let frames = ManualFrames::default();
        let timers = ManualIntervals::default();
        let store = SharedStore::default();
        let config = GameConfig {
            player_name: "Ann".to_string(),
            start_level,
            seed: 7,
            ..GameConfig::default()
        };
        let game = Game::new(
            config,
            Box::new(frames.clone()),
            Box::new(timers.clone()),
            Box::new(store.clone()),
        );
        Self {
            game: RefCell::new(game),
            frames,
            timers,
            store,
            timestamp: 0.0,
        }
    }

    /// Fire the next animation frame, 100 ms after the previous one
    fn frame(&mut self) -> bool {
        let Some(id) = self.frames.next_frame() else {
            return false;
        };
        self.timestamp += 100.0;
        self.game.borrow_mut().on_frame(id, self.timestamp);
        true
    }

    fn input(&self, event: InputEvent) {
        self.game.borrow_mut().handle_input(event);
    }

    fn settle(&self, prompts: &ScriptedPrompts) {
        block_on(settle_prompts(&self.game, prompts));
    }

    fn has_prompt(&self) -> bool {
        self.game.borrow().pending_prompt().is_some()
    }

    fn score(&self) -> u32 {
        self.game.borrow().session().score
    }
}

fn block_on<F: Future>(fut: F) -> F::Output {
    let mut fut = pin!(fut);
    let mut cx = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(value) = fut.as_mut().poll(&mut cx) {
            return value;
        }
    }
}

fn set_round(table: &Table, state: LevelState) {
    let mut game = table.game.borrow_mut();
    let slot = game.level_state_mut().expect("round running");
    *slot = state;
}

#[test]
fn perfect_level1_round_scores_100() {
    let mut table = Table::new(1);
    assert!(table.game.borrow_mut().start_level());
    set_round(
        &table,
        LevelState::Level1(Level1Round::from_setup(Level1Setup {
            distance: 100,
            speed: 20,
            options: vec![3, 4, 5, 6, 7],
        })),
    );

    // Pick "5 s", start the drive and hold the forward key
    table.input(InputEvent::KeyDown(Key::Digit(3)));
    table.input(InputEvent::KeyDown(Key::Enter));
    table.input(InputEvent::KeyDown(Key::ArrowRight));

    for _ in 0..200 {
        if table.has_prompt() {
            break;
        }
        assert!(table.frame());
    }
    assert!(table.has_prompt());
    assert_eq!(table.score(), 100);
    assert!(!table.game.borrow().is_animating());

    let prompts = ScriptedPrompts::new(true);
    table.settle(&prompts);
    assert!(prompts.shown()[0].contains("Round total: 100 points"));
    assert_eq!(table.game.borrow().session().round, 2);
    assert!(table.game.borrow().is_animating());
}

#[test]
fn level2_round_scored_from_stop_times() {
    let mut table = Table::new(2);
    assert!(table.game.borrow_mut().start_level());
    set_round(
        &table,
        LevelState::Level2(Level2Round::from_cars([
            Level2Car::new(6, 400, 2.5),
            Level2Car::new(9, 500, 3.0),
        ])),
    );

    let elapsed = |t: &Table| t.game.borrow().level_state().map(|s| s.elapsed()).unwrap_or(0.0);
    while elapsed(&table) < 5.95 {
        assert!(table.frame());
    }
    table.input(InputEvent::KeyDown(Key::Char('a')));
    assert!(!table.has_prompt());

    while elapsed(&table) < 8.95 {
        assert!(table.frame());
    }
    table.input(InputEvent::KeyDown(Key::Char('l')));

    assert!(table.has_prompt());
    assert_eq!(table.score(), 120);
}

#[test]
fn three_rounds_complete_a_level() {
    let mut table = Table::new(2);
    let prompts = ScriptedPrompts::new(true);
    assert!(table.game.borrow_mut().start_level());

    // Nobody presses anything: every car drives to the end of its lane
    for _ in 0..2000 {
        table.settle(&prompts);
        if table.game.borrow().phase() != GamePhase::Playing {
            break;
        }
        table.frame();
    }
    table.settle(&prompts);

    let game = table.game.borrow();
    assert_eq!(game.phase(), GamePhase::LevelOver { success: true });
    assert!(game.can_advance());
    assert!(game.can_restart());
    assert!(!game.is_countdown_running());
    assert_eq!(game.listener_count(), 0);
    // Three round alerts, then the level summary
    assert_eq!(prompts.shown().len(), 4);
    assert!(prompts.shown()[3].starts_with("Level 2 completed."));
}

#[test]
fn countdown_expiry_fails_the_level() {
    let table = Table::new(1);
    assert!(table.game.borrow_mut().start_level());
    let timer = table.timers.last_started().expect("countdown started");

    for _ in 0..60 {
        table.game.borrow_mut().on_countdown_tick(timer);
    }

    let game = table.game.borrow();
    assert_eq!(game.phase(), GamePhase::LevelOver { success: false });
    assert_eq!(game.session().score, 0);
    assert!(table.timers.active().is_empty());
    assert!(!game.is_animating());
    match game.pending_prompt() {
        Some(PromptRequest::Alert { message, .. }) => {
            assert!(message.contains("not completed"));
            assert!(message.contains("time expired"));
        }
        other => panic!("expected level summary, got {:?}", other),
    }
    assert!(!game.can_advance());
}

#[test]
fn countdown_pauses_while_a_prompt_is_open() {
    let table = Table::new(1);
    assert!(table.game.borrow_mut().start_level());
    let timer = table.timers.last_started().expect("countdown started");

    assert!(table.game.borrow_mut().request_end_level());
    for _ in 0..100 {
        table.game.borrow_mut().on_countdown_tick(timer);
    }
    assert_eq!(table.game.borrow().countdown_remaining(), 60);
    assert_eq!(table.game.borrow().phase(), GamePhase::Playing);
}

#[test]
fn declined_exit_resumes_and_accepted_exit_goes_home() {
    let table = Table::new(2);
    assert!(table.game.borrow_mut().start_level());
    table.game.borrow_mut().drain_events();

    assert!(table.game.borrow_mut().request_exit());
    assert!(!table.game.borrow().is_animating());
    table.settle(&ScriptedPrompts::new(false));
    assert!(table.game.borrow().is_animating());
    assert_eq!(table.game.borrow().phase(), GamePhase::Playing);

    assert!(table.game.borrow_mut().request_exit());
    table.settle(&ScriptedPrompts::new(true));
    let mut game = table.game.borrow_mut();
    assert_eq!(game.phase(), GamePhase::Exited);
    assert_eq!(game.listener_count(), 0);
    assert!(game.drain_events().contains(&GameEvent::Navigate(Route::Home)));
    assert_eq!(rating::last_game_result(&table.store), None);
}

#[test]
fn ending_level3_early_saves_the_rating() {
    let table = Table::new(3);
    assert!(table.game.borrow_mut().start_level());
    table.game.borrow_mut().drain_events();

    assert!(table.game.borrow_mut().request_end_level());
    let prompts = ScriptedPrompts::new(true);
    table.settle(&prompts);

    let mut game = table.game.borrow_mut();
    assert_eq!(game.phase(), GamePhase::GameOver);
    let events = game.drain_events();
    assert!(events.contains(&GameEvent::GameFinished { total_score: 0 }));
    assert_eq!(events.last(), Some(&GameEvent::Navigate(Route::Rating)));
    assert!(prompts.shown().last().is_some_and(|m| m.contains("final score: 0")));

    let table_rows = RatingTable::load(&table.store);
    assert_eq!(table_rows.rank_of("Ann"), Some(1));
    let last = rating::last_game_result(&table.store).expect("last game saved");
    assert_eq!(last.name, "Ann");
    assert_eq!(last.total_score, 0);
}

#[test]
fn input_is_ignored_by_levels_that_do_not_listen() {
    let table = Table::new(2);
    assert!(table.game.borrow_mut().start_level());
    // Level 2 has no pointer listeners
    table.input(InputEvent::PointerDown(glam::Vec2::new(10.0, 10.0)));
    table.input(InputEvent::KeyDown(Key::Space));
    let game = table.game.borrow();
    match game.level_state() {
        Some(LevelState::Level2(round)) => {
            assert!(!round.cars[0].moving);
            assert!(round.cars[1].moving);
        }
        other => panic!("expected a level 2 round, got {:?}", other),
    }
}
