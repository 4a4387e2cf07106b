//! Round and level sequencing
//!
//! [`Game`] owns the session, the active round, the frame loop, the level
//! countdown and the listeners of the running engine. Every new round goes
//! through [`Game::enter_round`], which tears the previous round down before
//! setting the next one up.
//!
//! Prompts are queued, one at a time, as ticketed requests. The host shows
//! them (see [`settle_prompts`]) and answers through [`Game::resolve_prompt`];
//! nothing that follows a prompt happens before that answer arrives.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::cell::RefCell;

use super::countdown::{CountdownTick, LevelCountdown};
use super::driver::{AnimationDriver, UpdateFn};
use super::input::{InputEvent, ListenerRegistry, Teardown};
use super::level1::Level1Round;
use super::level2::Level2Round;
use super::level3::{CanvasSize, Level3Round};
use super::state::{GameEvent, GameSession, LevelState, RoundReport};
use crate::consts::*;
use crate::persistence::KeyValueStore;
use crate::platform::{
    FrameId, FrameScheduler, IntervalScheduler, PromptRequest, PromptResponse, PromptService,
    PromptTicket, Route, TimerId,
};
use crate::rating::{self, GameResult};
use crate::settings::Preferences;

/// Reason given when the level countdown runs out
pub const TIME_EXPIRED_REASON: &str = "time expired";

/// Startup parameters for a game
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub player_name: String,
    pub start_level: u8,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub seed: u64,
}

impl GameConfig {
    pub fn from_preferences(prefs: &Preferences, seed: u64) -> Self {
        Self {
            player_name: prefs.player_name.clone(),
            start_level: prefs.start_level,
            seed,
            ..Self::default()
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            start_level: 1,
            viewport_width: 1024.0,
            viewport_height: 768.0,
            seed: 0,
        }
    }
}

/// Where the game is between rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// A level is running (a round may be waiting on its prompt)
    Playing,
    /// Level over; waiting for next-level or restart
    LevelOver { success: bool },
    /// Level 3 finished and the result was saved
    GameOver,
    /// Player left through the exit confirmation
    Exited,
}

/// What to do once a prompt is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterPrompt {
    NextRound,
    LevelSummary,
    GameOver,
    ConfirmEndLevel,
    ConfirmExit,
}

#[derive(Debug)]
struct PendingPrompt {
    ticket: PromptTicket,
    request: PromptRequest,
    after: AfterPrompt,
    shown: bool,
}

pub struct Game {
    session: GameSession,
    phase: GamePhase,
    level: Option<LevelState>,
    /// Listeners of the running engine
    teardown: Option<Teardown>,
    /// Set while a round is live and has not reported yet
    round_open: bool,
    driver: AnimationDriver<Game>,
    countdown: LevelCountdown,
    listeners: ListenerRegistry,
    rng: Pcg32,
    canvas: CanvasSize,
    player_name: String,
    store: Box<dyn KeyValueStore>,
    prompt: Option<PendingPrompt>,
    next_ticket: u32,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(
        config: GameConfig,
        frames: Box<dyn FrameScheduler>,
        timers: Box<dyn IntervalScheduler>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        Self {
            session: GameSession::new(config.start_level),
            phase: GamePhase::Playing,
            level: None,
            teardown: None,
            round_open: false,
            driver: AnimationDriver::new(frames),
            countdown: LevelCountdown::new(timers),
            listeners: ListenerRegistry::default(),
            rng: Pcg32::seed_from_u64(config.seed),
            canvas: CanvasSize::fit(config.viewport_width, config.viewport_height),
            player_name: config.player_name,
            store,
            prompt: None,
            next_ticket: 0,
            events: Vec::new(),
        }
    }

    // === Accessors ===

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn level_state(&self) -> Option<&LevelState> {
        self.level.as_ref()
    }

    /// Mutable access to the running round, for hosts that edit it directly
    pub fn level_state_mut(&mut self) -> Option<&mut LevelState> {
        self.level.as_mut()
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn is_countdown_running(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn is_animating(&self) -> bool {
        self.driver.is_running()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn pending_prompt(&self) -> Option<&PromptRequest> {
        self.prompt.as_ref().map(|p| &p.request)
    }

    pub fn can_advance(&self) -> bool {
        self.prompt.is_none()
            && self.phase == GamePhase::LevelOver { success: true }
            && !self.session.is_last_level()
    }

    pub fn can_restart(&self) -> bool {
        self.prompt.is_none() && matches!(self.phase, GamePhase::LevelOver { .. })
    }

    /// Drain UI notifications, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Viewport changed; applies from the next level 3 round
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.canvas = CanvasSize::fit(width, height);
    }

    // === Level and round transitions ===

    /// Start the current level from its current round
    pub fn start_level(&mut self) -> bool {
        if self.prompt.is_some() {
            log::debug!("Refusing to start a level while a prompt is outstanding");
            return false;
        }
        if self.round_open {
            log::debug!("Refusing to start a level while a round is running");
            return false;
        }
        self.phase = GamePhase::Playing;
        let budget = self.session.time_budget();
        log::info!(
            "Starting level {} (round {}, {}s budget)",
            self.session.level,
            self.session.round,
            budget
        );
        self.events.push(GameEvent::LevelStarted {
            level: self.session.level,
            time_budget: budget,
        });
        self.events.push(GameEvent::ScoreChanged(self.session.score));
        self.countdown.start(budget);
        self.events.push(GameEvent::CountdownChanged(budget));
        self.enter_round()
    }

    /// Tear down the previous round and set up a fresh one for the current level
    ///
    /// Refused while a prompt is outstanding or another round is still live.
    pub fn enter_round(&mut self) -> bool {
        if self.prompt.is_some() {
            log::debug!("Refusing to enter a round while a prompt is outstanding");
            return false;
        }
        if self.round_open {
            log::debug!("Refusing to enter a round while another is running");
            return false;
        }
        self.teardown_round();

        let state = match self.session.level {
            1 => LevelState::Level1(Level1Round::new(&mut self.rng)),
            2 => LevelState::Level2(Level2Round::new(&mut self.rng)),
            _ => LevelState::Level3(Level3Round::new(&mut self.rng, self.canvas)),
        };
        self.teardown = Some(self.listeners.listen_all(state.listens()));
        self.driver.start(update_fn(&state));
        self.level = Some(state);
        self.round_open = true;

        log::info!(
            "Round {}/{} of level {}",
            self.session.round,
            MAX_ROUNDS_PER_LEVEL,
            self.session.level
        );
        self.events.push(GameEvent::RoundStarted {
            level: self.session.level,
            round: self.session.round,
        });
        true
    }

    /// Stop the frame loop and remove the round's listeners
    fn teardown_round(&mut self) {
        self.driver.stop();
        if let Some(teardown) = self.teardown.take() {
            teardown.run();
        }
        self.round_open = false;
    }

    /// Score a finished round and ask the player to acknowledge it
    ///
    /// Only the first report of a round counts.
    pub fn complete_round(&mut self, report: RoundReport) -> bool {
        if !self.round_open {
            log::debug!("Ignoring report for a round that already ended");
            return false;
        }
        self.teardown_round();

        let total = self.session.add_score(report.score);
        log::info!("Round scored {} (total {})", report.score, total);
        self.events.push(GameEvent::ScoreChanged(total));

        let title = format!(
            "Round {}/{}",
            self.session.round, MAX_ROUNDS_PER_LEVEL
        );
        self.queue_prompt(
            PromptRequest::alert(title, report.message()),
            AfterPrompt::NextRound,
        );
        true
    }

    fn next_round_or_finish(&mut self) {
        self.session.round += 1;
        if self.session.round <= MAX_ROUNDS_PER_LEVEL {
            self.enter_round();
        } else {
            self.finish_level(true, false, None);
        }
    }

    /// End the current level
    ///
    /// Not completing costs [`NOT_COMPLETED_PENALTY`], leaving early
    /// [`EARLY_EXIT_PENALTY`]; both apply together. Level 3 ends the game.
    pub fn finish_level(&mut self, completed: bool, early_exit: bool, reason: Option<&str>) {
        self.teardown_round();
        self.countdown.cancel();

        let level = self.session.level;
        let success = completed && !early_exit;

        let mut msg = if completed {
            format!("Level {} completed. ", level)
        } else {
            self.session.add_score(NOT_COMPLETED_PENALTY);
            format!("Level {} not completed. ", level)
        };
        if early_exit {
            self.session.add_score(EARLY_EXIT_PENALTY);
            msg.push_str("You ended it early. ");
        }
        if let Some(reason) = reason {
            msg.push_str(&format!("Reason: {}. ", reason));
        }

        log::info!(
            "Level {} finished (success: {}, score {})",
            level,
            success,
            self.session.score
        );
        self.events.push(GameEvent::ScoreChanged(self.session.score));
        self.events.push(GameEvent::LevelFinished { level, success });

        if self.session.is_last_level() {
            self.end_game();
            return;
        }

        self.phase = GamePhase::LevelOver { success };
        if success {
            msg.push_str("\nYou can move on to the next level.");
        } else {
            msg.push_str("\nRepeat the level to move on.");
        }
        self.queue_prompt(
            PromptRequest::alert(format!("Level {}", level), msg),
            AfterPrompt::LevelSummary,
        );
    }

    /// Persist the final score and announce the end of the game
    fn end_game(&mut self) {
        let total = self.session.score;
        let result = GameResult {
            name: self.player_name.clone(),
            total_score: total,
            date: crate::now_ms(),
        };
        if let Err(err) = rating::save_game_result(self.store.as_mut(), &result) {
            log::warn!("Failed to save game result: {}", err);
        }

        self.phase = GamePhase::GameOver;
        self.events.push(GameEvent::GameFinished { total_score: total });
        self.queue_prompt(
            PromptRequest::alert(
                "Game over",
                format!(
                    "Game over! Your final score: {}. The result was saved to the rating.",
                    total
                ),
            ),
            AfterPrompt::GameOver,
        );
    }

    /// Move to the next level after a fully successful one
    pub fn next_level(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        self.session.level += 1;
        self.session.round = 1;
        self.start_level()
    }

    /// Replay the current level from round 1
    pub fn restart_level(&mut self) -> bool {
        if !self.can_restart() {
            return false;
        }
        self.session.round = 1;
        self.start_level()
    }

    /// Ask before ending the running level early
    pub fn request_end_level(&mut self) -> bool {
        if self.prompt.is_some() || self.phase != GamePhase::Playing {
            return false;
        }
        self.pause();
        self.queue_prompt(
            PromptRequest::confirm(
                "End level",
                "End the level early? You will score less for it.",
                "End level",
                "Keep playing",
            ),
            AfterPrompt::ConfirmEndLevel,
        );
        true
    }

    /// Ask before leaving the game
    pub fn request_exit(&mut self) -> bool {
        if self.prompt.is_some() || self.phase == GamePhase::Exited {
            return false;
        }
        self.pause();
        self.queue_prompt(
            PromptRequest::confirm(
                "Exit",
                "Are you sure you want to exit? Progress of the current game will be lost.",
                "Exit",
                "Stay",
            ),
            AfterPrompt::ConfirmExit,
        );
        true
    }

    fn pause(&mut self) {
        self.driver.stop();
    }

    /// Resume the open round after a declined confirmation
    fn resume(&mut self) {
        if !self.round_open {
            return;
        }
        if let Some(state) = &self.level {
            self.driver.start(update_fn(state));
        }
    }

    fn exit(&mut self) {
        self.teardown_round();
        self.countdown.cancel();
        self.level = None;
        if let Err(err) = rating::clear_last_game(self.store.as_mut()) {
            log::warn!("Failed to clear last game: {}", err);
        }
        self.phase = GamePhase::Exited;
        self.events.push(GameEvent::Navigate(Route::Home));
    }

    // === Prompts ===

    fn queue_prompt(&mut self, request: PromptRequest, after: AfterPrompt) {
        let ticket = PromptTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.countdown.set_paused(true);
        self.prompt = Some(PendingPrompt {
            ticket,
            request,
            after,
            shown: false,
        });
    }

    /// Hand the pending prompt to the host, once
    pub fn take_prompt(&mut self) -> Option<(PromptTicket, PromptRequest)> {
        let prompt = self.prompt.as_mut()?;
        if prompt.shown {
            return None;
        }
        prompt.shown = true;
        Some((prompt.ticket, prompt.request.clone()))
    }

    /// Answer the pending prompt and continue. Stale tickets are ignored.
    pub fn resolve_prompt(&mut self, ticket: PromptTicket, response: PromptResponse) -> bool {
        let Some(pending) = self.prompt.take_if(|p| p.ticket == ticket) else {
            log::warn!("Ignoring answer for stale prompt {:?}", ticket);
            return false;
        };
        self.countdown.set_paused(false);

        match pending.after {
            AfterPrompt::NextRound => self.next_round_or_finish(),
            AfterPrompt::LevelSummary => {}
            AfterPrompt::GameOver => self.events.push(GameEvent::Navigate(Route::Rating)),
            AfterPrompt::ConfirmEndLevel => {
                if response.accepted() {
                    self.finish_level(false, true, None);
                } else {
                    self.resume();
                }
            }
            AfterPrompt::ConfirmExit => {
                if response.accepted() {
                    self.exit();
                } else {
                    self.resume();
                }
            }
        }
        true
    }

    // === Host callbacks ===

    /// Animation frame from the host
    pub fn on_frame(&mut self, id: FrameId, timestamp_ms: f64) {
        if let Some((update, dt)) = self.driver.frame(id, timestamp_ms) {
            update(self, dt);
        }
    }

    /// Countdown tick from the host's interval timer
    pub fn on_countdown_tick(&mut self, id: TimerId) {
        match self.countdown.tick(id) {
            CountdownTick::Running(left) => self.events.push(GameEvent::CountdownChanged(left)),
            CountdownTick::Expired => {
                log::info!("Level {} ran out of time", self.session.level);
                self.events.push(GameEvent::CountdownChanged(0));
                // The running round is abandoned unscored
                self.finish_level(false, false, Some(TIME_EXPIRED_REASON));
            }
            CountdownTick::Paused | CountdownTick::Stale => {}
        }
    }

    /// User input from the host; dropped unless the running engine listens for it
    ///
    /// While a prompt is open only releases get through, so nothing is still
    /// held when a declined confirmation resumes the round.
    pub fn handle_input(&mut self, event: InputEvent) {
        if !self.listeners.is_listening(event.kind()) {
            return;
        }
        let prompt_open = self.prompt.is_some();
        if prompt_open && !event.is_release() {
            return;
        }
        let report = self.level.as_mut().and_then(|s| s.handle_input(&event));
        if let Some(report) = report.filter(|_| !prompt_open) {
            self.complete_round(report);
        }
    }
}

/// Per-level frame update for a round
fn update_fn(state: &LevelState) -> UpdateFn<Game> {
    match state {
        LevelState::Level1(_) => update_level1,
        LevelState::Level2(_) => update_level2,
        LevelState::Level3(_) => update_level3,
    }
}

fn update_level1(game: &mut Game, dt: f32) {
    let report = match game.level.as_mut() {
        Some(LevelState::Level1(round)) => round.update(dt),
        _ => None,
    };
    if let Some(report) = report {
        game.complete_round(report);
    }
}

fn update_level2(game: &mut Game, dt: f32) {
    let report = match game.level.as_mut() {
        Some(LevelState::Level2(round)) => round.update(dt),
        _ => None,
    };
    if let Some(report) = report {
        game.complete_round(report);
    }
}

fn update_level3(game: &mut Game, dt: f32) {
    let report = match game.level.as_mut() {
        Some(LevelState::Level3(round)) => round.update(&mut game.rng, dt),
        _ => None,
    };
    if let Some(report) = report {
        game.complete_round(report);
    }
}

/// Show the pending prompt, if any, and apply the answer
///
/// Returns false when there was nothing to show. The game is never borrowed
/// across the await.
pub async fn settle_next_prompt(game: &RefCell<Game>, prompts: &dyn PromptService) -> bool {
    let next = game.borrow_mut().take_prompt();
    let Some((ticket, request)) = next else {
        return false;
    };
    let response = prompts.show(&request).await;
    game.borrow_mut().resolve_prompt(ticket, response);
    true
}

/// Show queued prompts one after another until none is left
pub async fn settle_prompts(game: &RefCell<Game>, prompts: &dyn PromptService) {
    while settle_next_prompt(game, prompts).await {}
}
