//! Level 1 - Guess & Drive
//!
//! The player first estimates how long the car needs for the track (pick one
//! of five whole-second options), then drives it to the end trying to match
//! the real time. Phases: `Choice -> Drive -> Finished`.

use rand::Rng;
use std::collections::BTreeSet;

use super::input::{EventKind, InputEvent, Key, Target};
use super::state::{LinearTrack, RoundOutcome, RoundReport, TrackCar};
use crate::consts::*;
use crate::random_int;

/// Level 1 round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level1Phase {
    /// Picking a time option
    Choice,
    /// Driving the car to the end mark
    Drive,
    Finished,
}

/// Score for a time estimate, by absolute error in seconds
///
/// Tiers: < 0.5 -> 50, < 1.0 -> 30, < 2.0 -> 10, otherwise -10.
pub fn time_guess_score(guess: f32, real_time: f32) -> i32 {
    let diff = (guess - real_time).abs();
    if diff < 0.5 {
        50
    } else if diff < 1.0 {
        30
    } else if diff < 2.0 {
        10
    } else {
        -10
    }
}

/// Score when the player never picked a time
pub const NO_CHOICE_SCORE: i32 = -10;

/// Randomized round parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Level1Setup {
    /// Track distance, metres
    pub distance: u32,
    /// Car speed, metres per second
    pub speed: u32,
    /// Offered time options, sorted ascending
    pub options: Vec<u32>,
}

impl Level1Setup {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let distance = random_int(
            rng,
            LEVEL1_MIN_DISTANCE as i32,
            LEVEL1_MAX_DISTANCE as i32,
        ) as u32;

        // Integer speed keeping distance / speed within the time window
        let min_speed = (distance as f32 / LEVEL1_MAX_TIME).ceil() as i32;
        let max_speed = (distance as f32 / LEVEL1_MIN_TIME).floor() as i32;
        let speed = random_int(rng, min_speed, max_speed) as u32;

        let real_time = distance as f32 / speed as f32;
        let options = time_options(rng, real_time);
        Self {
            distance,
            speed,
            options,
        }
    }

    pub fn real_time(&self) -> f32 {
        self.distance as f32 / self.speed as f32
    }

    /// Rendered track width, growing linearly with distance
    pub fn track_width(&self) -> f32 {
        let span = (LEVEL1_MAX_DISTANCE - LEVEL1_MIN_DISTANCE) as f32;
        let ratio = (self.distance.saturating_sub(LEVEL1_MIN_DISTANCE)) as f32 / span;
        LEVEL1_MIN_TRACK_PX + ratio.clamp(0.0, 1.0) * (LEVEL1_MAX_TRACK_PX - LEVEL1_MIN_TRACK_PX)
    }
}

/// Five distinct whole-second options around the real time, sorted ascending
pub fn time_options<R: Rng + ?Sized>(rng: &mut R, real_time: f32) -> Vec<u32> {
    let base = (real_time.round() as i32).max(1);
    let mut options: BTreeSet<u32> = (base - 2..=base + 2)
        .filter(|v| *v > 0)
        .map(|v| v as u32)
        .collect();
    while options.len() < LEVEL1_OPTION_COUNT {
        options.insert(random_int(rng, 1, base + 6) as u32);
    }
    options.into_iter().collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DriveKeys {
    forward: bool,
    reverse: bool,
    accelerate: bool,
    brake: bool,
}

/// State of one level 1 round
#[derive(Debug, Clone)]
pub struct Level1Round {
    pub setup: Level1Setup,
    pub real_time: f32,
    pub track: LinearTrack,
    pub car: TrackCar,
    pub phase: Level1Phase,
    /// Index into `setup.options`
    pub chosen: Option<usize>,
    /// Score locked in when the drive starts
    pub choice_score: Option<i32>,
    /// Drive clock, seconds
    pub elapsed: f32,
    /// Set by the first directional input of the drive
    pub clock_started: bool,
    keys: DriveKeys,
}

impl Level1Round {
    pub const LISTENS: &'static [EventKind] = &[
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::Click,
        EventKind::DoubleClick,
    ];

    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_setup(Level1Setup::random(rng))
    }

    pub fn from_setup(setup: Level1Setup) -> Self {
        let real_time = setup.real_time();
        let track = LinearTrack::new(setup.track_width(), LEVEL1_TRACK_INSET);
        log::debug!(
            "Level 1 round: distance={} speed={} real_time={:.2} options={:?}",
            setup.distance,
            setup.speed,
            real_time,
            setup.options
        );
        Self {
            setup,
            real_time,
            track,
            car: TrackCar::default(),
            phase: Level1Phase::Choice,
            chosen: None,
            choice_score: None,
            elapsed: 0.0,
            clock_started: false,
            keys: DriveKeys::default(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Level1Phase::Finished
    }

    /// Chosen time option, in seconds
    pub fn chosen_time(&self) -> Option<u32> {
        self.chosen.and_then(|i| self.setup.options.get(i).copied())
    }

    /// Select an option by index. Only allowed while choosing.
    pub fn select_option(&mut self, index: usize) -> bool {
        if self.phase != Level1Phase::Choice || index >= self.setup.options.len() {
            return false;
        }
        self.chosen = Some(index);
        true
    }

    /// Leave the choice phase, scoring the choice. Returns the choice score.
    pub fn begin_drive(&mut self) -> Option<i32> {
        if self.phase != Level1Phase::Choice {
            return None;
        }
        let score = match self.chosen_time() {
            Some(t) => time_guess_score(t as f32, self.real_time),
            None => NO_CHOICE_SCORE,
        };
        self.choice_score = Some(score);
        self.phase = Level1Phase::Drive;
        Some(score)
    }

    /// Baseline forward speed, track units per second
    pub fn baseline_speed(&self) -> f32 {
        self.track.length() / self.real_time
    }

    /// Current signed velocity from the held keys
    pub fn velocity(&self) -> f32 {
        let mut factor = 1.0;
        if self.keys.accelerate {
            factor += LEVEL1_ACCEL_BONUS;
        }
        if self.keys.brake {
            factor -= LEVEL1_BRAKE_PENALTY;
        }
        let forward = self.baseline_speed()
            * factor.clamp(LEVEL1_MIN_SPEED_FACTOR, LEVEL1_MAX_SPEED_FACTOR);

        match (self.keys.forward, self.keys.reverse) {
            (true, false) => forward,
            (false, true) => -forward * LEVEL1_REVERSE_FACTOR,
            _ => 0.0,
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        match (self.phase, event) {
            (Level1Phase::Choice, InputEvent::KeyDown(Key::Digit(d))) if (1..=5).contains(d) => {
                self.select_option(*d as usize - 1);
            }
            (Level1Phase::Choice, InputEvent::Click(Target::TimeOption(i))) => {
                self.select_option(*i);
            }
            (Level1Phase::Choice, InputEvent::KeyDown(Key::Enter))
            | (Level1Phase::Choice, InputEvent::DoubleClick(Target::Car(_))) => {
                self.begin_drive();
            }
            (Level1Phase::Drive, InputEvent::KeyDown(key)) => {
                if self.set_key(*key, true) {
                    self.clock_started = true;
                }
            }
            (Level1Phase::Drive, InputEvent::KeyUp(key)) => {
                self.set_key(*key, false);
            }
            _ => {}
        }
    }

    fn set_key(&mut self, key: Key, pressed: bool) -> bool {
        match key {
            Key::ArrowRight => self.keys.forward = pressed,
            Key::ArrowLeft => self.keys.reverse = pressed,
            Key::ArrowUp => self.keys.accelerate = pressed,
            Key::ArrowDown => self.keys.brake = pressed,
            _ => return false,
        }
        true
    }

    /// Advance the drive by `dt` seconds; returns the report once the end is reached
    pub fn update(&mut self, dt: f32) -> Option<RoundReport> {
        if self.phase != Level1Phase::Drive || !self.clock_started {
            return None;
        }
        self.elapsed += dt;

        let v = self.velocity();
        let length = self.track.length();
        self.car.offset = (self.car.offset + v * dt).clamp(0.0, length);
        self.car.moving = v != 0.0;

        if self.car.offset < length {
            return None;
        }

        self.car.moving = false;
        self.phase = Level1Phase::Finished;
        let choice_score = self.choice_score.unwrap_or(NO_CHOICE_SCORE);
        let drive_score = time_guess_score(self.elapsed, self.real_time);
        log::info!(
            "Level 1 drive finished in {:.2}s (real {:.2}s)",
            self.elapsed,
            self.real_time
        );
        Some(RoundReport {
            score: choice_score + drive_score,
            outcome: RoundOutcome::GuessAndDrive {
                real_time: self.real_time,
                chosen: self.chosen_time(),
                choice_score,
                drive_time: self.elapsed,
                drive_score,
            },
        })
    }
}
