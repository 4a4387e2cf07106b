//! Session and per-round state shared by the engines and the orchestrator

use super::input::{EventKind, InputEvent};
use super::level1::Level1Round;
use super::level2::{CarResult, Level2Round};
use super::level3::Level3Round;
use crate::consts::*;
use crate::platform::Route;

/// Process-wide progress of one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    /// Current level (1..=3)
    pub level: u8,
    /// Current round (1..=MAX_ROUNDS_PER_LEVEL)
    pub round: u32,
    /// Cumulative score, never negative
    pub score: u32,
}

impl GameSession {
    pub fn new(start_level: u8) -> Self {
        Self {
            level: start_level.clamp(1, LEVEL_COUNT),
            round: 1,
            score: 0,
        }
    }

    /// Apply a score delta, clamping the total at zero. Returns the new total.
    pub fn add_score(&mut self, delta: i32) -> u32 {
        let total = (self.score as i64 + delta as i64).max(0);
        self.score = total.min(u32::MAX as i64) as u32;
        self.score
    }

    /// Countdown budget for the current level, in seconds
    pub fn time_budget(&self) -> u32 {
        LEVEL_TIME_BUDGET[(self.level.clamp(1, LEVEL_COUNT) - 1) as usize]
    }

    pub fn is_last_level(&self) -> bool {
        self.level >= LEVEL_COUNT
    }
}

/// A 1-D track laid out horizontally (levels 1 and 2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrack {
    /// Rendered width
    pub width: f32,
    /// Offset of the start mark from the left edge
    pub start: f32,
    /// Offset of the end mark from the left edge
    pub end: f32,
}

impl LinearTrack {
    pub fn new(width: f32, inset: f32) -> Self {
        Self {
            width,
            start: inset,
            end: width - inset,
        }
    }

    /// Travel distance between the start and end marks
    pub fn length(&self) -> f32 {
        (self.end - self.start).max(0.0)
    }
}

/// A car riding a [`LinearTrack`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackCar {
    /// Distance travelled from the start mark
    pub offset: f32,
    pub moving: bool,
}

/// Why a level 3 round failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    Obstacle,
    OffRoad,
}

impl FailReason {
    pub fn describe(&self) -> &'static str {
        match self {
            FailReason::Obstacle => "You hit an obstacle!",
            FailReason::OffRoad => "You drove off the road!",
        }
    }
}

/// What happened in a finished round
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    GuessAndDrive {
        real_time: f32,
        chosen: Option<u32>,
        choice_score: i32,
        drive_time: f32,
        drive_score: i32,
    },
    DualStop {
        targets: [u32; 2],
        cars: [CarResult; 2],
    },
    LapCompleted {
        lap_time: f32,
    },
    Crashed(FailReason),
}

/// Score delta and outcome reported by an engine when its round ends
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub score: i32,
    pub outcome: RoundOutcome,
}

impl RoundReport {
    /// Player-facing summary shown in the round prompt
    pub fn message(&self) -> String {
        match &self.outcome {
            RoundOutcome::GuessAndDrive {
                real_time,
                chosen,
                choice_score,
                drive_time,
                drive_score,
            } => {
                let choice = match chosen {
                    Some(c) => format!("you picked {} s ({:+})", c, choice_score),
                    None => format!("no time picked ({:+})", choice_score),
                };
                format!(
                    "Real time ≈ {:.2} s, {}. Drive time {:.2} s ({:+}). Round total: {} points.",
                    real_time, choice, drive_time, drive_score, self.score
                )
            }
            RoundOutcome::DualStop { targets, cars } => {
                let mut msg = format!(
                    "Targets: car 1 {} s, car 2 {} s.\n",
                    targets[0], targets[1]
                );
                for (i, car) in cars.iter().enumerate() {
                    msg.push_str(&format!(
                        "Car {}: stopped at {:.2} s (off by {:.2} s){}, points: {}\n",
                        i + 1,
                        car.stop_time,
                        car.diff,
                        if car.auto_stopped { ", reached the end" } else { "" },
                        car.score
                    ));
                }
                msg.push_str(&format!("Round total: {} points.", self.score));
                msg
            }
            RoundOutcome::LapCompleted { lap_time } => format!(
                "Lap complete!\nTime: {:.2} s\nPoints: +{}",
                lap_time, self.score
            ),
            RoundOutcome::Crashed(reason) => {
                format!("{}\nPenalty: {}", reason.describe(), self.score)
            }
        }
    }
}

/// Per-level round state; replaced wholesale when a new round starts
#[derive(Debug, Clone)]
pub enum LevelState {
    Level1(Level1Round),
    Level2(Level2Round),
    Level3(Level3Round),
}

impl LevelState {
    /// Event kinds the level's engine listens to
    pub fn listens(&self) -> &'static [EventKind] {
        match self {
            LevelState::Level1(_) => Level1Round::LISTENS,
            LevelState::Level2(_) => Level2Round::LISTENS,
            LevelState::Level3(_) => Level3Round::LISTENS,
        }
    }

    /// Elapsed round time, seconds
    pub fn elapsed(&self) -> f32 {
        match self {
            LevelState::Level1(r) => r.elapsed,
            LevelState::Level2(r) => r.elapsed,
            LevelState::Level3(r) => r.time,
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            LevelState::Level1(r) => r.is_finished(),
            LevelState::Level2(r) => r.is_evaluated(),
            LevelState::Level3(r) => r.finished,
        }
    }

    /// Route an input event to the engine; returns a report if it ended the round
    pub fn handle_input(&mut self, event: &InputEvent) -> Option<RoundReport> {
        match self {
            LevelState::Level1(r) => {
                r.handle_input(event);
                None
            }
            LevelState::Level2(r) => r.handle_input(event),
            LevelState::Level3(r) => {
                r.handle_input(event);
                None
            }
        }
    }
}

/// Notifications for the UI, drained by the platform layer
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    LevelStarted { level: u8, time_budget: u32 },
    RoundStarted { level: u8, round: u32 },
    ScoreChanged(u32),
    CountdownChanged(u32),
    LevelFinished { level: u8, success: bool },
    GameFinished { total_score: u32 },
    Navigate(Route),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_score_floor() {
        let mut session = GameSession::new(1);
        assert_eq!(session.add_score(30), 30);
        assert_eq!(session.add_score(-50), 0);
        assert_eq!(session.add_score(-10), 0);
        assert_eq!(session.add_score(15), 15);
    }

    #[test]
    fn test_start_level_clamped() {
        assert_eq!(GameSession::new(0).level, 1);
        assert_eq!(GameSession::new(7).level, 3);
        assert_eq!(GameSession::new(2).time_budget(), 50);
    }

    #[test]
    fn test_linear_track_length() {
        let track = LinearTrack::new(500.0, 20.0);
        assert_eq!(track.length(), 460.0);
    }

    #[test]
    fn test_crash_message_mentions_penalty() {
        let report = RoundReport {
            score: LEVEL3_FAIL_PENALTY,
            outcome: RoundOutcome::Crashed(FailReason::OffRoad),
        };
        assert!(report.message().contains("-25"));
    }

    proptest! {
        #[test]
        fn score_never_negative(deltas in proptest::collection::vec(-100i32..100, 0..50)) {
            let mut session = GameSession::new(1);
            let mut expected: i64 = 0;
            for d in deltas {
                expected = (expected + d as i64).max(0);
                prop_assert_eq!(session.add_score(d) as i64, expected);
            }
            for _ in 0..5 {
                prop_assert_eq!(session.add_score(-1000), 0);
            }
        }
    }
}
