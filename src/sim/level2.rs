//! Level 2 - Dual Stop
//!
//! Two cars run in parallel lanes, each deliberately too slow to reach the end
//! before its target time. The player stops each one as close to its target as
//! possible. The round is evaluated exactly once, when both cars stand still.

use rand::Rng;

use super::input::{EventKind, InputEvent, Key, Target};
use super::state::{RoundOutcome, RoundReport};
use crate::consts::*;
use crate::{random_float, random_int};

/// Number of cars in a level 2 round
pub const CAR_COUNT: usize = 2;

/// Per-car score by absolute stop error in seconds
///
/// Tiers: < 0.3 -> 60, < 0.7 -> 40, < 1.2 -> 15, otherwise -10.
pub fn stop_score(diff: f32) -> i32 {
    if diff < 0.3 {
        60
    } else if diff < 0.7 {
        40
    } else if diff < 1.2 {
        15
    } else {
        -10
    }
}

/// Two distinct integer target times in `[LEVEL2_MIN_TARGET, LEVEL2_MAX_TARGET]`
pub fn pick_targets<R: Rng + ?Sized>(rng: &mut R) -> [u32; CAR_COUNT] {
    let min = LEVEL2_MIN_TARGET as i32;
    let max = LEVEL2_MAX_TARGET as i32;
    let first = random_int(rng, min, max);
    // Draw from one fewer value and skip over the first target
    let mut second = random_int(rng, min, max - 1);
    if second >= first {
        second += 1;
    }
    [first as u32, second as u32]
}

/// Scored result of one stopped car
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarResult {
    pub stop_time: f32,
    pub diff: f32,
    pub score: i32,
    /// Stopped by reaching the lane end rather than by the player
    pub auto_stopped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Level2Car {
    pub target_time: u32,
    /// Lane length, layout units
    pub distance: u32,
    /// Layout units per second
    pub speed: f32,
    pub elapsed: f32,
    pub moving: bool,
    pub stopped_time: Option<f32>,
    /// Fraction of the lane covered, 0..=1
    pub progress: f32,
    pub auto_stopped: bool,
}

impl Level2Car {
    /// `overrun` stretches the unimpeded travel time to `target * overrun`
    pub fn new(target_time: u32, distance: u32, overrun: f32) -> Self {
        Self {
            target_time,
            distance,
            speed: distance as f32 / (target_time as f32 * overrun),
            elapsed: 0.0,
            moving: true,
            stopped_time: None,
            progress: 0.0,
            auto_stopped: false,
        }
    }

    /// Seconds needed to cover the whole lane
    pub fn travel_time(&self) -> f32 {
        self.distance as f32 / self.speed
    }

    fn update(&mut self, dt: f32) {
        if !self.moving {
            return;
        }
        self.elapsed += dt;
        self.progress = (self.elapsed / self.travel_time()).min(1.0);
        if self.progress >= 1.0 {
            self.auto_stopped = true;
            self.stop();
        }
    }

    /// Returns false if the car was already stopped
    fn stop(&mut self) -> bool {
        if !self.moving {
            return false;
        }
        self.moving = false;
        self.stopped_time = Some(self.elapsed);
        true
    }

    /// Horizontal position as a percentage of the lane (5% .. 95%)
    pub fn left_percent(&self) -> f32 {
        5.0 + self.progress * 90.0
    }

    pub fn result(&self) -> CarResult {
        let stop_time = self.stopped_time.unwrap_or(self.elapsed);
        let diff = (stop_time - self.target_time as f32).abs();
        CarResult {
            stop_time,
            diff,
            score: stop_score(diff),
            auto_stopped: self.auto_stopped,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Level2Round {
    pub cars: [Level2Car; CAR_COUNT],
    /// Round clock, seconds
    pub elapsed: f32,
    evaluated: bool,
}

impl Level2Round {
    pub const LISTENS: &'static [EventKind] = &[EventKind::KeyDown, EventKind::Click];

    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let targets = pick_targets(rng);
        let cars = targets.map(|target| {
            let distance = random_int(
                rng,
                LEVEL2_MIN_DISTANCE as i32,
                LEVEL2_MAX_DISTANCE as i32,
            ) as u32;
            let overrun = random_float(rng, LEVEL2_MIN_OVERRUN, LEVEL2_MAX_OVERRUN);
            Level2Car::new(target, distance, overrun)
        });
        Self::from_cars(cars)
    }

    pub fn from_cars(cars: [Level2Car; CAR_COUNT]) -> Self {
        log::debug!(
            "Level 2 round: targets={:?} travel={:?}",
            cars.each_ref().map(|c| c.target_time),
            cars.each_ref().map(|c| c.travel_time())
        );
        Self {
            cars,
            elapsed: 0.0,
            evaluated: false,
        }
    }

    pub fn targets(&self) -> [u32; CAR_COUNT] {
        self.cars.each_ref().map(|c| c.target_time)
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// Stop car `index` at its current elapsed time
    pub fn stop_car(&mut self, index: usize) -> Option<RoundReport> {
        let stopped = self.cars.get_mut(index).is_some_and(|car| car.stop());
        if stopped {
            self.try_evaluate()
        } else {
            None
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) -> Option<RoundReport> {
        match event {
            InputEvent::KeyDown(Key::Char('a')) => self.stop_car(0),
            InputEvent::KeyDown(Key::Char('l')) => self.stop_car(1),
            InputEvent::KeyDown(Key::Space) => {
                let first_moving = self.cars.iter().position(|c| c.moving)?;
                self.stop_car(first_moving)
            }
            InputEvent::Click(Target::Car(index)) => self.stop_car(*index),
            _ => None,
        }
    }

    pub fn update(&mut self, dt: f32) -> Option<RoundReport> {
        if self.evaluated {
            return None;
        }
        self.elapsed += dt;
        for car in &mut self.cars {
            car.update(dt);
        }
        self.try_evaluate()
    }

    fn try_evaluate(&mut self) -> Option<RoundReport> {
        if self.evaluated || self.cars.iter().any(|c| c.moving) {
            return None;
        }
        self.evaluated = true;

        let results = self.cars.each_ref().map(Level2Car::result);
        let score = results.iter().map(|r| r.score).sum();
        log::info!("Level 2 round evaluated: {:?}", results);
        Some(RoundReport {
            score,
            outcome: RoundOutcome::DualStop {
                targets: self.targets(),
                cars: results,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn round_6_9() -> Level2Round {
        Level2Round::from_cars([Level2Car::new(6, 450, 2.5), Level2Car::new(9, 500, 2.8)])
    }

    #[test]
    fn test_score_tiers() {
        assert_eq!(stop_score(0.1), 60);
        assert_eq!(stop_score(0.3), 40);
        assert_eq!(stop_score(1.0), 15);
        assert_eq!(stop_score(1.2), -10);
    }

    #[test]
    fn test_overrun_by_construction() {
        let car = Level2Car::new(6, 450, 2.5);
        assert!((car.travel_time() - 15.0).abs() < 1e-3);
        assert!(car.travel_time() > car.target_time as f32);
    }

    #[test]
    fn test_stop_keys() {
        let mut round = round_6_9();
        round.update(1.0);
        assert!(round.handle_input(&InputEvent::KeyDown(Key::Char('l'))).is_none());
        assert!(!round.cars[1].moving);
        assert!(round.cars[0].moving);

        // Space stops the first car still moving
        let report = round.handle_input(&InputEvent::KeyDown(Key::Space));
        assert!(report.is_some());
        assert!(round.handle_input(&InputEvent::KeyDown(Key::Space)).is_none());
    }

    #[test]
    fn test_click_stops_car() {
        let mut round = round_6_9();
        round.update(0.5);
        round.handle_input(&InputEvent::Click(Target::Car(0)));
        assert_eq!(round.cars[0].stopped_time, Some(0.5));
        // Unknown lane is ignored
        assert!(round.handle_input(&InputEvent::Click(Target::Car(5))).is_none());
    }

    #[test]
    fn test_end_to_end_auto_stop() {
        let mut round = round_6_9();
        // Stop car 1 at 6.1s
        for _ in 0..61 {
            assert!(round.update(0.1).is_none());
        }
        assert!(round.handle_input(&InputEvent::KeyDown(Key::Char('a'))).is_none());

        // Car 2 runs to the end of its lane: 500 / (500 / 25.2) = 25.2s
        let mut reports = Vec::new();
        for _ in 0..400 {
            if let Some(r) = round.update(0.1) {
                reports.push(r);
            }
        }
        assert_eq!(reports.len(), 1);
        assert!(round.is_evaluated());

        let RoundOutcome::DualStop { targets, cars } = &reports[0].outcome else {
            panic!("unexpected outcome");
        };
        assert_eq!(*targets, [6, 9]);
        assert!((cars[0].stop_time - 6.1).abs() < 1e-3);
        assert_eq!(cars[0].score, 60);
        assert!(!cars[0].auto_stopped);
        assert!(cars[1].auto_stopped);
        assert!(cars[1].stop_time >= 25.2 - 1e-3);
        assert_eq!(cars[1].score, -10);
        assert_eq!(reports[0].score, 50);
        assert_eq!(round.cars[1].left_percent(), 95.0);
    }

    #[test]
    fn test_evaluation_latch() {
        let mut round = round_6_9();
        round.update(2.0);
        assert!(round.stop_car(0).is_none());
        assert!(round.stop_car(1).is_some());
        assert!(round.stop_car(1).is_none());
        assert!(round.update(1.0).is_none());
    }

    proptest! {
        #[test]
        fn targets_distinct_and_in_range(seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let round = Level2Round::new(&mut rng);
            let [a, b] = round.targets();
            prop_assert_ne!(a, b);
            for t in [a, b] {
                prop_assert!((LEVEL2_MIN_TARGET..=LEVEL2_MAX_TARGET).contains(&t));
            }
            for car in &round.cars {
                prop_assert!(car.travel_time() > car.target_time as f32 * 2.0);
            }
        }

        #[test]
        fn evaluates_once_in_any_stop_order(
            seed in any::<u64>(),
            stops in proptest::collection::vec((0usize..3, 0.0f32..2.0), 0..8),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut round = Level2Round::new(&mut rng);
            let mut fired = 0;
            for (lane, dt) in stops {
                fired += round.update(dt).is_some() as u32;
                fired += round.stop_car(lane).is_some() as u32;
            }
            for _ in 0..400 {
                fired += round.update(0.1).is_some() as u32;
            }
            prop_assert_eq!(fired, 1);
        }
    }
}
