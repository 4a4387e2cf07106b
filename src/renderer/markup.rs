//! HTML for the DOM-based levels
//!
//! Levels 1 and 2 are plain elements inside `#game-area`; level 3 adds a
//! canvas. Markup is rebuilt once per round, then only positions and classes
//! change from frame to frame. Clickable elements carry `data-car` or
//! `data-option` so the page can map clicks back to [`Target`]s.
//!
//! [`Target`]: crate::sim::input::Target

use std::fmt::Write;

use crate::consts::MAX_ROUNDS_PER_LEVEL;
use crate::sim::level1::{Level1Phase, Level1Round};
use crate::sim::level2::Level2Round;
use crate::sim::state::{GameSession, LevelState};

/// Id of the level 3 canvas
pub const TRACK_CANVAS_ID: &str = "track-canvas";

pub fn car_id(index: usize) -> String {
    format!("car-{}", index)
}

pub fn option_id(index: usize) -> String {
    format!("option-{}", index)
}

pub fn level_title(level: u8) -> &'static str {
    match level {
        1 => "Level 1: Guess & Drive",
        2 => "Level 2: Dual Stop",
        _ => "Level 3: Lap & Obstacles",
    }
}

pub fn level_description(level: u8) -> &'static str {
    match level {
        1 => {
            "Pick how many seconds the drive takes, then double-click the car (or press Enter) \
             and drive it to the finish with the arrow keys."
        }
        2 => {
            "Two cars are driving. Stop each one as close as possible to its target time \
             (A / L keys, Space, or click the car)."
        }
        _ => {
            "Drive one lap of the closed track as fast as you can with the arrow keys or by \
             dragging the car. Stay on the road and avoid the obstacles; they vanish on a timer."
        }
    }
}

fn round_info(session: &GameSession) -> String {
    format!(
        "<p class=\"level-round-info\">Round {} of {}</p>",
        session.round.min(MAX_ROUNDS_PER_LEVEL),
        MAX_ROUNDS_PER_LEVEL
    )
}

fn track_open(out: &mut String, style: &str) {
    let _ = write!(
        out,
        "<div class=\"track\" style=\"{}\">\
         <div class=\"track-line\"></div>\
         <div class=\"track-start\"></div>\
         <div class=\"track-end\"></div>",
        style
    );
}

pub fn level1_markup(round: &Level1Round, session: &GameSession) -> String {
    let mut out = String::new();
    track_open(
        &mut out,
        &format!("width:{:.0}px;margin:10px auto", round.track.width),
    );
    let _ = write!(
        out,
        "<div id=\"{}\" class=\"car auto shadow\" data-car=\"0\" \
         title=\"Double-click to start driving\" style=\"left:{:.1}px\">L1</div></div>",
        car_id(0),
        round.track.start + round.car.offset
    );

    out.push_str("<div class=\"card\">");
    out.push_str(&round_info(session));
    let _ = write!(
        out,
        "<h3>Choose the driving time (seconds)</h3>\
         <p>Road length: <b>{} m</b>, car speed: <b>{} m/s</b></p>\
         <div id=\"time-options\" class=\"options\">",
        round.setup.distance, round.setup.speed
    );
    for (i, value) in round.setup.options.iter().enumerate() {
        let selected = if round.chosen == Some(i) { " selected" } else { "" };
        let _ = write!(
            out,
            "<button type=\"button\" id=\"{}\" class=\"btn secondary small{}\" \
             data-option=\"{}\">{} s</button>",
            option_id(i),
            selected,
            i,
            value
        );
    }
    let _ = write!(
        out,
        "</div><p id=\"level1-hint\" class=\"small\">{}</p></div>",
        level1_hint(round)
    );
    out
}

/// Hint line under the level 1 options
pub fn level1_hint(round: &Level1Round) -> &'static str {
    match round.phase {
        Level1Phase::Choice => "Pick an option (keys 1-5 work too), then start the car.",
        Level1Phase::Drive if !round.clock_started => {
            "Hold the Right arrow key to drive; Up accelerates, Down brakes."
        }
        Level1Phase::Drive => "Drive to the finish line!",
        Level1Phase::Finished => "Round over.",
    }
}

pub fn level2_markup(round: &Level2Round, session: &GameSession) -> String {
    let mut out = String::new();
    out.push_str("<div class=\"card\">");
    out.push_str(&round_info(session));
    out.push_str(
        "<h3>Round goal</h3><p>Stop each car as close as possible to its time:</p><ul class=\"small\">",
    );
    for (i, car) in round.cars.iter().enumerate() {
        let _ = write!(
            out,
            "<li><b>Car {} ({}):</b> {} s</li>",
            i + 1,
            lane_key(i),
            car.target_time
        );
    }
    out.push_str("</ul></div>");

    for (i, car) in round.cars.iter().enumerate() {
        track_open(&mut out, "");
        let moving = if car.moving { " moving" } else { "" };
        let _ = write!(
            out,
            "<div id=\"{}\" class=\"car auto{}\" data-car=\"{}\" style=\"left:{:.2}%\">L2-{}</div></div>",
            car_id(i),
            moving,
            i,
            car.left_percent(),
            i + 1
        );
    }
    out
}

/// Key that stops a lane's car
pub fn lane_key(index: usize) -> &'static str {
    match index {
        0 => "A",
        _ => "L",
    }
}

pub fn level3_markup(session: &GameSession) -> String {
    let mut out = String::new();
    out.push_str("<div class=\"card\">");
    out.push_str(&round_info(session));
    out.push_str(
        "<h3>Task</h3><p>Drive <b>one lap</b> of the closed track as fast as you can.</p>\
         <p class=\"small\">Controls: <b>arrow keys</b> or <b>drag with the mouse</b>. \
         Leaving the road costs points and ends the round.</p>\
         <p class=\"small\"><b>Obstacles</b> block the road and vanish after 1-5 s. \
         Touching one ends the round.</p></div>",
    );
    let _ = write!(
        out,
        "<canvas id=\"{}\" class=\"track-canvas\"></canvas>",
        TRACK_CANVAS_ID
    );
    out
}

/// Markup for whatever round is running
pub fn round_markup(state: &LevelState, session: &GameSession) -> String {
    match state {
        LevelState::Level1(round) => level1_markup(round, session),
        LevelState::Level2(round) => level2_markup(round, session),
        LevelState::Level3(_) => level3_markup(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level1::Level1Setup;
    use crate::sim::level2::Level2Car;

    fn level1() -> Level1Round {
        Level1Round::from_setup(Level1Setup {
            distance: 100,
            speed: 20,
            options: vec![3, 4, 5, 6, 7],
        })
    }

    #[test]
    fn test_level1_markup_lists_options() {
        let mut round = level1();
        assert!(round.select_option(2));
        let html = level1_markup(&round, &GameSession::new(1));
        assert!(html.contains("Round 1 of 3"));
        assert!(html.contains("<b>100 m</b>"));
        assert!(html.contains("<b>20 m/s</b>"));
        assert_eq!(html.matches("data-option=").count(), 5);
        assert!(html.contains("class=\"btn secondary small selected\" data-option=\"2\">5 s"));
        assert!(html.contains("data-car=\"0\""));
    }

    #[test]
    fn test_level1_hint_follows_phase() {
        let mut round = level1();
        assert!(level1_hint(&round).starts_with("Pick"));
        round.phase = Level1Phase::Drive;
        assert!(level1_hint(&round).contains("arrow key"));
        round.clock_started = true;
        assert_eq!(level1_hint(&round), "Drive to the finish line!");
    }

    #[test]
    fn test_level2_markup_has_both_lanes() {
        let round = Level2Round::from_cars([
            Level2Car::new(6, 400, 2.5),
            Level2Car::new(9, 500, 3.0),
        ]);
        let html = level2_markup(&round, &GameSession::new(2));
        assert!(html.contains("<b>Car 1 (A):</b> 6 s"));
        assert!(html.contains("<b>Car 2 (L):</b> 9 s"));
        assert!(html.contains("id=\"car-1\" class=\"car auto moving\" data-car=\"1\""));
        assert!(html.contains("left:5.00%"));
    }

    #[test]
    fn test_level3_markup_has_canvas() {
        let html = level3_markup(&GameSession::new(3));
        assert!(html.contains("id=\"track-canvas\""));
        assert!(level_title(3).starts_with("Level 3"));
    }
}
