//! Game page view: HUD labels, buttons and the round area

use wasm_bindgen::JsCast;
use web_sys::{HtmlButtonElement, HtmlCanvasElement};

use super::canvas::CanvasRenderer;
use super::markup::{self, TRACK_CANVAS_ID, car_id, option_id};
use super::scene::{self, Level3Scene};
use crate::platform::web::{element_by_id, html_element_by_id};
use crate::sim::{Game, GameEvent, GamePhase, LevelState};

const GAME_AREA_ID: &str = "game-area";

fn set_text(id: &str, text: &str) {
    if let Some(el) = element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

fn set_disabled(id: &str, disabled: bool) {
    if let Some(btn) = element_by_id(id).and_then(|el| el.dyn_into::<HtmlButtonElement>().ok()) {
        btn.set_disabled(disabled);
    }
}

fn set_left(id: &str, value: String) {
    if let Some(el) = html_element_by_id(id) {
        let _ = el.style().set_property("left", &value);
    }
}

fn toggle_class(id: &str, class: &str, on: bool) {
    if let Some(el) = element_by_id(id) {
        let _ = el.class_list().toggle_with_force(class, on);
    }
}

#[derive(Default)]
pub struct DomView {
    canvas: Option<CanvasRenderer>,
}

impl DomView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one game notification to the page
    pub fn apply(&mut self, game: &Game, event: &GameEvent) {
        match event {
            GameEvent::LevelStarted { level, .. } => {
                set_text("level-title", markup::level_title(*level));
                set_text("level-description", markup::level_description(*level));
                set_text("level-label", &scene::level_label(game.session()));
            }
            GameEvent::RoundStarted { .. } => self.rebuild_round(game),
            GameEvent::ScoreChanged(score) => set_text("score-label", &score.to_string()),
            GameEvent::CountdownChanged(left) => set_text("timer-label", &left.to_string()),
            GameEvent::LevelFinished { .. } | GameEvent::GameFinished { .. } => {}
            GameEvent::Navigate(_) => {}
        }
        self.sync_buttons(game);
    }

    pub fn set_player(&self, name: &str) {
        set_text("player-label", &format!("Player: {}", name));
    }

    pub fn sync_buttons(&self, game: &Game) {
        set_disabled("btn-next-level", !game.can_advance());
        set_disabled("btn-restart-level", !game.can_restart());
        set_disabled("btn-end-level", game.phase() != GamePhase::Playing);
    }

    /// Replace the round area with the markup of the new round
    fn rebuild_round(&mut self, game: &Game) {
        let Some(state) = game.level_state() else {
            return;
        };
        set_text("round-label", &scene::round_label(game.session()));
        if let Some(area) = element_by_id(GAME_AREA_ID) {
            area.set_inner_html(&markup::round_markup(state, game.session()));
        }

        self.canvas = match state {
            LevelState::Level3(round) => element_by_id(TRACK_CANVAS_ID)
                .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
                .and_then(|canvas| match CanvasRenderer::new(canvas) {
                    Ok(renderer) => Some(renderer),
                    Err(err) => {
                        log::error!("Canvas setup failed: {:?}", err);
                        None
                    }
                })
                .inspect(|renderer| renderer.resize(round.canvas)),
            _ => None,
        };
        self.refresh(game);
    }

    /// The level 3 canvas, if the running round has one
    pub fn track_canvas(&self) -> Option<&HtmlCanvasElement> {
        self.canvas.as_ref().map(|r| r.canvas())
    }

    /// Redraw the moving parts of the running round
    pub fn refresh(&self, game: &Game) {
        match game.level_state() {
            Some(LevelState::Level1(round)) => {
                set_left(
                    &car_id(0),
                    format!("{:.1}px", scene::level1_car_left(round)),
                );
                for i in 0..round.setup.options.len() {
                    toggle_class(&option_id(i), "selected", round.chosen == Some(i));
                }
                set_text("level1-hint", markup::level1_hint(round));
            }
            Some(LevelState::Level2(round)) => {
                for (i, car) in round.cars.iter().enumerate() {
                    set_left(&car_id(i), format!("{:.2}%", car.left_percent()));
                    toggle_class(&car_id(i), "moving", car.moving);
                }
            }
            Some(LevelState::Level3(round)) => {
                if let Some(renderer) = &self.canvas {
                    if let Err(err) = renderer.draw(&Level3Scene::new(round)) {
                        log::error!("Draw failed: {:?}", err);
                    }
                }
            }
            None => {}
        }
    }
}
