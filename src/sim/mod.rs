//! Gameplay simulation
//!
//! All gameplay logic lives here, free of rendering and browser code:
//! - Time only enters through per-frame `dt` and countdown ticks
//! - Randomness only through a caller-supplied RNG
//! - Host services (frames, timers, prompts, storage) behind traits

pub mod countdown;
pub mod driver;
pub mod geometry;
pub mod input;
pub mod level1;
pub mod level2;
pub mod level3;
pub mod orchestrator;
pub mod state;
pub mod track;

pub use countdown::{CountdownTick, LevelCountdown};
pub use driver::{AnimationDriver, UpdateFn};
pub use input::{DirectionKeys, EventKind, InputEvent, Key, ListenerRegistry, Target, Teardown};
pub use level1::{Level1Phase, Level1Round, Level1Setup};
pub use level2::{CarResult, Level2Car, Level2Round};
pub use level3::{CanvasSize, Level3Round, Obstacle, is_car_on_road};
pub use orchestrator::{Game, GameConfig, GamePhase, settle_next_prompt, settle_prompts};
pub use state::{
    FailReason, GameEvent, GameSession, LevelState, LinearTrack, RoundOutcome, RoundReport,
    TrackCar,
};
pub use track::generate_closed_curve;
