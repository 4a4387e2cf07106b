//! Rendering
//!
//! `scene` and `markup` derive what to draw from game state and run
//! anywhere. `canvas` and `dom` put it on the page and exist only on wasm.

pub mod markup;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub mod canvas;
#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use scene::{Level3Scene, ObstacleSprite};
