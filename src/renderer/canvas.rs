//! Level 3 drawing on a 2D canvas

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::scene::*;
use crate::sim::level3::CanvasSize;

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Match the backing store to the level's canvas size
    pub fn resize(&self, size: CanvasSize) {
        let (w, h) = (size.width as u32, size.height as u32);
        if self.canvas.width() != w || self.canvas.height() != h {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
            log::debug!("Canvas resized to {}x{}", w, h);
        }
    }

    pub fn draw(&self, scene: &Level3Scene) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.clear_rect(0.0, 0.0, scene.width as f64, scene.height as f64);

        self.draw_road(scene)?;
        for sprite in &scene.obstacles {
            self.draw_obstacle(sprite)?;
        }

        // Start mark
        ctx.begin_path();
        ctx.arc(
            scene.start.x as f64,
            scene.start.y as f64,
            START_MARK_RADIUS as f64,
            0.0,
            std::f64::consts::TAU,
        )?;
        ctx.set_fill_style_str(&css_color(START_COLOR));
        ctx.fill();

        // Car
        ctx.begin_path();
        ctx.arc(
            scene.car.x as f64,
            scene.car.y as f64,
            scene.car_radius as f64,
            0.0,
            std::f64::consts::TAU,
        )?;
        ctx.set_fill_style_str(&css_color(CAR_COLOR));
        ctx.fill();
        ctx.set_stroke_style_str("#fff");
        ctx.set_line_width(2.0);
        ctx.stroke();

        // HUD
        ctx.set_fill_style_str(&css_color(HUD_BACKGROUND));
        ctx.fill_rect(10.0, 10.0, 180.0, 30.0);
        ctx.set_fill_style_str("#fff");
        ctx.set_font("16px sans-serif");
        ctx.set_text_align("left");
        ctx.fill_text(&scene.hud, 20.0, 31.0)?;
        Ok(())
    }

    fn trace_road(&self, scene: &Level3Scene) {
        let ctx = &self.ctx;
        ctx.begin_path();
        let mut points = scene.road.iter();
        if let Some(first) = points.next() {
            ctx.move_to(first.x as f64, first.y as f64);
            for p in points {
                ctx.line_to(p.x as f64, p.y as f64);
            }
            ctx.close_path();
        }
    }

    fn draw_road(&self, scene: &Level3Scene) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.set_line_join("round");
        ctx.set_line_cap("round");

        self.trace_road(scene);
        ctx.set_stroke_style_str(&css_color(ROAD_EDGE_COLOR));
        ctx.set_line_width((scene.road_width + ROAD_EDGE_EXTRA) as f64);
        ctx.stroke();

        ctx.set_stroke_style_str(&css_color(ROAD_COLOR));
        ctx.set_line_width(scene.road_width as f64);
        ctx.stroke();

        let dash = js_sys::Array::of2(&JsValue::from_f64(14.0), &JsValue::from_f64(12.0));
        ctx.set_line_dash(&dash)?;
        ctx.set_stroke_style_str(&css_color(CENTER_LINE_COLOR));
        ctx.set_line_width(CENTER_LINE_WIDTH as f64);
        ctx.stroke();
        ctx.set_line_dash(&js_sys::Array::new())?;
        Ok(())
    }

    fn draw_obstacle(&self, sprite: &ObstacleSprite) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let (len, th) = (sprite.length as f64, sprite.thickness as f64);
        let glow = OBSTACLE_GLOW as f64;

        ctx.save();
        ctx.translate(sprite.center.x as f64, sprite.center.y as f64)?;
        ctx.rotate(sprite.angle as f64)?;
        ctx.set_global_alpha(sprite.fade as f64);

        let [r, g, b, _] = OBSTACLE_COLOR;
        ctx.set_fill_style_str(&css_color([r, g, b, 0.25]));
        ctx.fill_rect(-len / 2.0 - glow, -th / 2.0 - glow, len + 2.0 * glow, th + 2.0 * glow);
        ctx.set_fill_style_str(&css_color(OBSTACLE_COLOR));
        ctx.fill_rect(-len / 2.0, -th / 2.0, len, th);
        ctx.restore();

        // Remaining life, unrotated
        let bar_w = TTL_BAR_WIDTH as f64;
        let bar_h = TTL_BAR_HEIGHT as f64;
        let x = sprite.center.x as f64 - bar_w / 2.0;
        let y = sprite.center.y as f64 + th / 2.0 + glow + 4.0;
        ctx.set_global_alpha(sprite.fade as f64);
        ctx.set_fill_style_str(&css_color(HUD_BACKGROUND));
        ctx.fill_rect(x, y, bar_w, bar_h);
        ctx.set_fill_style_str(&css_color(OBSTACLE_COLOR));
        ctx.fill_rect(x, y, bar_w * sprite.ttl_ratio as f64, bar_h);
        ctx.set_fill_style_str("#fff");
        ctx.set_font("11px sans-serif");
        ctx.set_text_align("center");
        ctx.fill_text(&sprite.label, sprite.center.x as f64, y + bar_h + 12.0)?;
        ctx.set_global_alpha(1.0);
        Ok(())
    }
}
