//! Procedural closed-loop track for level 3
//!
//! Randomized control points around a centre, an affine skew for asymmetry,
//! Catmull-Rom interpolation through them, then a fit into the canvas.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use super::geometry::catmull_rom;
use crate::{random_float, random_int};

/// Gap kept between the fitted curve and the canvas edges
pub const CURVE_FIT_MARGIN: f32 = 38.0;
/// Minimum samples per spline segment
pub const MIN_SAMPLES_PER_SEGMENT: usize = 10;

const MIN_CONTROL_POINTS: i32 = 9;
const MAX_CONTROL_POINTS: i32 = 15;

/// Generate an ordered sequence of points approximating a smooth closed loop
///
/// The first point is the start/finish of the lap. The result is centred on
/// `center` and scaled (aspect preserved) to fit `canvas_width x canvas_height`
/// minus [`CURVE_FIT_MARGIN`] on every side.
pub fn generate_closed_curve<R: Rng + ?Sized>(
    rng: &mut R,
    center: Vec2,
    base_radius: f32,
    wildness: f32,
    sample_count: usize,
    canvas_width: f32,
    canvas_height: f32,
) -> Vec<Vec2> {
    let ctrl_count = random_int(rng, MIN_CONTROL_POINTS, MAX_CONTROL_POINTS) as usize;

    // Random affine transform: independent scale, shear and a small offset
    let sx = random_float(rng, 0.65, 1.6);
    let sy = random_float(rng, 0.65, 1.6);
    let shx = random_float(rng, -0.5, 0.5);
    let shy = random_float(rng, -0.5, 0.5);
    let ox = random_float(rng, -base_radius * 0.22, base_radius * 0.22);
    let oy = random_float(rng, -base_radius * 0.22, base_radius * 0.22);

    let slot = TAU / ctrl_count as f32;
    let ctrl: Vec<Vec2> = (0..ctrl_count)
        .map(|i| {
            let angle = i as f32 * slot + random_float(rng, -1.0, 1.0) * slot * 0.65;
            let r = base_radius * (0.45 + rng.random::<f32>() * 1.25 * wildness);
            let x = r * angle.cos();
            let y = r * angle.sin();
            Vec2::new(x * sx + y * shx + ox, y * sy + x * shy + oy)
        })
        .collect();

    let per_segment = (sample_count / ctrl_count).max(MIN_SAMPLES_PER_SEGMENT);
    let mut points = Vec::with_capacity(per_segment * ctrl_count);
    for i in 0..ctrl_count {
        let p0 = ctrl[(i + ctrl_count - 1) % ctrl_count];
        let p1 = ctrl[i];
        let p2 = ctrl[(i + 1) % ctrl_count];
        let p3 = ctrl[(i + 2) % ctrl_count];
        for j in 0..per_segment {
            let t = j as f32 / per_segment as f32;
            points.push(catmull_rom(p0, p1, p2, p3, t));
        }
    }

    fit_to_canvas(&mut points, center, canvas_width, canvas_height);
    log::debug!(
        "Generated track: {} control points, {} samples",
        ctrl_count,
        points.len()
    );
    points
}

/// Rescale and recenter points in place so their bounding box fits the canvas
fn fit_to_canvas(points: &mut [Vec2], center: Vec2, canvas_width: f32, canvas_height: f32) {
    let (min, max) = bounds(points);
    let size = max - min;
    if size.x <= 0.0 || size.y <= 0.0 {
        return;
    }

    let available_w = canvas_width - 2.0 * CURVE_FIT_MARGIN;
    let available_h = canvas_height - 2.0 * CURVE_FIT_MARGIN;
    let scale = (available_w / size.x).min(available_h / size.y);
    let mid = min + size / 2.0;

    for p in points.iter_mut() {
        *p = center + (*p - mid) * scale;
    }
}

/// Axis-aligned bounding box (min, max) of a point set
pub fn bounds(points: &[Vec2]) -> (Vec2, Vec2) {
    points.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    )
}
