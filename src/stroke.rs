use image::Rgba;

use crate::{pointer::Point, surface::OverlaySurface};

/// Fully opaque ink. Under `DestinationOut` it drives every covered pixel to alpha 0.
pub const ERASER_INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Brush for erasure strokes. Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
}

impl StrokeStyle {
    pub fn new(width: f32) -> Self {
        Self { width }
    }

    fn radius(&self) -> f32 {
        self.width / 2.0
    }
}

pub struct StrokeRenderer {
    style: StrokeStyle,
}

impl StrokeRenderer {
    pub fn new(style: StrokeStyle) -> Self {
        Self { style }
    }

    /// Paints one segment with the surface's current composite mode.
    ///
    /// A pixel is covered when its center lies within half the stroke width of the segment,
    /// which yields round caps and, across consecutive segments, round joins.
    pub fn paint_segment(&self, surface: &mut OverlaySurface, from: Point, to: Point) {
        let covered = segment_coverage(from, to, self.style.radius(), surface.dimensions());
        surface.paint_pixels(covered, ERASER_INK);
    }
}

fn segment_coverage(
    from: Point,
    to: Point,
    radius: f32,
    (width, height): (u32, u32),
) -> impl Iterator<Item = (u32, u32)> {
    let clamp_x = |v: f32| v.floor().clamp(0.0, width as f32) as u32;
    let clamp_y = |v: f32| v.floor().clamp(0.0, height as f32) as u32;
    let x_range = clamp_x(from.x.min(to.x) - radius)..clamp_x(from.x.max(to.x) + radius + 1.0);
    let y_range = clamp_y(from.y.min(to.y) - radius)..clamp_y(from.y.max(to.y) + radius + 1.0);
    let radius_sq = radius * radius;

    y_range.flat_map(move |y| {
        x_range.clone().filter_map(move |x| {
            let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            (distance_sq_to_segment(center, from, to) <= radius_sq).then_some((x, y))
        })
    })
}

fn distance_sq_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0)
    };
    let dx = ap.x - ab.x * t;
    let dy = ap.y - ab.y * t;
    dx * dx + dy * dy
}
