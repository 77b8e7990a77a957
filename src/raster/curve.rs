use embedded_graphics_core::{geometry::Point, pixelcolor::Rgb565};
use libm::{cosf, sinf};

use super::line::{draw_line, draw_points};
use crate::window::PixelWindow;

/// Drawn as a chain of chords through `segments` samples of the curve.
pub(crate) async fn draw_quad_bezier<W>(
    w: &mut W,
    p0: Point,
    p1: Point,
    p2: Point,
    segments: u16,
    color: Rgb565,
) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let segments = segments.max(1);
    let blend = |a: i32, b: i32, c: i32, t: f32| {
        let u = 1.0 - t;
        (u * u * a as f32 + 2.0 * u * t * b as f32 + t * t * c as f32) as i32
    };

    draw_points(w, &[p0], color).await?;
    let mut last = p0;
    for i in 1..=segments {
        let t = f32::from(i) / f32::from(segments);
        let next = Point::new(blend(p0.x, p1.x, p2.x, t), blend(p0.y, p1.y, p2.y, t));
        draw_line(w, last, next, color).await?;
        last = next;
    }
    Ok(())
}

/// Arc sampled every two degrees, at least once.
///
/// Both angles are reduced to `[0, 360)`; an end before the start wraps
/// around through 0.
pub(crate) async fn draw_arc<W>(
    w: &mut W,
    center: Point,
    radius: u16,
    start_deg: i32,
    end_deg: i32,
    color: Rgb565,
) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let start = start_deg.rem_euclid(360);
    let mut end = end_deg.rem_euclid(360);
    if end < start {
        end += 360;
    }
    let sweep = end - start;
    let segments = (sweep / 2).max(1);

    let r = f32::from(radius);
    let sample = |i: i32| {
        let degrees = start as f32 + (sweep * i) as f32 / segments as f32;
        let angle = degrees.to_radians();
        Point::new(
            center.x.saturating_add((r * cosf(angle)) as i32),
            center.y.saturating_add((r * sinf(angle)) as i32),
        )
    };

    let mut last = sample(0);
    draw_points(w, &[last], color).await?;
    for i in 1..=segments {
        let next = sample(i);
        draw_line(w, last, next, color).await?;
        last = next;
    }
    Ok(())
}
