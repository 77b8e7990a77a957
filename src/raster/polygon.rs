use embedded_graphics_core::{geometry::Point, pixelcolor::Rgb565};
use heapless::Vec;

use super::{line::draw_line, span_between};
use crate::window::PixelWindow;

/// Edge crossings kept per scanline by polygon fill.
pub const MAX_INTERSECTIONS: usize = 64;

pub(crate) async fn draw_polygon<W>(w: &mut W, vertices: &[Point], color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if vertices.len() < 3 {
        return Ok(());
    }
    for (i, &from) in vertices.iter().enumerate() {
        let to = vertices[(i + 1) % vertices.len()];
        draw_line(w, from, to, color).await?;
    }
    Ok(())
}

/// Where the edge `a`-`b` crosses row `y`, if it does.
///
/// Edges own their upper end and not their lower one, so a vertex shared by
/// two edges is counted once and horizontal edges never cross.
fn crossing(a: Point, b: Point, y: i32) -> Option<i32> {
    let crosses = (a.y <= y && b.y > y) || (b.y <= y && a.y > y);
    if !crosses {
        return None;
    }
    // products of two full-range i32 differences need more than 64 bits
    let (x1, y1) = (i128::from(a.x), i128::from(a.y));
    let (x2, y2) = (i128::from(b.x), i128::from(b.y));
    let x = if y1 == y2 {
        (x1 + x2) / 2
    } else {
        x1 + (i128::from(y) - y1) * (x2 - x1) / (y2 - y1)
    };
    Some(x.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32)
}

/// Even-odd scanline fill over the rows of the polygon's bounding box.
///
/// Returns the number of crossings dropped because a row had more than
/// [`MAX_INTERSECTIONS`] of them.
pub(crate) async fn fill_polygon<W>(w: &mut W, vertices: &[Point], color: Rgb565) -> Result<usize, W::Error>
where
    W: PixelWindow + ?Sized,
{
    if vertices.len() < 3 {
        return Ok(0);
    }
    let min_y = vertices.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = vertices.iter().map(|p| p.y).max().unwrap_or(0);
    if min_y >= max_y {
        return Ok(0);
    }

    let (_, height) = w.size();
    let first = min_y.max(0);
    let last = max_y.min(i32::from(height) - 1);

    let mut dropped = 0;
    let mut xs: Vec<i32, MAX_INTERSECTIONS> = Vec::new();
    for y in first..=last {
        xs.clear();
        for (i, &a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            if let Some(x) = crossing(a, b, y) {
                if xs.push(x).is_err() {
                    dropped += 1;
                }
            }
        }
        xs.sort_unstable();
        for pair in xs.chunks_exact(2) {
            span_between(w, pair[0], pair[1], y, color).await?;
        }
    }

    if dropped > 0 {
        warn!("polygon fill dropped {} crossings", dropped);
    }
    Ok(dropped)
}
