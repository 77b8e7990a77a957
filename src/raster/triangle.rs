use embedded_graphics_core::{geometry::Point, pixelcolor::Rgb565};

use super::{line::draw_line, span_between};
use crate::window::PixelWindow;

pub(crate) async fn draw_triangle<W>(w: &mut W, a: Point, b: Point, c: Point, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    draw_line(w, a, b, color).await?;
    draw_line(w, b, c, color).await?;
    draw_line(w, c, a, color).await
}

/// Scanline fill between the long edge and the two short ones.
///
/// Vertices are sorted by y. The upper part runs to the row above the middle
/// vertex (or to it when the lower edge is flat), the lower part from there to
/// the bottom. Edge positions are interpolated with truncating division; only
/// rows on screen are visited.
pub(crate) async fn fill_triangle<W>(w: &mut W, a: Point, b: Point, c: Point, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let mut v = [a, b, c];
    v.sort_unstable_by_key(|p| p.y);
    let [p0, p1, p2] = v.map(|p| (i128::from(p.x), i128::from(p.y)));

    if p0.1 == p2.1 {
        let lo = p0.0.min(p1.0).min(p2.0);
        let hi = p0.0.max(p1.0).max(p2.0);
        return row(w, lo, hi, p0.1, color).await;
    }

    let (_, height) = w.size();
    let bottom = i128::from(height) - 1;

    let (dx01, dy01) = (p1.0 - p0.0, p1.1 - p0.1);
    let (dx02, dy02) = (p2.0 - p0.0, p2.1 - p0.1);
    let (dx12, dy12) = (p2.0 - p1.0, p2.1 - p1.1);

    let last = if p1.1 == p2.1 { p1.1 } else { p1.1 - 1 };
    let mut y = p0.1.max(0);
    let (mut sa, mut sb) = (dx01 * (y - p0.1), dx02 * (y - p0.1));
    while y <= last.min(bottom) {
        let xa = p0.0 + sa / dy01;
        let xb = p0.0 + sb / dy02;
        sa += dx01;
        sb += dx02;
        row(w, xa, xb, y, color).await?;
        y += 1;
    }

    y = y.max(last + 1);
    let (mut sa, mut sb) = (dx12 * (y - p1.1), dx02 * (y - p0.1));
    while y <= p2.1.min(bottom) {
        let xa = p1.0 + sa / dy12;
        let xb = p0.0 + sb / dy02;
        sa += dx12;
        sb += dx02;
        row(w, xa, xb, y, color).await?;
        y += 1;
    }
    Ok(())
}

async fn row<W>(w: &mut W, x0: i128, x1: i128, y: i128, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let clamp = |v: i128| v.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32;
    span_between(w, clamp(x0), clamp(x1), clamp(y), color).await
}
