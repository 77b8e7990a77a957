use embedded_graphics_core::{geometry::Point, pixelcolor::Rgb565};

use super::{offset, plot, span, span_between, Corner};
use crate::window::PixelWindow;

/// Midpoint circle steps for the octant from 12 o'clock towards 1:30.
///
/// Yields `(x, y, previous_y)` after each step; `previous_y != y` marks a
/// diagonal step. The last step may have `x > y`.
pub(crate) struct Octant {
    x: i32,
    y: i32,
    d: i32,
}

impl Octant {
    pub(crate) fn new(radius: u16) -> Self {
        let r = i32::from(radius);
        Self {
            x: 0,
            y: r,
            d: 3 - 2 * r,
        }
    }
}

impl Iterator for Octant {
    type Item = (i32, i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.x >= self.y {
            return None;
        }
        let previous_y = self.y;
        self.x += 1;
        if self.d < 0 {
            self.d += 4 * self.x + 6;
        } else {
            self.y -= 1;
            self.d += 4 * (self.x - self.y) + 10;
        }
        Some((self.x, self.y, previous_y))
    }
}

pub(crate) async fn draw_circle<W>(w: &mut W, center: Point, radius: u16, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    w.reset_staging();
    if radius == 0 {
        plot(w, center, color).await?;
        return w.flush(true).await;
    }

    let r = i32::from(radius);
    for (dx, dy) in [(0, r), (0, -r), (r, 0), (-r, 0)] {
        plot(w, offset(center, dx, dy), color).await?;
    }

    for (x, y, _) in Octant::new(radius) {
        if x > y {
            break;
        }
        for (sx, sy) in [(1, 1), (-1, 1), (1, -1), (-1, -1)] {
            plot(w, offset(center, sx * x, sy * y), color).await?;
            if x != y {
                plot(w, offset(center, sx * y, sy * x), color).await?;
            }
        }
    }
    w.flush(true).await
}

/// Fills a circle with pairs of horizontal spans mirrored around the centre row.
pub(crate) async fn fill_circle<W>(w: &mut W, center: Point, radius: u16, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if radius == 0 {
        w.reset_staging();
        plot(w, center, color).await?;
        return w.flush(true).await;
    }

    let r = i32::from(radius);
    let width = |half: i32| 2 * half as u32 + 1;
    span(w, offset(center, -r, 0), width(r), color).await?;

    for (x, y, previous_y) in Octant::new(radius) {
        if previous_y != y {
            span(w, offset(center, -x, previous_y), width(x), color).await?;
            span(w, offset(center, -x, -previous_y), width(x), color).await?;
        }
        span(w, offset(center, -y, x), width(y), color).await?;
        span(w, offset(center, -y, -x), width(y), color).await?;
    }
    Ok(())
}

/// Outline of the selected quadrants, all corners sharing one pass.
pub(crate) async fn draw_quarters<W>(
    w: &mut W,
    center: Point,
    radius: u16,
    corners: &[Corner],
    color: Rgb565,
) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if corners.is_empty() {
        return Ok(());
    }
    w.reset_staging();
    if radius == 0 {
        plot(w, center, color).await?;
        return w.flush(true).await;
    }

    let r = i32::from(radius);
    for (sx, sy) in corners.iter().map(|c| c.signs()) {
        plot(w, offset(center, sx * r, 0), color).await?;
        plot(w, offset(center, 0, sy * r), color).await?;
    }

    for (x, y, _) in Octant::new(radius) {
        if x > y {
            break;
        }
        for (sx, sy) in corners.iter().map(|c| c.signs()) {
            plot(w, offset(center, sx * x, sy * y), color).await?;
            if x != y {
                plot(w, offset(center, sx * y, sy * x), color).await?;
            }
        }
    }
    w.flush(true).await
}

/// Fills the selected quadrants, each reaching from the centre outwards.
pub(crate) async fn fill_quarters<W>(
    w: &mut W,
    center: Point,
    radius: u16,
    corners: &[Corner],
    color: Rgb565,
) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if corners.is_empty() {
        return Ok(());
    }
    let r = i32::from(radius);
    for (sx, sy) in corners.iter().map(|c| c.signs()) {
        // centre column and centre row of the quadrant
        let edge = offset(center, 0, sy * r);
        super::fill_area(w, center, edge, color).await?;
        side_span(w, center, 0, r, sx, color).await?;
    }

    for (x, y, previous_y) in Octant::new(radius) {
        for (sx, sy) in corners.iter().map(|c| c.signs()) {
            if previous_y != y {
                side_span(w, center, sy * previous_y, x, sx, color).await?;
            }
            side_span(w, center, sy * x, y, sx, color).await?;
        }
    }
    Ok(())
}

/// Span on row `center.y + dy` from the centre column `reach` pixels towards `sx`.
async fn side_span<W>(w: &mut W, center: Point, dy: i32, reach: i32, sx: i32, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let far = center.x.saturating_add(sx * reach);
    span_between(w, center.x, far, center.y.saturating_add(dy), color).await
}
