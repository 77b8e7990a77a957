use embedded_graphics_core::{geometry::Point, pixelcolor::Rgb565};

use super::{fill_area, plot, run_end, span};
use crate::window::PixelWindow;

pub(crate) async fn draw_points<W>(w: &mut W, points: &[Point], color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    w.reset_staging();
    for &point in points {
        plot(w, point, color).await?;
    }
    w.flush(true).await
}

pub(crate) async fn draw_hline<W>(w: &mut W, start: Point, length: u32, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    span(w, start, length, color).await
}

pub(crate) async fn draw_vline<W>(w: &mut W, start: Point, length: u32, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if length == 0 {
        return Ok(());
    }
    let end = Point::new(start.x, run_end(start.y, length));
    fill_area(w, start, end, color).await
}

/// Bresenham line.
///
/// Axis-aligned lines become a single window; anything else is plotted one
/// pixel per step along the major axis.
pub(crate) async fn draw_line<W>(w: &mut W, from: Point, to: Point, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if from.x == to.x || from.y == to.y {
        return fill_area(w, from, to, color).await;
    }

    let dx = (i64::from(to.x) - i64::from(from.x)).abs();
    let dy = (i64::from(to.y) - i64::from(from.y)).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let (mut x, mut y) = (from.x, from.y);

    w.reset_staging();
    if dx > dy {
        let mut err = dx / 2;
        while x != to.x {
            plot(w, Point::new(x, y), color).await?;
            err -= dy;
            if err < 0 {
                y += sy;
                err += dx;
            }
            x += sx;
        }
    } else {
        let mut err = dy / 2;
        while y != to.y {
            plot(w, Point::new(x, y), color).await?;
            err -= dx;
            if err < 0 {
                x += sx;
                err += dy;
            }
            y += sy;
        }
    }
    plot(w, to, color).await?;
    w.flush(true).await
}
