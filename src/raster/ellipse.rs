use embedded_graphics_core::{geometry::Point, pixelcolor::Rgb565};

use super::{offset, plot, span};
use crate::window::PixelWindow;

/// Radii beyond this are clamped so the decision terms fit in an `i64`.
pub const MAX_ELLIPSE_RADIUS: u16 = 0x3FFF;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Region {
    /// Slope shallower than -1, stepping in x.
    Upper,
    /// Slope steeper than -1, stepping in y.
    Lower,
    /// Remainder of the zero row on very flat ellipses.
    Tip,
}

/// Midpoint ellipse steps over one quadrant, from `(0, ry)` to `(rx, 0)`.
///
/// Points are yielded with `x` non-decreasing and `y` non-increasing; the
/// decision variable is kept at four times its value to stay integral.
struct Quadrant {
    a2: i64,
    b2: i64,
    rx: i64,
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
    p: i64,
    last_x: i64,
    region: Region,
}

impl Quadrant {
    fn new(radius_x: u16, radius_y: u16) -> Self {
        let rx = i64::from(radius_x.min(MAX_ELLIPSE_RADIUS));
        let ry = i64::from(radius_y.min(MAX_ELLIPSE_RADIUS));
        let (a2, b2) = (rx * rx, ry * ry);
        Self {
            a2,
            b2,
            rx,
            x: 0,
            y: ry,
            dx: 0,
            dy: 2 * a2 * ry,
            p: 4 * b2 - 4 * a2 * ry + a2,
            last_x: 0,
            region: Region::Upper,
        }
    }
}

impl Iterator for Quadrant {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        let (a2, b2) = (self.a2, self.b2);
        if self.region == Region::Upper {
            if self.dx < self.dy {
                let point = (self.x, self.y);
                self.x += 1;
                self.dx += 2 * b2;
                if self.p < 0 {
                    self.p += 4 * (self.dx + b2);
                } else {
                    self.y -= 1;
                    self.dy -= 2 * a2;
                    self.p += 4 * (self.dx - self.dy + b2);
                }
                return Some(narrow(point));
            }
            self.region = Region::Lower;
            self.p = b2 * (2 * self.x + 1).pow(2) + 4 * a2 * (self.y - 1).pow(2) - 4 * a2 * b2;
        }

        if self.region == Region::Lower {
            if self.y >= 0 {
                let point = (self.x, self.y);
                self.last_x = self.x;
                self.y -= 1;
                self.dy -= 2 * a2;
                if self.p > 0 {
                    self.p += 4 * (a2 - self.dy);
                } else {
                    self.x += 1;
                    self.dx += 2 * b2;
                    self.p += 4 * (self.dx - self.dy + a2);
                }
                return Some(narrow(point));
            }
            self.region = Region::Tip;
        }

        if self.last_x < self.rx {
            self.last_x += 1;
            return Some(narrow((self.last_x, 0)));
        }
        None
    }
}

fn narrow((x, y): (i64, i64)) -> (i32, i32) {
    // both bounded by MAX_ELLIPSE_RADIUS
    (x as i32, y as i32)
}

pub(crate) async fn draw_ellipse<W>(
    w: &mut W,
    center: Point,
    radius_x: u16,
    radius_y: u16,
    color: Rgb565,
) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if radius_x == 0 || radius_y == 0 {
        return Ok(());
    }

    w.reset_staging();
    for (x, y) in Quadrant::new(radius_x, radius_y) {
        plot(w, offset(center, x, y), color).await?;
        if x != 0 {
            plot(w, offset(center, -x, y), color).await?;
        }
        if y != 0 {
            plot(w, offset(center, x, -y), color).await?;
            if x != 0 {
                plot(w, offset(center, -x, -y), color).await?;
            }
        }
    }
    w.flush(true).await
}

/// Fills an ellipse with one span per row, mirrored around the centre row.
///
/// A row is emitted once the quadrant walk leaves it, at which point `x` is
/// the widest the row gets.
pub(crate) async fn fill_ellipse<W>(
    w: &mut W,
    center: Point,
    radius_x: u16,
    radius_y: u16,
    color: Rgb565,
) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if radius_x == 0 || radius_y == 0 {
        return Ok(());
    }

    let mut steps = Quadrant::new(radius_x, radius_y).peekable();
    while let Some((x, y)) = steps.next() {
        if matches!(steps.peek(), Some(&(_, next_y)) if next_y == y) {
            continue;
        }
        let width = 2 * x as u32 + 1;
        span(w, offset(center, -x, y), width, color).await?;
        if y != 0 {
            span(w, offset(center, -x, -y), width, color).await?;
        }
    }
    Ok(())
}
