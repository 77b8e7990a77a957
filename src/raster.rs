//! Shape rasterization on top of [`PixelWindow`].
//!
//! Every primitive lowers to window selections and pixel streams. Filled
//! shapes are emitted as horizontal spans, one window each; outlines that
//! have no contiguous runs are emitted point by point.
//!
//! Coordinates are signed. Anything outside the visible area is clipped, so
//! shapes may extend past the screen edges.

use embedded_graphics_core::{
    geometry::{Point, Size},
    pixelcolor::Rgb565,
};

use crate::window::PixelWindow;

mod circle;
mod curve;
mod ellipse;
mod line;
mod polygon;
mod rect;
mod triangle;

pub use ellipse::MAX_ELLIPSE_RADIUS;
pub use polygon::MAX_INTERSECTIONS;

/// One quadrant of a circle, named after the corner of a rectangle it rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Direction of the quadrant, screen y pointing down.
    pub(crate) const fn signs(self) -> (i32, i32) {
        match self {
            Corner::TopLeft => (-1, -1),
            Corner::TopRight => (1, -1),
            Corner::BottomRight => (1, 1),
            Corner::BottomLeft => (-1, 1),
        }
    }
}

/// Drawing primitives for every [`PixelWindow`].
pub trait RasterExt: PixelWindow {
    /// Draws a single pixel.
    async fn draw_point(&mut self, point: Point, color: Rgb565) -> Result<(), Self::Error> {
        line::draw_points(self, &[point], color).await
    }

    /// Draws a set of unconnected pixels, each through its own one-pixel
    /// window. Points outside the visible area are skipped.
    async fn draw_points(&mut self, points: &[Point], color: Rgb565) -> Result<(), Self::Error> {
        line::draw_points(self, points, color).await
    }

    /// Draws `length` pixels to the right of `start`.
    async fn draw_hline(&mut self, start: Point, length: u32, color: Rgb565) -> Result<(), Self::Error> {
        line::draw_hline(self, start, length, color).await
    }

    /// Draws `length` pixels downwards from `start`.
    async fn draw_vline(&mut self, start: Point, length: u32, color: Rgb565) -> Result<(), Self::Error> {
        line::draw_vline(self, start, length, color).await
    }

    /// Draws a line including both end points.
    async fn draw_line(&mut self, from: Point, to: Point, color: Rgb565) -> Result<(), Self::Error> {
        line::draw_line(self, from, to, color).await
    }

    /// Draws the border of the rectangle spanned by two opposite corners.
    async fn draw_rect(&mut self, a: Point, b: Point, color: Rgb565) -> Result<(), Self::Error> {
        rect::draw_rect(self, a, b, color).await
    }

    /// Fills the rectangle spanned by two opposite corners, both inclusive.
    async fn fill_rect(&mut self, a: Point, b: Point, color: Rgb565) -> Result<(), Self::Error> {
        rect::fill_rect(self, a, b, color).await
    }

    /// Fills the whole visible area.
    async fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        rect::clear(self, color).await
    }

    async fn draw_circle(&mut self, center: Point, radius: u16, color: Rgb565) -> Result<(), Self::Error> {
        circle::draw_circle(self, center, radius, color).await
    }

    async fn fill_circle(&mut self, center: Point, radius: u16, color: Rgb565) -> Result<(), Self::Error> {
        circle::fill_circle(self, center, radius, color).await
    }

    /// Draws the outline of the selected quadrants of a circle.
    async fn draw_quarter_circle(
        &mut self,
        center: Point,
        radius: u16,
        corners: &[Corner],
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        circle::draw_quarters(self, center, radius, corners, color).await
    }

    /// Fills the selected quadrants of a circle.
    async fn fill_quarter_circle(
        &mut self,
        center: Point,
        radius: u16,
        corners: &[Corner],
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        circle::fill_quarters(self, center, radius, corners, color).await
    }

    /// Draws a rectangle with rounded corners.
    ///
    /// `radius` is clamped to half the shorter side.
    async fn draw_round_rect(
        &mut self,
        top_left: Point,
        size: Size,
        radius: u16,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        rect::draw_round_rect(self, top_left, size, radius, color).await
    }

    /// Fills a rectangle with rounded corners.
    ///
    /// `radius` is clamped to half the shorter side.
    async fn fill_round_rect(
        &mut self,
        top_left: Point,
        size: Size,
        radius: u16,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        rect::fill_round_rect(self, top_left, size, radius, color).await
    }

    async fn draw_triangle(&mut self, a: Point, b: Point, c: Point, color: Rgb565) -> Result<(), Self::Error> {
        triangle::draw_triangle(self, a, b, c, color).await
    }

    async fn fill_triangle(&mut self, a: Point, b: Point, c: Point, color: Rgb565) -> Result<(), Self::Error> {
        triangle::fill_triangle(self, a, b, c, color).await
    }

    /// Draws an axis-aligned ellipse. A zero radius draws nothing.
    ///
    /// Radii above [`MAX_ELLIPSE_RADIUS`] are clamped to it, which changes the
    /// shape that is drawn.
    async fn draw_ellipse(
        &mut self,
        center: Point,
        radius_x: u16,
        radius_y: u16,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        ellipse::draw_ellipse(self, center, radius_x, radius_y, color).await
    }

    /// Fills an axis-aligned ellipse. A zero radius draws nothing.
    ///
    /// Radii above [`MAX_ELLIPSE_RADIUS`] are clamped to it, which changes the
    /// shape that is drawn.
    async fn fill_ellipse(
        &mut self,
        center: Point,
        radius_x: u16,
        radius_y: u16,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        ellipse::fill_ellipse(self, center, radius_x, radius_y, color).await
    }

    /// Draws a quadratic Bézier curve from `p0` to `p2` with control point `p1`
    /// as `segments` chords.
    async fn draw_quad_bezier(
        &mut self,
        p0: Point,
        p1: Point,
        p2: Point,
        segments: u16,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        curve::draw_quad_bezier(self, p0, p1, p2, segments, color).await
    }

    /// Draws a closed polygon outline. Fewer than three vertices draw nothing.
    async fn draw_polygon(&mut self, vertices: &[Point], color: Rgb565) -> Result<(), Self::Error> {
        polygon::draw_polygon(self, vertices, color).await
    }

    /// Fills a simple polygon with a scanline sweep.
    ///
    /// At most [`MAX_INTERSECTIONS`] edge crossings are kept per scanline.
    /// Returns the number of crossings that had to be dropped, which is zero
    /// for any polygon with fewer edges than that.
    async fn fill_polygon(&mut self, vertices: &[Point], color: Rgb565) -> Result<usize, Self::Error> {
        polygon::fill_polygon(self, vertices, color).await
    }

    /// Draws a circular arc clockwise from `start_deg` to `end_deg`.
    ///
    /// Angles are in degrees, 0 pointing right and 90 pointing down.
    async fn draw_arc(
        &mut self,
        center: Point,
        radius: u16,
        start_deg: i32,
        end_deg: i32,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        curve::draw_arc(self, center, radius, start_deg, end_deg, color).await
    }
}

impl<W: PixelWindow + ?Sized> RasterExt for W {}

/// `center` moved by `(dx, dy)`.
pub(crate) fn offset(center: Point, dx: i32, dy: i32) -> Point {
    Point::new(center.x.saturating_add(dx), center.y.saturating_add(dy))
}

/// Last coordinate of a run of `length` pixels starting at `start`.
pub(crate) fn run_end(start: i32, length: u32) -> i32 {
    let length = i32::try_from(length).unwrap_or(i32::MAX);
    start.saturating_add(length - 1)
}

fn clip_point(size: (u16, u16), point: Point) -> Option<(u16, u16)> {
    let x = u16::try_from(point.x).ok().filter(|x| *x < size.0)?;
    let y = u16::try_from(point.y).ok().filter(|y| *y < size.1)?;
    Some((x, y))
}

/// Intersects `[lo, hi]` with `[0, limit)`.
fn clip_range(lo: i32, hi: i32, limit: u16) -> Option<(u16, u16)> {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if limit == 0 || hi < 0 || lo >= i32::from(limit) {
        return None;
    }
    let lo = lo.max(0) as u16;
    let hi = hi.min(i32::from(limit) - 1) as u16;
    Some((lo, hi))
}

/// Fills the area between two corners, both inclusive, after clipping it.
pub(crate) async fn fill_area<W>(w: &mut W, a: Point, b: Point, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let (width, height) = w.size();
    let (Some((x0, x1)), Some((y0, y1))) = (clip_range(a.x, b.x, width), clip_range(a.y, b.y, height))
    else {
        return Ok(());
    };

    w.reset_staging();
    w.set_window(x0, y0, x1, y1).await?;
    let count = (u32::from(x1 - x0) + 1) * (u32::from(y1 - y0) + 1);
    w.stream_repeat(color, count).await?;
    w.flush(true).await
}

/// Horizontal run of `length` pixels, a no-op for zero length.
pub(crate) async fn span<W>(w: &mut W, start: Point, length: u32, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if length == 0 {
        return Ok(());
    }
    let end = Point::new(run_end(start.x, length), start.y);
    fill_area(w, start, end, color).await
}

/// Horizontal run between two columns, both inclusive, in either order.
pub(crate) async fn span_between<W>(w: &mut W, x0: i32, x1: i32, y: i32, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    fill_area(w, Point::new(x0, y), Point::new(x1, y), color).await
}

/// Selects a one-pixel window for a visible point and stages its colour.
///
/// Callers reset the staging buffer before their first point and flush after the last.
pub(crate) async fn plot<W>(w: &mut W, point: Point, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    if let Some((x, y)) = clip_point(w.size(), point) {
        w.set_window(x, y, x, y).await?;
        w.stream_pixel(color).await?;
    }
    Ok(())
}
