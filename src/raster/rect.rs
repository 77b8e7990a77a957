use embedded_graphics_core::{
    geometry::{Point, Size},
    pixelcolor::Rgb565,
};

use super::{circle, fill_area, offset, run_end, span, Corner};
use crate::window::PixelWindow;

pub(crate) async fn draw_rect<W>(w: &mut W, a: Point, b: Point, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
    let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));

    fill_area(w, Point::new(x0, y0), Point::new(x1, y0), color).await?;
    fill_area(w, Point::new(x0, y1), Point::new(x1, y1), color).await?;
    fill_area(w, Point::new(x0, y0), Point::new(x0, y1), color).await?;
    fill_area(w, Point::new(x1, y0), Point::new(x1, y1), color).await
}

pub(crate) async fn fill_rect<W>(w: &mut W, a: Point, b: Point, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    fill_area(w, a, b, color).await
}

pub(crate) async fn clear<W>(w: &mut W, color: Rgb565) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let (width, height) = w.size();
    let far = Point::new(i32::from(width) - 1, i32::from(height) - 1);
    fill_area(w, Point::zero(), far, color).await
}

/// Corner geometry of a rounded rectangle.
struct Rounded {
    top_left: Point,
    bottom_right: Point,
    radius: u16,
}

impl Rounded {
    fn new(top_left: Point, size: Size, radius: u16) -> Option<Self> {
        if size.width == 0 || size.height == 0 {
            return None;
        }
        let max_radius = (size.width.min(size.height) / 2).min(u32::from(u16::MAX));
        Some(Self {
            top_left,
            bottom_right: Point::new(
                run_end(top_left.x, size.width),
                run_end(top_left.y, size.height),
            ),
            radius: radius.min(max_radius as u16),
        })
    }

    fn r(&self) -> i32 {
        i32::from(self.radius)
    }

    /// Centre of the quarter circle rounding `corner`.
    fn center(&self, corner: Corner) -> Point {
        let r = self.r();
        match corner {
            Corner::TopLeft => offset(self.top_left, r, r),
            Corner::TopRight => offset(Point::new(self.bottom_right.x, self.top_left.y), -r, r),
            Corner::BottomRight => offset(self.bottom_right, -r, -r),
            Corner::BottomLeft => offset(Point::new(self.top_left.x, self.bottom_right.y), r, -r),
        }
    }
}

pub(crate) async fn draw_round_rect<W>(
    w: &mut W,
    top_left: Point,
    size: Size,
    radius: u16,
    color: Rgb565,
) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let Some(rect) = Rounded::new(top_left, size, radius) else {
        return Ok(());
    };
    let (tl, br, r) = (rect.top_left, rect.bottom_right, rect.r());
    if r == 0 {
        return draw_rect(w, tl, br, color).await;
    }

    let straight_w = size.width - 2 * u32::from(rect.radius);
    let straight_h = size.height - 2 * u32::from(rect.radius);
    span(w, offset(tl, r, 0), straight_w, color).await?;
    span(w, offset(Point::new(tl.x, br.y), r, 0), straight_w, color).await?;
    super::line::draw_vline(w, offset(tl, 0, r), straight_h, color).await?;
    super::line::draw_vline(w, offset(Point::new(br.x, tl.y), 0, r), straight_h, color).await?;

    for corner in Corner::ALL {
        circle::draw_quarters(w, rect.center(corner), rect.radius, &[corner], color).await?;
    }
    Ok(())
}

pub(crate) async fn fill_round_rect<W>(
    w: &mut W,
    top_left: Point,
    size: Size,
    radius: u16,
    color: Rgb565,
) -> Result<(), W::Error>
where
    W: PixelWindow + ?Sized,
{
    let Some(rect) = Rounded::new(top_left, size, radius) else {
        return Ok(());
    };
    let (tl, br, r) = (rect.top_left, rect.bottom_right, rect.r());
    if r == 0 {
        return fill_area(w, tl, br, color).await;
    }

    // centre band over the full height, side bands between the corners
    if size.width > 2 * u32::from(rect.radius) {
        fill_area(w, offset(tl, r, 0), offset(br, -r, 0), color).await?;
    }
    if size.height > 2 * u32::from(rect.radius) {
        let (tr, bl) = (Point::new(br.x, tl.y), Point::new(tl.x, br.y));
        fill_area(w, offset(tl, 0, r), offset(bl, r - 1, -r), color).await?;
        fill_area(w, offset(tr, 1 - r, r), offset(br, 0, -r), color).await?;
    }

    for corner in Corner::ALL {
        circle::fill_quarters(w, rect.center(corner), rect.radius, &[corner], color).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embedded_graphics_core::pixelcolor::RgbColor;
    use proptest::prelude::*;

    use super::*;
    use crate::{_mock::RecordingWindow, raster::RasterExt};

    #[test]
    fn fill_rect_writes_exactly_the_area() {
        let mut w = RecordingWindow::new(32, 32);
        block_on(w.fill_rect(Point::new(12, 12), Point::new(10, 10), Rgb565::RED)).unwrap();

        let expected: Vec<(u16, u16)> = (10..=12).flat_map(|x| (10..=12).map(move |y| (x, y))).collect();
        assert_eq!(w.points(), expected);
        assert_eq!(w.windows, 1);
        assert!(w.in_sync());
    }

    #[test]
    fn outline_is_four_runs() {
        let mut w = RecordingWindow::new(32, 32);
        block_on(w.draw_rect(Point::new(2, 3), Point::new(6, 5), Rgb565::RED)).unwrap();

        assert_eq!(w.windows, 4);
        assert_eq!(w.points().len(), 2 * 5 + 2 * 3 - 4);
        assert!(w.color_at(4, 4).is_none());
    }

    #[test]
    fn clear_fills_the_screen() {
        let mut w = RecordingWindow::new(7, 5);
        block_on(w.clear(Rgb565::BLUE)).unwrap();
        assert_eq!(w.pixels.len(), 35);
    }

    #[test]
    fn zero_radius_round_rect_is_a_rect() {
        let mut rounded = RecordingWindow::new(32, 32);
        block_on(rounded.fill_round_rect(Point::new(1, 1), Size::new(6, 4), 0, Rgb565::RED)).unwrap();
        let mut plain = RecordingWindow::new(32, 32);
        block_on(plain.fill_rect(Point::new(1, 1), Point::new(6, 4), Rgb565::RED)).unwrap();
        assert_eq!(rounded.points(), plain.points());

        let mut rounded = RecordingWindow::new(32, 32);
        block_on(rounded.draw_round_rect(Point::new(1, 1), Size::new(6, 4), 0, Rgb565::RED)).unwrap();
        let mut plain = RecordingWindow::new(32, 32);
        block_on(plain.draw_rect(Point::new(1, 1), Point::new(6, 4), Rgb565::RED)).unwrap();
        assert_eq!(rounded.points(), plain.points());
    }

    #[test]
    fn rounded_corners_are_cut() {
        let mut w = RecordingWindow::new(32, 32);
        block_on(w.fill_round_rect(Point::new(0, 0), Size::new(20, 10), 4, Rgb565::RED)).unwrap();

        assert!(w.in_sync());
        for corner in [(0, 0), (19, 0), (19, 9), (0, 9)] {
            assert!(w.color_at(corner.0, corner.1).is_none(), "{corner:?}");
        }
        assert!(w.color_at(10, 0).is_some());
        assert!(w.color_at(0, 5).is_some());
        assert!(w.color_at(10, 5).is_some());
        assert!(w.points().iter().all(|&(x, y)| x < 20 && y < 10));
    }

    #[test]
    fn oversized_radius_is_clamped() {
        let mut w = RecordingWindow::new(32, 32);
        block_on(w.draw_round_rect(Point::new(0, 0), Size::new(10, 6), 50, Rgb565::RED)).unwrap();
        assert!(w.in_sync());
        assert!(w.points().iter().all(|&(x, y)| x < 10 && y < 6));
        assert!(w.color_at(5, 0).is_some());
    }

    #[test]
    fn extreme_origins_are_clipped() {
        let origins = [
            Point::new(0, i32::MAX - 2),
            Point::new(i32::MAX - 2, i32::MAX - 2),
            Point::new(i32::MIN, i32::MIN),
            Point::new(i32::MAX, 4),
        ];
        for origin in origins {
            let mut w = RecordingWindow::new(32, 32);
            block_on(w.fill_round_rect(origin, Size::new(10, 10), 3, Rgb565::RED)).unwrap();
            block_on(w.draw_round_rect(origin, Size::new(10, 10), 3, Rgb565::RED)).unwrap();
            block_on(w.draw_rect(origin, Point::new(i32::MIN, i32::MAX), Rgb565::RED)).unwrap();
            assert!(w.in_sync(), "{origin:?}");
        }
    }

    proptest! {
        #[test]
        fn fill_rect_covers_normalized_area(
            x1 in 0i32..40, y1 in 0i32..40, x2 in 0i32..40, y2 in 0i32..40,
        ) {
            let mut w = RecordingWindow::new(40, 40);
            block_on(w.fill_rect(Point::new(x1, y1), Point::new(x2, y2), Rgb565::GREEN)).unwrap();

            let (lx, hx) = (x1.min(x2), x1.max(x2));
            let (ly, hy) = (y1.min(y2), y1.max(y2));
            prop_assert_eq!(w.pixels.len() as i32, (hx - lx + 1) * (hy - ly + 1));
            for (&(x, y), color) in &w.pixels {
                let (x, y) = (i32::from(x), i32::from(y));
                prop_assert!(lx <= x && x <= hx && ly <= y && y <= hy);
                prop_assert_eq!(*color, Rgb565::GREEN);
            }
        }

        #[test]
        fn filled_round_rect_stays_inside_its_bounds(
            width in 1u32..24, height in 1u32..24, radius in 0u16..16,
        ) {
            let mut w = RecordingWindow::new(64, 64);
            block_on(w.fill_round_rect(Point::new(5, 5), Size::new(width, height), radius, Rgb565::RED)).unwrap();
            prop_assert!(w.in_sync());
            for &(x, y) in w.pixels.keys() {
                prop_assert!((5..5 + width as u16).contains(&x));
                prop_assert!((5..5 + height as u16).contains(&y));
            }
        }
    }
}
