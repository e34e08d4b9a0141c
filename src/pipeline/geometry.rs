//! Polygon geometry for diagram crops: sanitisation, clamping, and
//! full-resolution mask rasterisation.
//!
//! Masks are always rasterised at the source image's full size and cropped
//! afterwards with the same rectangle as the image, so vertices stay in
//! page coordinates throughout.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;
use serde::{Deserialize, Serialize};

/// Mask value for pixels inside the polygon.
pub const MASK_INSIDE: u8 = 255;

/// A polygon vertex in integer pixel coordinates, inside
/// `[0, width] × [0, height]` of its source image.
pub type PixelPoint = (u32, u32);

/// Crop rectangle in pixel coordinates; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelBox {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Zero width or height.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Round raw vertices to the nearest pixel and drop any that fall outside
/// `[0, width] × [0, height]`.
///
/// Halves round to even, so `2.5 → 2` and `3.5 → 4`.
pub fn sanitize_polygon(
    pairs: impl IntoIterator<Item = (f64, f64)>,
    width: u32,
    height: u32,
) -> Vec<PixelPoint> {
    pairs
        .into_iter()
        .filter_map(|(x, y)| {
            let (x, y) = (x.round_ties_even(), y.round_ties_even());
            let in_bounds = (0.0..=width as f64).contains(&x) && (0.0..=height as f64).contains(&y);
            in_bounds.then_some((x as u32, y as u32))
        })
        .collect()
}

/// Clamp raw `(left, top, right, bottom)` bounds into a `width × height`
/// image.
///
/// Coordinates are truncated toward zero, then clamped. `left`/`top` stay
/// strictly inside the image so that `right`/`bottom` can always be pushed
/// one pixel past them: for any non-empty image the result satisfies
/// `right > left` and `bottom > top`. A zero-sized image yields a degenerate
/// box.
pub fn clamp_bbox(raw: (f64, f64, f64, f64), width: u32, height: u32) -> PixelBox {
    let (l, t, r, b) = raw;
    let left = clamp_coord(l, width.saturating_sub(1));
    let top = clamp_coord(t, height.saturating_sub(1));
    let mut right = clamp_coord(r, width);
    let mut bottom = clamp_coord(b, height);
    if right <= left {
        right = width.min(left + 1);
    }
    if bottom <= top {
        bottom = height.min(top + 1);
    }
    PixelBox {
        left,
        top,
        right,
        bottom,
    }
}

fn clamp_coord(v: f64, max: u32) -> u32 {
    // `as` saturates: negatives land on 0, huge values on u32::MAX.
    (v.trunc() as u32).min(max)
}

/// Bounds of sanitised polygon points, as `(left, top, right, bottom)`.
pub fn points_bounds(points: &[PixelPoint]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;
    let init = (first.0, first.1, first.0, first.1);
    let (l, t, r, b) = points.iter().fold(init, |(l, t, r, b), &(x, y)| {
        (l.min(x), t.min(y), r.max(x), b.max(y))
    });
    Some((l as f64, t as f64, r as f64, b as f64))
}

/// Rasterise a filled polygon (interior plus outline) into a mask the size
/// of the whole source image.
///
/// A pixel `(x, y)` is sampled at the point `(x, y)`; interior spans come
/// from an even-odd scanline pass and the outline is stroked on top so that
/// vertices and edges are always inside the mask.
pub fn polygon_mask(points: &[PixelPoint], width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if points.len() < 3 || width == 0 || height == 0 {
        return mask;
    }

    let mut scanline = ScanlineBuffer::new(points.len());
    let min_y = points.iter().map(|p| p.1).min().unwrap_or(0);
    let max_y = points.iter().map(|p| p.1).max().unwrap_or(0).min(height - 1);
    for y in min_y..=max_y {
        scanline.fill_row(points, y, &mut mask);
    }

    let n = points.len();
    for i in 0..n {
        let (x1, y1) = points[i];
        let (x2, y2) = points[(i + 1) % n];
        draw_line_segment_mut(
            &mut mask,
            (x1 as f32, y1 as f32),
            (x2 as f32, y2 as f32),
            Luma([MASK_INSIDE]),
        );
    }

    mask
}

/// Reusable edge-intersection buffer for the scanline fill.
struct ScanlineBuffer {
    intersections: Vec<f64>,
}

impl ScanlineBuffer {
    fn new(max_polygon_points: usize) -> Self {
        Self {
            intersections: Vec::with_capacity(max_polygon_points),
        }
    }

    fn fill_row(&mut self, points: &[PixelPoint], row: u32, mask: &mut GrayImage) {
        self.intersections.clear();
        let y = row as f64;

        let n = points.len();
        for i in 0..n {
            let (x1, y1) = (points[i].0 as f64, points[i].1 as f64);
            let (x2, y2) = (points[(i + 1) % n].0 as f64, points[(i + 1) % n].1 as f64);
            // Half-open crossing test so a vertex shared by two edges counts once.
            if (y1 <= y && y < y2) || (y2 <= y && y < y1) {
                self.intersections.push(x1 + (y - y1) * (x2 - x1) / (y2 - y1));
            }
        }

        self.intersections.sort_by(f64::total_cmp);

        let last_col = (mask.width() - 1) as f64;
        for span in self.intersections.chunks_exact(2) {
            let start = span[0].ceil().max(0.0);
            let end = span[1].floor().min(last_col);
            if start > end {
                continue;
            }
            for x in start as u32..=end as u32 {
                mask.put_pixel(x, row, Luma([MASK_INSIDE]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inside_count(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] == MASK_INSIDE).count()
    }

    #[test]
    fn sanitize_rounds_half_to_even_and_filters() {
        let pts = sanitize_polygon(
            vec![(2.5, 3.5), (10.4, 0.0), (-1.0, 5.0), (11.0, 5.0), (10.0, 10.6)],
            10,
            10,
        );
        // -1 and 11 fall outside; 10.6 rounds to 11, also outside
        assert_eq!(pts, vec![(2, 4), (10, 0)]);
    }

    #[test]
    fn sanitize_keeps_far_edge() {
        let pts = sanitize_polygon(vec![(10.0, 10.0), (0.0, 0.0)], 10, 10);
        assert_eq!(pts, vec![(10, 10), (0, 0)]);
    }

    #[test]
    fn clamp_passes_through_interior_box() {
        let b = clamp_bbox((5.9, 6.2, 40.7, 50.0), 100, 100);
        assert_eq!(
            b,
            PixelBox {
                left: 5,
                top: 6,
                right: 40,
                bottom: 50
            }
        );
    }

    #[test]
    fn clamp_forces_one_pixel_minimum() {
        let b = clamp_bbox((20.0, 30.0, 20.0, 10.0), 100, 100);
        assert_eq!((b.left, b.right), (20, 21));
        assert_eq!((b.top, b.bottom), (30, 31));
    }

    #[test]
    fn clamp_at_far_edge_stays_non_degenerate() {
        let b = clamp_bbox((150.0, 150.0, 200.0, 200.0), 100, 80);
        assert_eq!(b.right, 100);
        assert_eq!(b.bottom, 80);
        assert!(b.right > b.left);
        assert!(b.bottom > b.top);
    }

    #[test]
    fn clamp_invariant_over_grid() {
        let (w, h) = (37u32, 23u32);
        let samples = [-50.0, -0.5, 0.0, 0.4, 1.0, 11.7, 22.0, 23.0, 36.0, 37.0, 38.9, 1e9];
        for &l in &samples {
            for &t in &samples {
                for &r in &samples {
                    for &b in &samples {
                        let bx = clamp_bbox((l, t, r, b), w, h);
                        assert!(bx.right > bx.left, "{bx:?} from {:?}", (l, t, r, b));
                        assert!(bx.bottom > bx.top, "{bx:?} from {:?}", (l, t, r, b));
                        assert!(bx.right <= w && bx.bottom <= h, "{bx:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn clamp_zero_sized_image_is_degenerate() {
        let b = clamp_bbox((0.0, 0.0, 5.0, 5.0), 0, 0);
        assert!(b.is_degenerate());
    }

    #[test]
    fn points_bounds_of_triangle() {
        let b = points_bounds(&[(4, 9), (1, 2), (7, 5)]);
        assert_eq!(b, Some((1.0, 2.0, 7.0, 9.0)));
        assert_eq!(points_bounds(&[]), None);
    }

    #[test]
    fn rectangle_mask_covers_vertices_inclusive() {
        let mask = polygon_mask(&[(2, 2), (12, 2), (12, 12), (2, 12)], 20, 20);
        // Vertices at integer coordinates are pixel centres: 11 × 11 pixels.
        assert_eq!(inside_count(&mask), 121);
        assert_eq!(mask.get_pixel(2, 2).0[0], MASK_INSIDE);
        assert_eq!(mask.get_pixel(12, 12).0[0], MASK_INSIDE);
        assert_eq!(mask.get_pixel(13, 12).0[0], 0);
        assert_eq!(mask.get_pixel(1, 5).0[0], 0);
    }

    #[test]
    fn triangle_mask_excludes_far_corner() {
        // Right triangle with the hypotenuse from (0,0) to (20,20); the
        // upper-right half of the square stays empty.
        let mask = polygon_mask(&[(0, 0), (0, 20), (20, 20)], 21, 21);
        assert_eq!(mask.get_pixel(2, 18).0[0], MASK_INSIDE);
        assert_eq!(mask.get_pixel(18, 2).0[0], 0);
        assert_eq!(mask.get_pixel(20, 0).0[0], 0);
        // Interior + outline of a 21-pixel right triangle: 21 * 22 / 2.
        assert_eq!(inside_count(&mask), 231);
    }

    #[test]
    fn mask_is_full_image_size() {
        let mask = polygon_mask(&[(1, 1), (3, 1), (3, 3)], 64, 48);
        assert_eq!(mask.dimensions(), (64, 48));
    }

    #[test]
    fn vertices_on_far_edge_do_not_panic() {
        let mask = polygon_mask(&[(0, 0), (10, 0), (10, 10), (0, 10)], 10, 10);
        assert_eq!(inside_count(&mask), 100);
    }

    #[test]
    fn too_few_points_yield_empty_mask() {
        let mask = polygon_mask(&[(0, 0), (5, 5)], 10, 10);
        assert_eq!(inside_count(&mask), 0);
    }
}
