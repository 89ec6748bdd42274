//! Polygon rasterization onto a pixel window
//!
//! A pixel is inside a region when its center is inside the geometry under
//! the even-odd rule, applied across every ring of the multipolygon so holes
//! are excluded.

use crate::app::models::GeoTransform;
use crate::constants::MASK_BURN_VALUE;
use geo::{LineString, MultiPolygon};
use ndarray::Array2;

fn rings(geometry: &MultiPolygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    geometry
        .0
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
}

/// X coordinates where the horizontal line at `y` crosses the geometry's edges
fn crossings(geometry: &MultiPolygon<f64>, y: f64) -> Vec<f64> {
    let mut xs = Vec::new();
    for ring in rings(geometry) {
        for line in ring.lines() {
            let (start, end) = (line.start, line.end);
            if (start.y > y) != (end.y > y) {
                xs.push(start.x + (y - start.y) * (end.x - start.x) / (end.y - start.y));
            }
        }
    }
    xs.sort_by(f64::total_cmp);
    xs
}

/// Burn a geometry into a `rows` x `cols` mask whose top-left pixel is at the
/// transform's origin
///
/// Pixels whose center falls inside the geometry get [`MASK_BURN_VALUE`];
/// every other pixel stays 0.
pub fn rasterize_mask(
    geometry: &MultiPolygon<f64>,
    transform: &GeoTransform,
    rows: usize,
    cols: usize,
) -> Array2<u8> {
    let mut mask = Array2::<u8>::zeros((rows, cols));
    let column_at = |x: f64| {
        let c = ((x - transform.origin_x) / transform.pixel_width - 0.5).ceil();
        c.clamp(0.0, cols as f64) as usize
    };

    for row in 0..rows {
        let y = transform.origin_y + (row as f64 + 0.5) * transform.pixel_height;
        for span in crossings(geometry, y).chunks_exact(2) {
            let (from, to) = (column_at(span[0]), column_at(span[1]));
            for col in from..to {
                mask[[row, col]] = MASK_BURN_VALUE;
            }
        }
    }

    mask
}
