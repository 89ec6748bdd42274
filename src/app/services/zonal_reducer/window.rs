//! Envelope to pixel window conversion

use crate::app::models::{GeoTransform, PixelWindow};
use geo::{BoundingRect, MultiPolygon};

/// Bounding envelope of a geometry in map coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Envelope of a region geometry, `None` when it has no coordinates
pub fn envelope(geometry: &MultiPolygon<f64>) -> Option<Envelope> {
    geometry.bounding_rect().map(|rect| Envelope {
        min_x: rect.min().x,
        max_x: rect.max().x,
        min_y: rect.min().y,
        max_y: rect.max().y,
    })
}

/// Smallest pixel window of a north-up raster covering the envelope
///
/// The pixel height is negative, so the row start comes from the envelope's
/// maximum Y. Upper bounds are exclusive. `None` when a bound is not a
/// representable pixel index (non-finite coordinates, zero pixel size,
/// coordinates far outside any raster).
pub fn pixel_window(envelope: &Envelope, transform: &GeoTransform) -> Option<PixelWindow> {
    let col = |x: f64| pixel_index((x - transform.origin_x) / transform.pixel_width);
    let row = |y: f64| pixel_index((y - transform.origin_y) / transform.pixel_height);

    Some(PixelWindow {
        row_start: row(envelope.max_y)?,
        row_end: row(envelope.min_y)?.checked_add(1)?,
        col_start: col(envelope.min_x)?,
        col_end: col(envelope.max_x)?.checked_add(1)?,
    })
}

/// Index of the pixel holding a fractional pixel position
fn pixel_index(position: f64) -> Option<i64> {
    let index = position.floor();
    // `i64::MAX as f64` rounds up to 2^63, hence the strict upper bound
    (index.is_finite() && index >= i64::MIN as f64 && index < i64::MAX as f64)
        .then_some(index as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn transform() -> GeoTransform {
        // 10 x 10 grid of 1-unit pixels with its top-left corner at (100, 200)
        GeoTransform::north_up(100.0, 200.0, 1.0, -1.0)
    }

    #[test]
    fn test_window_covers_envelope() {
        let envelope = Envelope {
            min_x: 102.5,
            max_x: 105.5,
            min_y: 193.2,
            max_y: 197.7,
        };

        let window = pixel_window(&envelope, &transform()).unwrap();

        assert_eq!(
            window,
            PixelWindow {
                row_start: 2,
                row_end: 7,
                col_start: 2,
                col_end: 6,
            }
        );
    }

    #[test]
    fn test_window_is_deterministic() {
        let envelope = Envelope {
            min_x: 100.3,
            max_x: 101.9,
            min_y: 198.1,
            max_y: 199.9,
        };

        let first = pixel_window(&envelope, &transform()).unwrap();
        let second = pixel_window(&envelope, &transform()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_window_left_of_raster_has_negative_start() {
        let envelope = Envelope {
            min_x: 98.5,
            max_x: 101.5,
            min_y: 195.0,
            max_y: 196.0,
        };

        let window = pixel_window(&envelope, &transform()).unwrap();

        assert_eq!(window.col_start, -2);
        assert!(!window.fits_within(10, 10));
    }

    #[test]
    fn test_huge_envelope_has_no_window() {
        let envelope = Envelope {
            min_x: 101.0,
            max_x: 1e20,
            min_y: 195.0,
            max_y: 196.0,
        };

        assert_eq!(pixel_window(&envelope, &transform()), None);
    }

    #[test]
    fn test_zero_pixel_size_has_no_window() {
        let envelope = Envelope {
            min_x: 101.0,
            max_x: 102.0,
            min_y: 195.0,
            max_y: 196.0,
        };
        let flat = GeoTransform::north_up(100.0, 200.0, 1.0, 0.0);

        assert_eq!(pixel_window(&envelope, &flat), None);
    }

    #[test]
    fn test_non_finite_envelope_has_no_window() {
        let envelope = Envelope {
            min_x: f64::NAN,
            max_x: 102.0,
            min_y: 195.0,
            max_y: f64::INFINITY,
        };

        assert_eq!(pixel_window(&envelope, &transform()), None);
    }

    #[test]
    fn test_envelope_of_polygon() {
        let geometry = MultiPolygon::new(vec![polygon![
            (x: 1.0, y: 2.0),
            (x: 4.0, y: 2.0),
            (x: 3.0, y: 7.0),
        ]]);

        let envelope = envelope(&geometry).unwrap();

        assert_eq!(envelope.min_x, 1.0);
        assert_eq!(envelope.max_x, 4.0);
        assert_eq!(envelope.min_y, 2.0);
        assert_eq!(envelope.max_y, 7.0);
    }

    #[test]
    fn test_empty_geometry_has_no_envelope() {
        let geometry: MultiPolygon<f64> = MultiPolygon::new(Vec::new());
        assert!(envelope(&geometry).is_none());
    }
}
