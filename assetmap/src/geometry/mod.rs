//! Polygon geometry utilities
//!
//! Pure functions over polygon rings, used to reduce polygonal GIS features
//! to a single representative point. A ring is an ordered sequence of 2D
//! points; the first point implicitly connects to the last, and an explicit
//! closing point (last == first) is tolerated.

use thiserror::Error;

/// Errors from polygon geometry operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Ring with too few vertices to bound any area.
    #[error("ring has only {0} vertices, need at least 3")]
    RingTooShort(usize),

    /// Ring with zero signed area has no meaningful centroid.
    #[error("degenerate ring: zero signed area over {0} vertices")]
    DegenerateRing(usize),
}

/// Computes the signed area of a polygon ring via the shoelace formula.
///
/// The sign indicates winding direction (positive for counter-clockwise).
/// The wraparound edge from the last vertex back to the first is always
/// included; for an explicitly closed ring that edge contributes zero.
pub fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        sum += x0 * y1 - x1 * y0;
    }
    0.5 * sum
}

/// Computes the area-weighted centroid of a simple polygon ring.
///
/// This is the standard polygon centroid, not a vertex average - the two
/// differ materially for non-convex rings. Fails with
/// [`GeometryError::DegenerateRing`] when the ring encloses no area.
pub fn centroid(ring: &[(f64, f64)]) -> Result<(f64, f64), GeometryError> {
    let n = ring.len();
    if n < 3 {
        return Err(GeometryError::RingTooShort(n));
    }

    let area = signed_area(ring);
    if area == 0.0 {
        return Err(GeometryError::DegenerateRing(n));
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        let cross = x0 * y1 - x1 * y0;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }

    Ok((cx / (6.0 * area), cy / (6.0 * area)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn unit_square() -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]
    }

    #[test]
    fn test_unit_square_area() {
        assert!((signed_area(&unit_square()) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_unit_square_centroid() {
        let (cx, cy) = centroid(&unit_square()).unwrap();
        assert!((cx - 0.5).abs() < EPS);
        assert!((cy - 0.5).abs() < EPS);
    }

    #[test]
    fn test_unclosed_ring_matches_closed_ring() {
        // Without the explicit closing point the wraparound edge must be
        // supplied by the implementation.
        let open = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!((signed_area(&open) - 1.0).abs() < EPS);

        let (cx, cy) = centroid(&open).unwrap();
        assert!((cx - 0.5).abs() < EPS);
        assert!((cy - 0.5).abs() < EPS);
    }

    #[test]
    fn test_clockwise_winding_gives_negative_area_same_centroid() {
        let mut ring = unit_square();
        ring.reverse();
        assert!((signed_area(&ring) + 1.0).abs() < EPS);

        // Centroid is winding-independent: the sign cancels in the division.
        let (cx, cy) = centroid(&ring).unwrap();
        assert!((cx - 0.5).abs() < EPS);
        assert!((cy - 0.5).abs() < EPS);
    }

    #[test]
    fn test_non_convex_ring_is_not_vertex_average() {
        // L-shaped ring. True centroid is (5/6, 5/6); the vertex average of
        // the six distinct corners is (1, 1).
        let ring = vec![
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
            (0.0, 0.0),
        ];
        let (cx, cy) = centroid(&ring).unwrap();
        assert!((cx - 5.0 / 6.0).abs() < EPS, "cx = {}", cx);
        assert!((cy - 5.0 / 6.0).abs() < EPS, "cy = {}", cy);
        assert!((cx - 1.0).abs() > 0.1, "centroid must not be the vertex average");
    }

    #[test]
    fn test_degenerate_ring_rejected() {
        // Collinear points enclose no area.
        let ring = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.0, 0.0)];
        let result = centroid(&ring);
        assert_eq!(result, Err(GeometryError::DegenerateRing(4)));
    }

    #[test]
    fn test_too_short_ring_rejected() {
        let ring = vec![(0.0, 0.0), (1.0, 1.0)];
        assert_eq!(centroid(&ring), Err(GeometryError::RingTooShort(2)));
        assert_eq!(signed_area(&ring), 0.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        /// A random convex-ish quadrilateral with guaranteed nonzero area.
        fn quad(dx: f64, dy: f64, w: f64, h: f64) -> Vec<(f64, f64)> {
            vec![
                (dx, dy),
                (dx + w, dy),
                (dx + w, dy + h),
                (dx, dy + h),
                (dx, dy),
            ]
        }

        proptest! {
            // Shoelace terms are products of absolute coordinates, so the
            // ranges here keep those products small enough for the tight
            // tolerances; far-from-origin behavior is covered by the fixed
            // Web Mercator cases in the gis tests.
            #[test]
            fn test_rectangle_area(
                dx in -1e3..1e3_f64,
                dy in -1e3..1e3_f64,
                w in 0.1..1e4_f64,
                h in 0.1..1e4_f64
            ) {
                let ring = quad(dx, dy, w, h);
                let area = signed_area(&ring);
                prop_assert!((area - w * h).abs() < 1e-4 * w * h + 1e-6);
            }

            #[test]
            fn test_centroid_translation_equivariant(
                dx in -100.0..100.0_f64,
                dy in -100.0..100.0_f64,
                w in 0.5..100.0_f64,
                h in 0.5..100.0_f64
            ) {
                let at_origin = centroid(&quad(0.0, 0.0, w, h)).unwrap();
                let shifted = centroid(&quad(dx, dy, w, h)).unwrap();
                prop_assert!((shifted.0 - at_origin.0 - dx).abs() < 1e-6);
                prop_assert!((shifted.1 - at_origin.1 - dy).abs() < 1e-6);
            }

            #[test]
            fn test_rectangle_centroid_is_center(
                dx in -100.0..100.0_f64,
                dy in -100.0..100.0_f64,
                w in 0.5..100.0_f64,
                h in 0.5..100.0_f64
            ) {
                let (cx, cy) = centroid(&quad(dx, dy, w, h)).unwrap();
                prop_assert!((cx - (dx + w / 2.0)).abs() < 1e-6);
                prop_assert!((cy - (dy + h / 2.0)).abs() < 1e-6);
            }
        }
    }
}
