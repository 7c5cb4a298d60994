//! Ring math for point-in-polygon tests.
//!
//! Even-odd ray casting along +x. Points lying exactly on an edge or vertex
//! are reported as outside, so the grid never emits boundary points.

use geo::Coord;

/// Test whether (x, y) lies strictly inside a closed ring.
pub fn ring_contains(ring: &[Coord<f64>], x: f64, y: f64) -> bool {
    let mut inside = false;

    for edge in ring.windows(2) {
        let (a, b) = (edge[0], edge[1]);

        if on_segment(a, b, x, y) {
            return false;
        }

        // Half-open rule on y avoids double counting shared vertices
        if (a.y > y) != (b.y > y) {
            let x_cross = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x < x_cross {
                inside = !inside;
            }
        }
    }

    inside
}

fn on_segment(a: Coord<f64>, b: Coord<f64>, x: f64, y: f64) -> bool {
    let cross = (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
    if cross != 0.0 {
        return false;
    }
    x >= a.x.min(b.x) && x <= a.x.max(b.x) && y >= a.y.min(b.y) && y <= a.y.max(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, LineString, Point, Polygon};

    fn ring(pairs: &[(f64, f64)]) -> Vec<Coord<f64>> {
        pairs.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn unit_square() -> Vec<Coord<f64>> {
        ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
    }

    #[test]
    fn test_square_interior_and_exterior() {
        let sq = unit_square();
        assert!(ring_contains(&sq, 0.5, 0.5));
        assert!(ring_contains(&sq, 0.01, 0.99));
        assert!(!ring_contains(&sq, 1.5, 0.5));
        assert!(!ring_contains(&sq, -0.1, 0.5));
        assert!(!ring_contains(&sq, 0.5, 1.0001));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let sq = unit_square();
        assert!(!ring_contains(&sq, 0.0, 0.0));
        assert!(!ring_contains(&sq, 0.5, 0.0));
        assert!(!ring_contains(&sq, 1.0, 0.3));
        assert!(!ring_contains(&sq, 0.0, 0.7));
        assert!(!ring_contains(&sq, 1.0, 1.0));
    }

    #[test]
    fn test_concave_ring() {
        // U shape opening upward
        let u = ring(&[
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (0.0, 3.0),
            (0.0, 0.0),
        ]);
        assert!(ring_contains(&u, 0.5, 2.0));
        assert!(ring_contains(&u, 2.5, 2.0));
        assert!(ring_contains(&u, 1.5, 0.5));
        assert!(!ring_contains(&u, 1.5, 2.0));
    }

    #[test]
    fn test_agrees_with_geo_contains() {
        let coords = ring(&[
            (28.9, 40.8),
            (29.2, 40.85),
            (29.15, 41.1),
            (29.05, 40.95),
            (28.95, 41.05),
            (28.9, 40.8),
        ]);
        let oracle = Polygon::new(LineString::new(coords.clone()), vec![]);

        // Deterministic LCG so the sample is stable
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };

        for _ in 0..2000 {
            let x = 28.85 + next() * 0.4;
            let y = 40.75 + next() * 0.4;
            assert_eq!(
                ring_contains(&coords, x, y),
                oracle.contains(&Point::new(x, y)),
                "disagreement at ({}, {})",
                x,
                y
            );
        }
    }
}
