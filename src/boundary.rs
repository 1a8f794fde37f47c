//! Exact geometric predicates over polygonal domain boundaries.
//!
//! Everything here is a pure function over immutable geometric values:
//! point-to-segment distance, segment-segment intersection classification,
//! and point-in-polygon containment by ray casting. The containment
//! predicate drives boundary particle placement and interior sampling, so
//! the degenerate cases (vertex grazing, collinear rays, zero-length
//! segments) are handled by explicit branches rather than error paths.
//!
//! One tolerance constant, [`GEOM_EPSILON`](crate::settings::GEOM_EPSILON),
//! governs every degeneracy classification, scaled by the magnitudes
//! involved. Mismatched tolerances between the collinearity test and the
//! vertex-touch test are what produce double-counted raycast parities.

use nalgebra::Point2;
use rayon::prelude::*;

use crate::geom::{Aabb, LineSegment, Polygon};
use crate::settings::{GEOM_EPSILON, MAX_RAY_ATTEMPTS, RAY_MARGIN_FACTOR};

#[cfg(test)]
mod tests {

    use super::*;

    fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> LineSegment {
        LineSegment::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            Point2::new(0.1, 0.1),
            Point2::new(0.9, 0.1),
            Point2::new(0.9, 0.9),
            Point2::new(0.1, 0.9),
        ])
        .unwrap()
    }

    // Four-pointed star with eight vertices, concave between the spikes.
    fn star() -> Polygon {
        Polygon::new(vec![
            Point2::new(0.5, 0.0),
            Point2::new(0.65, 0.35),
            Point2::new(1.0, 0.5),
            Point2::new(0.65, 0.65),
            Point2::new(0.5, 1.0),
            Point2::new(0.35, 0.65),
            Point2::new(0.0, 0.5),
            Point2::new(0.35, 0.35),
        ])
        .unwrap()
    }

    #[test]
    fn distance_to_diagonal() {
        let d = distance_to_segment(&Point2::new(1.0, 0.0), &segment(0.0, 0.0, 1.0, 1.0));
        assert!((d - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12, "d: {}", d);
    }

    #[test]
    fn distance_is_symmetric_under_endpoint_swap() {
        let p = Point2::new(0.3, -1.2);
        let d1 = distance_to_segment(&p, &segment(-0.5, 0.2, 1.7, 0.9));
        let d2 = distance_to_segment(&p, &segment(1.7, 0.9, -0.5, 0.2));
        assert!((d1 - d2).abs() < 1e-12, "d1: {}, d2: {}", d1, d2);
    }

    #[test]
    fn distance_beyond_endpoint_clamps() {
        // perpendicular foot falls outside the segment, nearest endpoint wins
        let d = distance_to_segment(&Point2::new(2.0, 1.0), &segment(0.0, 0.0, 1.0, 0.0));
        assert!((d - 2.0_f64.sqrt()).abs() < 1e-12, "d: {}", d);
    }

    #[test]
    fn distance_to_degenerate_segment() {
        let d = distance_to_segment(&Point2::new(3.0, 4.0), &segment(0.0, 0.0, 0.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12, "d: {}", d);
    }

    #[test]
    fn crossing_segments() {
        let first = segment(0.0, 0.0, 1.0, 0.0);
        let second = segment(0.5, -1.0, 0.5, 1.0);
        assert_eq!(
            segment_intersection(&first, &second),
            SegmentIntersection::Crosses
        );

        let crossing = intersection_point(&first, &second).unwrap();
        assert!((crossing.x - 0.5).abs() < 1e-12);
        assert!(crossing.y.abs() < 1e-12);
    }

    #[test]
    fn collinear_overlapping_segments() {
        let first = segment(0.0, 0.0, 1.0, 0.0);
        let second = segment(0.5, 0.0, 2.0, 0.0);
        assert_eq!(
            segment_intersection(&first, &second),
            SegmentIntersection::Collinear
        );
    }

    #[test]
    fn parallel_distinct_segments() {
        let first = segment(0.0, 0.0, 1.0, 0.0);
        let second = segment(0.0, 1.0, 1.0, 1.0);
        assert_eq!(
            segment_intersection(&first, &second),
            SegmentIntersection::NoIntersection
        );
    }

    #[test]
    fn separated_segments() {
        let first = segment(0.0, 0.0, 1.0, 0.0);
        let second = segment(2.0, -1.0, 2.0, 1.0);
        assert_eq!(
            segment_intersection(&first, &second),
            SegmentIntersection::NoIntersection
        );
    }

    #[test]
    fn endpoint_touch() {
        // shared corner
        let first = segment(0.0, 0.0, 1.0, 0.0);
        let second = segment(1.0, 0.0, 1.0, 1.0);
        assert_eq!(
            segment_intersection(&first, &second),
            SegmentIntersection::Touches
        );

        // T-junction: an endpoint in the interior of the other segment
        let second = segment(0.5, 0.0, 0.5, 1.0);
        assert_eq!(
            segment_intersection(&first, &second),
            SegmentIntersection::Touches
        );
    }

    #[test]
    fn degenerate_segment_intersection() {
        let first = segment(0.0, 0.0, 1.0, 0.0);
        let on = segment(0.5, 0.0, 0.5, 0.0);
        let off = segment(0.5, 0.5, 0.5, 0.5);
        assert_eq!(
            segment_intersection(&first, &on),
            SegmentIntersection::Touches
        );
        assert_eq!(
            segment_intersection(&first, &off),
            SegmentIntersection::NoIntersection
        );

        // two coincident points touch, two distinct points do not
        assert_eq!(
            segment_intersection(&on, &on),
            SegmentIntersection::Touches
        );
        assert_eq!(
            segment_intersection(&on, &off),
            SegmentIntersection::NoIntersection
        );
    }

    #[test]
    fn vertex_between_ray_endpoints() {
        let start = Point2::new(0.0, 0.0);
        let end = Point2::new(1.0, 1.0);
        assert!(point_between(&Point2::new(0.5, 0.5), &start, &end));
        assert!(!point_between(&Point2::new(0.5, 0.6), &start, &end));
        // on the infinite line but beyond the endpoints
        assert!(!point_between(&Point2::new(1.5, 1.5), &start, &end));
        assert!(!point_between(&Point2::new(-0.5, -0.5), &start, &end));
    }

    #[test]
    fn square_contains_center() {
        assert!(point_inside_polygon(&Point2::new(0.5, 0.5), &unit_square()));
    }

    #[test]
    fn square_excludes_origin() {
        assert!(!point_inside_polygon(&Point2::new(0.0, 0.0), &unit_square()));
    }

    #[test]
    fn bounding_box_fast_reject() {
        assert!(!point_inside_polygon(&Point2::new(0.05, 0.5), &unit_square()));
        assert!(!point_inside_polygon(&Point2::new(0.5, 0.95), &unit_square()));
    }

    #[test]
    fn convex_polygon_contains_centroid() {
        let vertices = (0..6)
            .map(|i| {
                let angle = std::f64::consts::PI / 3.0 * i as f64;
                Point2::new(0.3 + angle.cos(), -0.2 + angle.sin())
            })
            .collect();
        let hexagon = Polygon::new(vertices).unwrap();
        assert!(point_inside_polygon(&hexagon.centroid(), &hexagon));
    }

    #[test]
    fn boundary_points_resolve_inside() {
        let square = unit_square();
        // query point on a vertex
        assert!(point_inside_polygon(&Point2::new(0.1, 0.1), &square));
        // query point on an edge interior
        assert!(point_inside_polygon(&Point2::new(0.5, 0.1), &square));
    }

    #[test]
    fn star_spike_alignment_is_consistent() {
        // The query shares its x-coordinate with the bottom spike vertex and
        // sits between the two edges meeting there. The outcome must be a
        // single consistent parity, not an off-by-one double count.
        let star = star();
        let inside_spike = Point2::new(0.5, 0.2);
        let first = point_inside_polygon(&inside_spike, &star);
        let second = point_inside_polygon(&inside_spike, &star);
        assert!(first);
        assert_eq!(first, second);

        // inside the bounding box but in the concave notch between spikes
        assert!(!point_inside_polygon(&Point2::new(0.2, 0.2), &star));
    }

    #[test]
    fn self_intersecting_polygon_does_not_crash() {
        let bowtie = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ])
        .unwrap();
        let _ = point_inside_polygon(&Point2::new(0.5, 0.25), &bowtie);
        let _ = point_inside_polygon(&Point2::new(0.5, 0.75), &bowtie);
    }

    #[test]
    fn batch_matches_scalar() {
        let square = unit_square();
        let points = vec![
            Point2::new(0.5, 0.5),
            Point2::new(0.0, 0.0),
            Point2::new(0.2, 0.8),
            Point2::new(1.2, 0.4),
        ];
        let batch = contains_batch(&points, &square);
        for (point, &inside) in points.iter().zip(batch.iter()) {
            assert_eq!(inside, point_inside_polygon(point, &square));
        }
    }

    #[test]
    fn nearest_edge_distance() {
        let square = unit_square();
        let d = distance_to_boundary(&Point2::new(0.5, 0.0), &square);
        assert!((d - 0.1).abs() < 1e-12, "d: {}", d);
    }
}

/// Classification of how two line segments relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentIntersection {
    /// The segments share no point.
    NoIntersection,
    /// The segments cross at exactly one interior point.
    Crosses,
    /// An endpoint of one segment lies on the other segment.
    Touches,
    /// The segments lie on the same infinite line.
    Collinear,
}

/// Euclidean distance from a point to a line segment.
///
/// The segment is treated as `start + t*(end-start)` with t clamped to
/// [0, 1], so the distance to the nearest endpoint is returned when the
/// perpendicular foot falls outside the segment. A degenerate segment
/// reduces to the point-to-point distance.
pub fn distance_to_segment(point: &Point2<f64>, segment: &LineSegment) -> f64 {
    let direction = segment.direction();
    let length_squared = direction.norm_squared();

    if length_squared == 0.0 {
        return (point - segment.start).norm();
    }

    let t_raw = (point - segment.start).dot(&direction) / length_squared;
    let t = t_raw.clamp(0.0, 1.0);
    let projection = segment.start + direction * t;

    (point - projection).norm()
}

/// Distance from a point to the nearest edge of a polygon.
pub fn distance_to_boundary(point: &Point2<f64>, polygon: &Polygon) -> f64 {
    polygon
        .edges()
        .map(|edge| distance_to_segment(point, &edge))
        .fold(f64::INFINITY, f64::min)
}

// Coefficients (a, b, c) of the infinite line through a segment in standard
// form, a*x + b*y + c = 0. The magnitude of (a, b) equals the segment length.
fn line_coefficients(segment: &LineSegment) -> (f64, f64, f64) {
    let a = segment.end.y - segment.start.y;
    let b = segment.start.x - segment.end.x;
    let c = segment.end.x * segment.start.y - segment.start.x * segment.end.y;
    (a, b, c)
}

/// Classifies the intersection of two line segments.
///
/// Each segment's endpoints are evaluated against the other segment's
/// infinite line in standard form. Strictly same-signed values on both
/// endpoints put one segment entirely on one side of the other, so the
/// segments cannot meet. If neither rejection fires, the direction cross
/// product separates the collinear case from a single crossing, and a
/// vanishing implicit-line value at any endpoint classifies as a touch.
/// All comparisons use a relative tolerance scaled to the segment lengths.
pub fn segment_intersection(first: &LineSegment, second: &LineSegment) -> SegmentIntersection {
    // Degenerate segments reduce to point-on-segment classification.
    if first.is_degenerate() || second.is_degenerate() {
        return degenerate_intersection(first, second);
    }

    let first_length = first.length();
    let second_length = second.length();
    let scale = first_length.max(second_length);

    let (a1, b1, c1) = line_coefficients(first);
    let first_tol = GEOM_EPSILON * first_length * scale;
    let d1 = a1 * second.start.x + b1 * second.start.y + c1;
    let d2 = a1 * second.end.x + b1 * second.end.y + c1;

    if (d1 > first_tol && d2 > first_tol) || (d1 < -first_tol && d2 < -first_tol) {
        return SegmentIntersection::NoIntersection;
    }

    // The extended first line meeting the second segment is necessary but
    // not sufficient, so test the reverse case as well.
    let (a2, b2, c2) = line_coefficients(second);
    let second_tol = GEOM_EPSILON * second_length * scale;
    let e1 = a2 * first.start.x + b2 * first.start.y + c2;
    let e2 = a2 * first.end.x + b2 * first.end.y + c2;

    if (e1 > second_tol && e2 > second_tol) || (e1 < -second_tol && e2 < -second_tol) {
        return SegmentIntersection::NoIntersection;
    }

    // Same infinite line: the direction cross product vanishes relative to
    // the product of the segment lengths.
    if (a1 * b2 - a2 * b1).abs() <= GEOM_EPSILON * first_length * second_length {
        return SegmentIntersection::Collinear;
    }

    // A vanishing implicit-line value at an endpoint is a vertex touch,
    // not a generic crossing.
    if d1.abs() <= first_tol
        || d2.abs() <= first_tol
        || e1.abs() <= second_tol
        || e2.abs() <= second_tol
    {
        return SegmentIntersection::Touches;
    }

    SegmentIntersection::Crosses
}

// Intersection classification where at least one segment has zero length.
fn degenerate_intersection(first: &LineSegment, second: &LineSegment) -> SegmentIntersection {
    let on_segment = |point: &Point2<f64>, segment: &LineSegment| {
        let scale = segment.length().max((point - segment.start).norm());
        distance_to_segment(point, segment) <= GEOM_EPSILON * scale
    };

    let touches = if first.is_degenerate() {
        on_segment(&first.start, second)
    } else {
        on_segment(&second.start, first)
    };

    if touches {
        SegmentIntersection::Touches
    } else {
        SegmentIntersection::NoIntersection
    }
}

/// Location of the single point where two segments meet, if they cross or
/// touch. Solves the two implicit line equations directly.
pub fn intersection_point(first: &LineSegment, second: &LineSegment) -> Option<Point2<f64>> {
    match segment_intersection(first, second) {
        SegmentIntersection::Crosses | SegmentIntersection::Touches => {}
        _ => return None,
    }

    let (a1, b1, c1) = line_coefficients(first);
    let (a2, b2, c2) = line_coefficients(second);
    // the non-collinear classification above guarantees a non-zero determinant
    let det = a1 * b2 - a2 * b1;

    Some(Point2::new(
        (b1 * c2 - b2 * c1) / det,
        (a2 * c1 - a1 * c2) / det,
    ))
}

/// Whether a point lies on the segment between two other points, within the
/// uniform relative tolerance. The near-parallel test uses the 2D cross
/// product, the extent test the dot product against the squared length.
pub fn point_between(point: &Point2<f64>, start: &Point2<f64>, end: &Point2<f64>) -> bool {
    let span = end - start;
    let offset = point - start;
    let length_squared = span.norm_squared();

    if length_squared == 0.0 {
        return offset.norm_squared() == 0.0;
    }

    let cross = span.x * offset.y - span.y * offset.x;
    if cross.abs() > GEOM_EPSILON * length_squared {
        return false;
    }

    let dot = span.dot(&offset);
    dot >= -GEOM_EPSILON * length_squared && dot <= length_squared * (1.0 + GEOM_EPSILON)
}

/// Point-in-polygon membership by ray casting.
///
/// Points outside the polygon's bounding box are rejected immediately. A
/// ray is then cast from a start point outside the box (the minimum corner
/// minus a margin of [`RAY_MARGIN_FACTOR`] of the larger box dimension) to
/// the query point, and crossings with every edge are counted; odd parity
/// means inside.
///
/// A ray that runs along an edge, or passes through a vertex other than the
/// query point itself, is rerolled: the start point moves through a fixed
/// deterministic schedule so the ray slope changes, keeping the predicate a
/// pure function of its inputs. A query point sitting on a vertex is touched
/// once by each adjacent edge; a single decrement restores parity there, so
/// boundary points classify as inside. If every candidate ray is degenerate
/// the last one is evaluated with the decrement applied to each on-ray
/// vertex, which can miscount when the ray also grazes an edge.
pub fn point_inside_polygon(point: &Point2<f64>, polygon: &Polygon) -> bool {
    let aabb = polygon.aabb();
    if !aabb.contains(point) {
        return false;
    }

    let margin = RAY_MARGIN_FACTOR * aabb.max_dimension();
    let coincidence_tol = GEOM_EPSILON * aabb.max_dimension();

    for attempt in 0..MAX_RAY_ATTEMPTS {
        let start = ray_start(&aabb, margin, attempt);
        if let Some(inside) = ray_parity(point, polygon, &start, coincidence_tol, true) {
            return inside;
        }
    }

    // Every candidate ray grazed a vertex or ran along an edge. Re-evaluate
    // the last ray with the vertex decrement applied unconditionally.
    let start = ray_start(&aabb, margin, MAX_RAY_ATTEMPTS - 1);
    ray_parity(point, polygon, &start, coincidence_tol, false).unwrap_or(false)
}

/// Evaluates containment for a slice of query points in parallel. Each
/// evaluation is independent, so the batch distributes freely across the
/// rayon pool.
pub fn contains_batch(points: &[Point2<f64>], polygon: &Polygon) -> Vec<bool> {
    points
        .par_iter()
        .map(|point| point_inside_polygon(point, polygon))
        .collect()
}

// Exterior start point for the raycast. The two offsets grow at different
// rates so the ray slope changes on every attempt.
fn ray_start(aabb: &Aabb, margin: f64, attempt: usize) -> Point2<f64> {
    let k = attempt as f64;
    Point2::new(
        aabb.min.x - margin * (1.0 + 0.61 * k),
        aabb.min.y - margin * (1.0 + 0.37 * k),
    )
}

// Crossing parity of one candidate ray. Returns None when `strict` and the
// ray needs a reroll: it runs along an edge, or transits a vertex that is
// not the query point itself.
fn ray_parity(
    point: &Point2<f64>,
    polygon: &Polygon,
    start: &Point2<f64>,
    coincidence_tol: f64,
    strict: bool,
) -> Option<bool> {
    let ray = LineSegment::new(*start, *point);
    let mut crossings: i64 = 0;

    for edge in polygon.edges() {
        match segment_intersection(&ray, &edge) {
            SegmentIntersection::Crosses | SegmentIntersection::Touches => crossings += 1,
            SegmentIntersection::Collinear => {
                if strict {
                    return None;
                }
                // fallback mode: an edge along the ray contributes nothing
            }
            SegmentIntersection::NoIntersection => {}
        }
    }

    // A vertex on the ray was counted once by each adjacent edge. A single
    // decrement restores parity for a query point sitting on that vertex;
    // any other vertex transit forces a reroll in strict mode.
    for vertex in &polygon.vertices {
        if point_between(vertex, start, point) {
            if (vertex - point).norm() <= coincidence_tol || !strict {
                crossings -= 1;
            } else {
                return None;
            }
        }
    }

    Some(crossings.rem_euclid(2) == 1)
}
