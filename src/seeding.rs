//! Boundary particle placement around a polygonal domain.
//!
//! Solid walls are represented by a band of static particles hugging the
//! outside of the domain polygon. The band is produced by scanning a
//! regular lattice of candidate points over the polygon's bounding box,
//! expanded by the band thickness, and keeping the candidates that sit
//! outside the domain but within the thickness of the nearest edge.
//! Every candidate is an independent pure-predicate evaluation, so the
//! scan is distributed across the rayon pool.

use itertools::Itertools;
use nalgebra::Point2;
use rayon::prelude::*;

use crate::boundary::{distance_to_boundary, point_inside_polygon};
use crate::geom::Polygon;


/// Seeds boundary particles on a lattice of `spacing` over the polygon's
/// expanded bounding box. A lattice point becomes a boundary particle when
/// it lies outside the domain and within `thickness` of the nearest edge.
pub fn seed_boundary(polygon: &Polygon, spacing: f64, thickness: f64) -> Vec<Point2<f64>> {
    let scan = polygon.aabb().expanded(thickness);

    let nx = (scan.width() / spacing).ceil() as usize + 1;
    let ny = (scan.height() / spacing).ceil() as usize + 1;

    let lattice: Vec<Point2<f64>> = (0..nx)
        .cartesian_product(0..ny)
        .map(|(ix, iy)| {
            Point2::new(
                scan.min.x + ix as f64 * spacing,
                scan.min.y + iy as f64 * spacing,
            )
        })
        .collect();

    lattice
        .into_par_iter()
        .filter(|candidate| {
            !point_inside_polygon(candidate, polygon)
                && distance_to_boundary(candidate, polygon) <= thickness
        })
        .collect()
}
