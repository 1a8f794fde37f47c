use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::settings::MIN_POLYGON_VERTICES;

#[cfg(test)]
mod tests {

    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            Point2::new(0.1, 0.1),
            Point2::new(0.9, 0.1),
            Point2::new(0.9, 0.9),
            Point2::new(0.1, 0.9),
        ])
        .unwrap()
    }

    #[test]
    fn square_aabb() {
        let polygon = unit_square();
        let aabb = polygon.aabb();
        assert_eq!(aabb.min, Point2::new(0.1, 0.1));
        assert_eq!(aabb.max, Point2::new(0.9, 0.9));
        assert!((aabb.width() - 0.8).abs() < 1e-12);
        assert!((aabb.height() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn square_edges_close_the_loop() {
        let polygon = unit_square();
        let edges: Vec<LineSegment> = polygon.edges().collect();
        assert_eq!(edges.len(), 4);
        // wraparound edge connects the last vertex back to the first
        assert_eq!(edges[3].start, Point2::new(0.1, 0.9));
        assert_eq!(edges[3].end, Point2::new(0.1, 0.1));
    }

    #[test]
    fn square_centroid() {
        let polygon = unit_square();
        let centroid = polygon.centroid();
        assert!((centroid.x - 0.5).abs() < 1e-12);
        assert!((centroid.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn too_few_vertices_rejected() {
        let result = Polygon::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn non_finite_vertices_rejected() {
        let result = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, f64::NAN),
            Point2::new(1.0, 1.0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn degenerate_segment() {
        let segment = LineSegment::new(Point2::new(0.3, 0.7), Point2::new(0.3, 0.7));
        assert!(segment.is_degenerate());
        assert_eq!(segment.length(), 0.0);
    }

    #[test]
    fn load_square_domain() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("domains/square.txt");
        let polygon = Polygon::from_file(&path).unwrap();
        assert_eq!(polygon.num_vertices, 4);
        assert_eq!(polygon.vertices[0], Point2::new(0.1, 0.1));
        assert_eq!(polygon.vertices[2], Point2::new(0.9, 0.9));
    }

    #[test]
    fn aabb_expansion() {
        let aabb = unit_square().aabb().expanded(0.05);
        assert!((aabb.min.x - 0.05).abs() < 1e-12);
        assert!((aabb.max.y - 0.95).abs() < 1e-12);
        assert!(aabb.contains(&Point2::new(0.06, 0.94)));
        assert!(!aabb.contains(&Point2::new(0.04, 0.5)));
    }
}

/// A directed line segment between two points.
/// Degenerate (zero length) segments are a valid state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl LineSegment {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    pub fn direction(&self) -> Vector2<f64> {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    pub fn is_degenerate(&self) -> bool {
        self.direction().norm_squared() == 0.0
    }
}

/// Axis-aligned bounding box used as a containment pre-filter and as the
/// extent of the boundary seeding scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Aabb {
    pub fn from_points(points: &[Point2<f64>]) -> Self {
        assert!(!points.is_empty(), "bounding box of an empty point set");

        let (xmin, xmax) = points
            .iter()
            .map(|p| p.x)
            .minmax()
            .into_option()
            .unwrap();
        let (ymin, ymax) = points
            .iter()
            .map(|p| p.y)
            .minmax()
            .into_option()
            .unwrap();

        Self {
            min: Point2::new(xmin, ymin),
            max: Point2::new(xmax, ymax),
        }
    }

    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// The larger of the two box dimensions.
    pub fn max_dimension(&self) -> f64 {
        self.width().max(self.height())
    }

    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }
}

/// A simple polygon as an ordered closed loop of vertices. Edge i connects
/// vertex i to vertex (i+1) mod n, including the wraparound edge.
///
/// Construction enforces at least three finite vertices. Self-intersecting
/// input is not repaired; predicate results over such polygons are
/// implementation-defined.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point2<f64>>, // Ordered loop of vertices
    pub num_vertices: usize,        // Number of vertices in the loop
    aabb: Aabb,                     // Precomputed bounding box
}

impl Polygon {
    pub fn new(vertices: Vec<Point2<f64>>) -> Result<Self> {
        if vertices.len() < MIN_POLYGON_VERTICES {
            return Err(anyhow!(
                "polygon needs at least {} vertices, got {}",
                MIN_POLYGON_VERTICES,
                vertices.len()
            ));
        }
        if let Some(bad) = vertices.iter().find(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(anyhow!("polygon vertex ({}, {}) is not finite", bad.x, bad.y));
        }

        let num_vertices = vertices.len();
        let aabb = Aabb::from_points(&vertices);

        Ok(Self {
            vertices,
            num_vertices,
            aabb,
        })
    }

    /// Loads a polygon from a text file with one whitespace-separated
    /// coordinate pair per line. Blank lines and lines starting with '#'
    /// are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read domain file {:?}", path))?;

        let mut vertices = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let x = tokens
                .next()
                .ok_or_else(|| anyhow!("missing x coordinate on line {}", index + 1))?
                .parse::<f64>()
                .with_context(|| format!("bad x coordinate on line {}", index + 1))?;
            let y = tokens
                .next()
                .ok_or_else(|| anyhow!("missing y coordinate on line {}", index + 1))?
                .parse::<f64>()
                .with_context(|| format!("bad y coordinate on line {}", index + 1))?;

            vertices.push(Point2::new(x, y));
        }

        Self::new(vertices)
    }

    /// Edge i, connecting vertex i to vertex (i+1) mod n.
    pub fn edge(&self, i: usize) -> LineSegment {
        let j = (i + 1) % self.num_vertices;
        LineSegment::new(self.vertices[i], self.vertices[j])
    }

    pub fn edges(&self) -> impl Iterator<Item = LineSegment> + '_ {
        (0..self.num_vertices).map(|i| self.edge(i))
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Arithmetic mean of the vertices.
    pub fn centroid(&self) -> Point2<f64> {
        let sum = self
            .vertices
            .iter()
            .fold(Vector2::zeros(), |acc, v| acc + v.coords);
        Point2::from(sum / self.num_vertices as f64)
    }
}
