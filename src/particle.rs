use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// A point mass with position and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub mass: f64,
    pub position: Point2<f64>,
    pub velocity: Vector2<f64>,
}

impl Particle {
    pub fn at_rest(mass: f64, position: Point2<f64>) -> Self {
        Self {
            mass,
            position,
            velocity: Vector2::zeros(),
        }
    }
}

/// A smoothed particle: a point mass carrying an interaction range and the
/// density interpolated from its neighbors.
///
/// The kernel shape could in principle vary from particle to particle, but
/// this is never done; the kernel is an attribute of the simulation. Only
/// the range is per-particle state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphParticle {
    pub particle: Particle,
    pub range: f64,   // interaction radius for neighbor queries
    pub density: f64, // latest kernel-interpolated density
}

impl SphParticle {
    pub fn new(mass: f64, position: Point2<f64>, range: f64) -> Self {
        Self {
            particle: Particle::at_rest(mass, position),
            range,
            density: 0.0,
        }
    }

    pub fn position(&self) -> Point2<f64> {
        self.particle.position
    }

    pub fn velocity(&self) -> Vector2<f64> {
        self.particle.velocity
    }
}
