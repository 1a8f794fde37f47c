//! Prototype 2D smoothed particle hydrodynamics testbed.
//!
//! The core of the crate is the exact polygon boundary machinery in
//! [`geom`] and [`boundary`]: containment, edge distance and segment
//! intersection predicates over polygonal simulation domains. The
//! remaining modules build a small simulation around those predicates:
//! interior particle sampling, boundary particle seeding, neighbor
//! search, kernel interpolation and per-step state dumps.

pub mod boundary;
pub mod geom;
pub mod grid;
pub mod kernel;
pub mod output;
pub mod particle;
pub mod seeding;
pub mod settings;
pub mod simulation;
