//! Simulation setup and time stepping.
//!
//! This module takes the runtime settings and assembles everything needed
//! for a run: the domain polygon, the fluid particles sampled inside it,
//! and the static boundary particles seeded around it. The main function
//! only has the job of constructing and running a `Simulation`.
//!
//! Optional collaborators are plain typed fields resolved at construction
//! time; the neighbor grid is rebuilt per step from current positions.

use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::boundary::point_inside_polygon;
use crate::geom::Polygon;
use crate::grid::{index_sort, Grid};
use crate::kernel::kernel_weight;
use crate::output::StateWriter;
use crate::particle::SphParticle;
use crate::seeding::seed_boundary;
use crate::settings::{retrieve_project_root, Settings};

/// Attempted rejection samples per requested particle before giving up.
/// Thin or degenerate domains exhaust this and surface as an error rather
/// than a hang.
const MAX_SAMPLE_FACTOR: usize = 1000;


/// A configured simulation: domain geometry, fluid particles and the static
/// boundary band, plus the writer for state dumps.
#[derive(Debug)]
pub struct Simulation {
    pub settings: Settings,
    pub domain: Polygon,
    pub particles: Vec<SphParticle>,
    pub boundary: Vec<Point2<f64>>,
    writer: StateWriter,
    step: u32,
}

impl Simulation {
    /// Builds a simulation from settings: loads the domain polygon,
    /// rejection-samples the fluid particles uniformly inside it, and seeds
    /// the boundary band around it.
    pub fn new(settings: Settings) -> Result<Self> {
        let domain_path = {
            let path = std::path::PathBuf::from(&settings.domain_file);
            if path.is_absolute() {
                path
            } else {
                retrieve_project_root().join(path)
            }
        };
        let domain = Polygon::from_file(&domain_path)
            .with_context(|| format!("failed to load domain from {:?}", domain_path))?;

        println!(
            "Domain: {} vertices, bounding box {:.3} x {:.3}",
            domain.num_vertices,
            domain.aabb().width(),
            domain.aabb().height()
        );

        let particles = sample_particles(&domain, &settings)?;
        println!("Sampled {} fluid particles", particles.len());

        let boundary = seed_boundary(
            &domain,
            settings.boundary_spacing,
            settings.boundary_thickness,
        );
        println!("Seeded {} boundary particles", boundary.len());

        let writer = StateWriter::new(&settings.output_dir)?;
        writer.dump_boundary(&boundary)?;

        Ok(Self {
            settings,
            domain,
            particles,
            boundary,
            writer,
            step: 0,
        })
    }

    /// Runs the time loop: per step the neighbor grid is rebuilt, particle
    /// densities are recomputed by kernel summation, positions are advected,
    /// and the state is dumped at the configured interval.
    pub fn run(&mut self) -> Result<()> {
        let start = Instant::now();
        let max_step = self.settings.max_step();
        println!("Running {} steps...", max_step);

        // Dump the initial state
        self.update_densities()?;
        self.writer.dump_state(0, &self.particles)?;

        let pb = ProgressBar::new(max_step as u64);
        pb.set_style(
            ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}",
            )
            .unwrap()
            .progress_chars("█▇▆▅▄▃▂▁")
        );
        pb.set_message("step".to_string());

        for step in 1..=max_step {
            self.step = step;
            self.advect();
            self.update_densities()?;

            if self.step % self.settings.dump_interval == 0 {
                self.writer.dump_state(self.step, &self.particles)?;
            }
            pb.inc(1);
        }
        pb.finish();

        let duration = Instant::now().duration_since(start);
        println!(
            "Time taken: {:.2?}, Time per step: {:.2?}",
            duration,
            duration / max_step.max(1)
        );
        println!("Done!");

        Ok(())
    }

    /// Kernel density summation over grid neighbors, including each
    /// particle's own contribution.
    fn update_densities(&mut self) -> Result<()> {
        let h = self.settings.smoothing_length;
        let positions: Vec<Point2<f64>> =
            self.particles.iter().map(|p| p.position()).collect();

        let grid = Grid::build(&positions, h)?;
        index_sort(&mut self.particles, &grid);

        let sorted_positions: Vec<Point2<f64>> =
            self.particles.iter().map(|p| p.position()).collect();
        let grid = Grid::build(&sorted_positions, h)?;

        let densities: Vec<f64> = self
            .particles
            .iter()
            .map(|particle| {
                let position = particle.position();
                grid.neighbor_candidates(&position)
                    .into_iter()
                    .map(|j| {
                        let neighbor = &self.particles[j];
                        let distance = (neighbor.position() - position).norm();
                        neighbor.particle.mass * kernel_weight(distance, h)
                    })
                    .sum()
            })
            .collect();

        for (particle, density) in self.particles.iter_mut().zip(densities) {
            particle.density = density;
        }

        Ok(())
    }

    /// Drifts particle positions along their velocities.
    fn advect(&mut self) {
        let dt = self.settings.timestep;
        for particle in self.particles.iter_mut() {
            let velocity = particle.velocity();
            particle.particle.position += velocity * dt;
        }
    }
}

/// Rejection-samples `particle_num` positions uniformly inside the domain
/// polygon, seeded when the settings carry a seed.
fn sample_particles(domain: &Polygon, settings: &Settings) -> Result<Vec<SphParticle>> {
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let aabb = domain.aabb();
    let mut particles = Vec::with_capacity(settings.particle_num);
    let budget = settings.particle_num * MAX_SAMPLE_FACTOR;

    for _ in 0..budget {
        if particles.len() == settings.particle_num {
            break;
        }
        let candidate = Point2::new(
            aabb.min.x + rng.random_range(0.0..1.0) * aabb.width(),
            aabb.min.y + rng.random_range(0.0..1.0) * aabb.height(),
        );
        if point_inside_polygon(&candidate, domain) {
            particles.push(SphParticle::new(
                settings.particle_mass,
                candidate,
                settings.smoothing_length,
            ));
        }
    }

    if particles.len() < settings.particle_num {
        return Err(anyhow!(
            "only sampled {} of {} particles inside the domain; is the polygon degenerate?",
            particles.len(),
            settings.particle_num
        ));
    }

    Ok(particles)
}
