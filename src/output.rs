use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use nalgebra::Point2;

use crate::particle::SphParticle;

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn position_dump_round_trips_through_disk() {
        let dir = std::env::temp_dir().join("sph2d_output_test");
        let writer = StateWriter::new(&dir).unwrap();

        let particles = vec![
            SphParticle::new(1.0, Point2::new(0.25, 0.5), 0.1),
            SphParticle::new(1.0, Point2::new(0.75, 0.5), 0.1),
        ];
        writer.dump_state(3, &particles).unwrap();

        let contents = fs::read_to_string(dir.join("positions/3.csv")).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "0,0.25,0.5");
        assert_eq!(lines.next().unwrap(), "1,0.75,0.5");

        let contents = fs::read_to_string(dir.join("velocities/3.csv")).unwrap();
        assert_eq!(contents.lines().next().unwrap(), "0,0,0");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn boundary_dump_lists_every_seed() {
        let dir = std::env::temp_dir().join("sph2d_boundary_test");
        let writer = StateWriter::new(&dir).unwrap();

        let seeds = vec![Point2::new(0.0, 0.1), Point2::new(0.2, 0.3)];
        writer.dump_boundary(&seeds).unwrap();

        let contents = fs::read_to_string(dir.join("boundary.csv")).unwrap();
        assert_eq!(contents.lines().count(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}

/// Writes per-step particle state as CSV files under one output directory:
/// `positions/<step>.csv` and `velocities/<step>.csv`, with the seeded
/// boundary written once to `boundary.csv`. Rows are `index,x,y`.
#[derive(Debug, Clone)]
pub struct StateWriter {
    positions_dir: PathBuf,
    velocities_dir: PathBuf,
    boundary_file: PathBuf,
}

impl StateWriter {
    /// Creates the output directory layout, including parents.
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        let positions_dir = output_dir.join("positions");
        let velocities_dir = output_dir.join("velocities");

        fs::create_dir_all(&positions_dir)
            .with_context(|| format!("failed to create {:?}", positions_dir))?;
        fs::create_dir_all(&velocities_dir)
            .with_context(|| format!("failed to create {:?}", velocities_dir))?;

        Ok(Self {
            positions_dir,
            velocities_dir,
            boundary_file: output_dir.join("boundary.csv"),
        })
    }

    /// Dumps particle positions and velocities for one step.
    pub fn dump_state(&self, step: u32, particles: &[SphParticle]) -> Result<()> {
        let path = self.positions_dir.join(format!("{}.csv", step));
        let mut writer = BufWriter::new(File::create(&path)?);
        for (i, particle) in particles.iter().enumerate() {
            let position = particle.position();
            writeln!(writer, "{},{},{}", i, position.x, position.y)?;
        }

        let path = self.velocities_dir.join(format!("{}.csv", step));
        let mut writer = BufWriter::new(File::create(&path)?);
        for (i, particle) in particles.iter().enumerate() {
            let velocity = particle.velocity();
            writeln!(writer, "{},{},{}", i, velocity.x, velocity.y)?;
        }

        Ok(())
    }

    /// Dumps the static boundary particle positions.
    pub fn dump_boundary(&self, seeds: &[Point2<f64>]) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.boundary_file)?);
        for (i, seed) in seeds.iter().enumerate() {
            writeln!(writer, "{},{},{}", i, seed.x, seed.y)?;
        }

        Ok(())
    }
}
