use anyhow::Result;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;

/// Relative tolerance for geometric degeneracy classification. Applied uniformly,
/// scaled by the magnitudes involved, to the collinearity determinant, the
/// implicit-line touch test and the vertex-between test.
pub const GEOM_EPSILON: f64 = 1e-9;
/// Margin of the raycast start point outside the bounding box, as a fraction of
/// the larger box dimension.
pub const RAY_MARGIN_FACTOR: f64 = 0.1;
/// Number of raycast start points tried before falling back to the
/// vertex-corrected count.
pub const MAX_RAY_ATTEMPTS: usize = 16;
/// Minimum number of vertices for a valid polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub domain_file: String,
    pub particle_num: usize,
    pub particle_mass: f64,
    pub smoothing_length: f64,
    pub boundary_spacing: f64,
    pub boundary_thickness: f64,
    pub timestep: f64,
    pub duration: f64,
    #[serde(default = "default_dump_interval")]
    pub dump_interval: u32,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    pub seed: Option<u64>,
}

fn default_dump_interval() -> u32 {
    1
}

fn default_output_dir() -> String {
    "data".to_string()
}

impl Settings {
    /// Number of time steps implied by the configured duration.
    pub fn max_step(&self) -> u32 {
        (self.duration / self.timestep) as u32
    }
}

pub fn load_default_config() -> Result<Settings> {
    let project_dir = retrieve_project_root();
    let default_config_file = project_dir.join("config/default.toml");

    let settings: Config = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .unwrap_or_else(|err| {
            eprintln!("Error loading configuration: {}", err);
            std::process::exit(1);
        });

    let config: Settings = settings.try_deserialize().unwrap_or_else(|err| {
        eprintln!("Error deserializing configuration: {}", err);
        std::process::exit(1);
    });

    validate_config(&config);

    Ok(config)
}

pub fn load_config() -> Result<Settings> {
    // Try to find the project directory in different ways
    let project_dir = retrieve_project_root();

    let default_config_file = project_dir.join("config/default.toml");
    let local_config = project_dir.join("config/local.toml");

    // Check if local config exists, if not use default
    let config_file = if local_config.exists() {
        println!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        println!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let settings: Config = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("sph2d"))
        .build()
        .unwrap_or_else(|err| {
            eprintln!("Error loading configuration: {}", err);
            std::process::exit(1);
        });

    let mut config: Settings = settings.try_deserialize().unwrap_or_else(|err| {
        eprintln!("Error deserializing configuration: {}", err);
        std::process::exit(1);
    });

    // Parse command-line arguments and override values
    let args = CliArgs::parse();

    if let Some(domain) = args.domain {
        config.domain_file = domain;
    }
    if let Some(num) = args.num {
        config.particle_num = num;
    }
    if let Some(mass) = args.mass {
        config.particle_mass = mass;
    }
    if let Some(h) = args.smoothing {
        config.smoothing_length = h;
    }
    if let Some(spacing) = args.spacing {
        config.boundary_spacing = spacing;
    }
    if let Some(thickness) = args.thickness {
        config.boundary_thickness = thickness;
    }
    if let Some(dt) = args.dt {
        config.timestep = dt;
    }
    if let Some(duration) = args.duration {
        config.duration = duration;
    }
    if let Some(dump) = args.dump {
        config.dump_interval = dump;
    }
    if let Some(out) = args.out {
        config.output_dir = out;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    validate_config(&config);

    println!("{:#?}", config);

    Ok(config)
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the SPH2D_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
/// If none of these methods work, the function will panic.
pub fn retrieve_project_root() -> std::path::PathBuf {
    let project_dir = if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        std::path::PathBuf::from(manifest_dir)
    } else if let Ok(path) = env::var("SPH2D_ROOT_DIR") {
        // Allow explicit configuration via environment variable
        std::path::PathBuf::from(path)
    } else {
        // Fallback: try to find the nearest directory containing a "config" subdirectory
        // Start from the executable directory and walk upward
        let exe_path = env::current_exe().expect("Failed to get current executable path");
        let mut current_dir = exe_path
            .parent()
            .expect("Failed to get executable directory")
            .to_path_buf();
        let mut found = false;

        while !found && current_dir.parent().is_some() {
            if current_dir.join("config").is_dir() {
                found = true;
            } else {
                current_dir = current_dir.parent().unwrap().to_path_buf();
            }
        }

        if found {
            current_dir
        } else {
            panic!("Could not find project root directory");
        }
    };
    project_dir
}

fn validate_config(config: &Settings) {
    assert!(
        config.particle_num > 0,
        "Number of particles must be greater than 0"
    );
    assert!(
        config.particle_mass > 0.0,
        "Particle mass must be greater than 0"
    );
    assert!(
        config.smoothing_length > 0.0,
        "Smoothing length must be greater than 0"
    );
    assert!(
        config.boundary_spacing > 0.0,
        "Boundary spacing must be greater than 0"
    );
    assert!(
        config.boundary_thickness > 0.0,
        "Boundary thickness must be greater than 0"
    );
    assert!(config.timestep > 0.0, "Timestep must be greater than 0");
    assert!(
        config.duration >= config.timestep,
        "Duration must cover at least one timestep"
    );
    assert!(
        config.dump_interval > 0,
        "Dump interval must be greater than 0"
    );
}

#[derive(Parser, Debug)]
#[command(version, about = "sph2d - 2D SPH testbed over polygonal domains")]
pub struct CliArgs {
    /// File path to the domain polygon. One whitespace-separated vertex pair
    /// per line; blank lines and lines starting with '#' are skipped.
    #[arg(short, long)]
    domain: Option<String>,

    /// Number of fluid particles sampled inside the domain.
    #[arg(short, long)]
    num: Option<usize>,

    /// Mass per particle.
    #[arg(short, long)]
    mass: Option<f64>,

    /// Smoothing length in units of the geometry. Also sets the neighbor grid
    /// cell size.
    #[arg(long)]
    smoothing: Option<f64>,

    /// Lattice spacing of the boundary particle scan.
    #[arg(long)]
    spacing: Option<f64>,

    /// Thickness of the boundary particle band outside the domain edge.
    #[arg(long)]
    thickness: Option<f64>,

    /// Integration timestep.
    #[arg(long)]
    dt: Option<f64>,

    /// Total simulated duration.
    #[arg(long)]
    duration: Option<f64>,

    /// Number of steps between state dumps.
    #[arg(long)]
    dump: Option<u32>,

    /// Output directory for state dumps.
    #[arg(short, long)]
    out: Option<String>,

    /// Random seed for particle sampling.
    #[arg(short, long)]
    seed: Option<u64>,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Domain File: {}
  - Particles: {}
  - Particle Mass: {:.6}
  - Smoothing Length: {:.6}
  - Boundary Spacing: {:.6}
  - Boundary Thickness: {:.6}
  - Timestep: {:.6}
  - Duration: {:.6}
  ",
            self.domain_file,
            self.particle_num,
            self.particle_mass,
            self.smoothing_length,
            self.boundary_spacing,
            self.boundary_thickness,
            self.timestep,
            self.duration,
        )
    }
}
