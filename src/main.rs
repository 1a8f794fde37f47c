use sph2d::settings::{self};
use sph2d::simulation::Simulation;

fn main() {
    let settings = settings::load_config().unwrap();
    let mut simulation = Simulation::new(settings).unwrap();

    simulation.run().unwrap();
}
