mod particle;
mod particle_simulation;
mod particle_emitter;

pub use particle::*;
pub use particle_simulation::*;
pub use particle_emitter::*;

#[cfg(test)]
mod particle_simulation_tests;
