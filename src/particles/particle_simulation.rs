//! The top-level handle to a running particle simulation.
//!
//! A [`Simulation`] owns an [`Octree`] and drives it one frame at a time. Each
//! frame is split into substeps, and every substep runs the same six phases in
//! order: gravity, world boundary, same-leaf collisions, cross-leaf collisions,
//! Verlet integration and re-partitioning. Parallel phases run on the octree's
//! worker pool and fully complete before the next phase begins.
//!
//! # Example
//!
//! ```
//! use rs_verlet::models::Vector3D;
//! use rs_verlet::particles::Simulation;
//! use rs_verlet::utils::SimulationConfig;
//!
//! let mut sim = Simulation::new(SimulationConfig::default()).expect("Failed to create simulation");
//! let id = sim
//!     .spawn(Vector3D::new(0.0, 10.0, 0.0), Vector3D::ZERO, 0.5, 1.0)
//!     .expect("Failed to spawn particle");
//! assert!(id.is_some());
//!
//! sim.advance_frame().expect("Frame failed");
//! assert_eq!(sim.particle_count(), 1);
//! assert!(sim.positions()[0].y < 10.0, "gravity pulls the particle down");
//! ```
use log::debug;
use crate::models::Vector3D;
use crate::octree::{Octree, OctreeStats, ParticleId};
use crate::particles::Particle;
use crate::utils::{SimulationConfig, SimulationError};

/// Tree shape plus the simulation's own counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationStats {
    pub octree: OctreeStats,
    pub substeps_run: u64,
    /// Simulated seconds advanced by [`Simulation::advance_frame`] and [`Simulation::step`].
    pub elapsed: f64,
}

/// A particle world backed by an adaptive octree.
#[derive(Debug)]
pub struct Simulation {
    pub config: SimulationConfig,
    octree: Octree,
    substeps_run: u64,
    elapsed: f64,
}

impl Simulation {
    /// Creates an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the worker pool
    /// cannot be created.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_verlet::particles::Simulation;
    /// use rs_verlet::utils::{SimulationConfig, SimulationError};
    ///
    /// let config = SimulationConfig::new(Some(-1.0), None, None, None, None);
    /// assert_eq!(Simulation::new(config).unwrap_err(), SimulationError::InvalidWorldSize);
    /// ```
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        debug!(
            "simulation config: extent {}, capacity {}, depth {}, substeps {}, ceiling {}",
            config.world_extent, config.node_capacity, config.max_depth, config.substeps, config.max_particles
        );
        let octree = Octree::new(&config)?;
        Ok(Simulation { config, octree, substeps_run: 0, elapsed: 0.0 })
    }

    /// Adds a particle with the given initial velocity.
    ///
    /// The velocity is encoded against the configured substep length, so the
    /// particle's derived velocity during the next step equals `initial_velocity`.
    /// Once the population ceiling is reached the request is dropped and
    /// `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive mass or radius, or a non-finite
    /// position or velocity.
    pub fn spawn(
        &mut self,
        position: Vector3D,
        initial_velocity: Vector3D,
        radius: f64,
        mass: f64,
    ) -> Result<Option<ParticleId>, SimulationError> {
        if !position.is_finite() || !initial_velocity.is_finite() {
            return Err(SimulationError::InvalidPosition);
        }
        let mut particle = Particle::new(position, radius, mass)?;
        if self.particle_count() >= self.config.max_particles {
            debug!("population ceiling of {} reached, spawn ignored", self.config.max_particles);
            return Ok(None);
        }
        particle.set_velocity(initial_velocity, self.config.substep_dt());
        Ok(Some(self.octree.add_particle(particle)))
    }

    /// Number of particles resident in the tree.
    pub fn particle_count(&self) -> usize {
        self.octree.particle_count()
    }

    /// Advances the world by `frame_dt`, split into `substeps` equal substeps.
    ///
    /// # Errors
    ///
    /// Returns an error if `substeps` is zero or `frame_dt` is not a positive finite number.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_verlet::particles::Simulation;
    /// use rs_verlet::utils::{SimulationConfig, SimulationError};
    ///
    /// let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    /// assert_eq!(sim.step(1.0 / 60.0, 0), Err(SimulationError::InvalidSubsteps));
    /// assert_eq!(sim.step(-1.0, 4), Err(SimulationError::InvalidTimeStep));
    /// assert!(sim.step(1.0 / 60.0, 4).is_ok());
    /// assert_eq!(sim.stats().substeps_run, 4);
    /// ```
    pub fn step(&mut self, frame_dt: f64, substeps: u32) -> Result<(), SimulationError> {
        if substeps == 0 {
            return Err(SimulationError::InvalidSubsteps);
        }
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return Err(SimulationError::InvalidTimeStep);
        }
        let dt = frame_dt / substeps as f64;
        for _ in 0..substeps {
            self.octree.substep(dt);
        }
        self.substeps_run += substeps as u64;
        self.elapsed += frame_dt;
        Ok(())
    }

    /// Runs one frame at the configured frame rate and substep count.
    pub fn advance_frame(&mut self) -> Result<(), SimulationError> {
        self.step(self.config.frame_dt(), self.config.substeps)
    }

    /// Runs `frames` consecutive frames.
    pub fn simulate(&mut self, frames: usize) -> Result<(), SimulationError> {
        for _ in 0..frames {
            self.advance_frame()?;
        }
        Ok(())
    }

    /// Nudges every particle within `radius` of `position` toward it.
    /// Returns how many particles were affected.
    pub fn apply_point_force(&mut self, position: Vector3D, radius: f64) -> usize {
        self.octree.apply_point_force(position, radius)
    }

    /// Read-only visit of every particle with its id.
    pub fn for_each_particle<F>(&self, visitor: F)
    where
        F: FnMut(ParticleId, &Particle),
    {
        self.octree.for_each_particle(visitor)
    }

    /// Current positions, in leaf order.
    pub fn positions(&self) -> Vec<Vector3D> {
        let mut positions = Vec::with_capacity(self.particle_count());
        self.for_each_particle(|_, particle| positions.push(particle.position));
        positions
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            octree: self.octree.stats(),
            substeps_run: self.substeps_run,
            elapsed: self.elapsed,
        }
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed
    }

    /// The underlying spatial index.
    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    /// Releases every particle and node, leaving an empty root leaf.
    /// The simulation can be reused afterwards.
    pub fn shutdown(&mut self) {
        let stats = self.octree.stats();
        self.octree.clear();
        debug!(
            "simulation shut down after {} substeps ({} particles, {} nodes released)",
            self.substeps_run, stats.particles, stats.nodes
        );
    }
}
