// src/utils/constants_config.rs
use crate::models::Vector3D;
use crate::utils::{
    DEFAULT_SIMULATION_CONFIG,
    errors::SimulationError
};

/// Tuning constants for the boundary and pair solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverCoefficients {
    /// Bounciness applied to a velocity reflected off a world wall.
    pub boundary_restitution: f64,
    /// Extra damping applied after the wall restitution.
    pub boundary_damping: f64,
    /// Bounciness used by the pair impulse.
    pub collision_restitution: f64,
    /// Multiplier applied to both velocities after a pair impulse. It bleeds off the
    /// energy the discretized integrator injects into resting contacts.
    pub collision_damping: f64,
    /// Fraction of the overlap removed by positional separation.
    pub separation_correction: f64,
}

impl Default for SolverCoefficients {
    fn default() -> Self {
        crate::utils::DEFAULT_SOLVER_COEFFICIENTS
    }
}

impl SolverCoefficients {
    pub fn validate(&self) -> Result<(), SimulationError> {
        let named = [
            ("boundary_restitution", self.boundary_restitution),
            ("boundary_damping", self.boundary_damping),
            ("collision_restitution", self.collision_restitution),
            ("collision_damping", self.collision_damping),
            ("separation_correction", self.separation_correction),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulationError::InvalidCoefficient(format!(
                    "{} must be finite and non-negative, got {}", name, value
                )));
            }
        }
        Ok(())
    }
}

/// Everything needed to build a [`Simulation`](crate::particles::Simulation).
///
/// The world is the axis-aligned cube `world_center ± world_extent`; the octree root covers it exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub world_center: Vector3D,
    pub world_extent: f64,
    /// Particles a leaf holds before it tries to subdivide.
    pub node_capacity: usize,
    /// Depth budget of the root. Leaves at depth `max_depth` never subdivide.
    pub max_depth: u32,
    pub gravity: Vector3D,
    pub substeps: u32,
    pub frame_rate: f64,
    /// Population ceiling; spawns past it are ignored.
    pub max_particles: usize,
    /// Worker threads for the parallel phases. `None` lets rayon decide.
    pub threads: Option<usize>,
    pub batch_size: usize,
    pub max_workers: usize,
    pub near_border_margin: f64,
    pub verlet_damping: f64,
    pub solver: SolverCoefficients,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        DEFAULT_SIMULATION_CONFIG
    }
}

impl SimulationConfig {
    /// Creates a configuration, falling back to the defaults for every `None`.
    ///
    /// # Example
    /// ```
    /// use rs_verlet::utils::SimulationConfig;
    ///
    /// let config = SimulationConfig::new(Some(8.0), None, Some(2), None, Some(100));
    /// assert_eq!(config.world_extent, 8.0);
    /// assert_eq!(config.node_capacity, 16);
    /// assert_eq!(config.max_depth, 2);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(
        world_extent: Option<f64>,
        node_capacity: Option<usize>,
        max_depth: Option<u32>,
        substeps: Option<u32>,
        max_particles: Option<usize>,
    ) -> Self {
        let default = DEFAULT_SIMULATION_CONFIG;
        Self {
            world_extent: world_extent.unwrap_or(default.world_extent),
            node_capacity: node_capacity.unwrap_or(default.node_capacity),
            max_depth: max_depth.unwrap_or(default.max_depth),
            substeps: substeps.unwrap_or(default.substeps),
            max_particles: max_particles.unwrap_or(default.max_particles),
            ..default
        }
    }

    /// Rejects configurations whose numeric behavior would be undefined.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.world_extent.is_finite() || self.world_extent <= 0.0 {
            return Err(SimulationError::InvalidWorldSize);
        }
        if !(self.world_center.x.is_finite() && self.world_center.y.is_finite() && self.world_center.z.is_finite()) {
            return Err(SimulationError::InvalidWorldSize);
        }
        if self.node_capacity == 0 { return Err(SimulationError::InvalidCapacity); }
        if self.substeps == 0 { return Err(SimulationError::InvalidSubsteps); }
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 { return Err(SimulationError::InvalidTimeStep); }
        if self.batch_size == 0 {
            return Err(SimulationError::InvalidCoefficient("batch_size must be at least 1".to_string()));
        }
        if self.max_workers == 0 {
            return Err(SimulationError::InvalidCoefficient("max_workers must be at least 1".to_string()));
        }
        if self.threads == Some(0) {
            return Err(SimulationError::InvalidCoefficient("threads must be at least 1".to_string()));
        }
        if !self.near_border_margin.is_finite() || self.near_border_margin < 0.0 {
            return Err(SimulationError::InvalidCoefficient("near_border_margin must be finite and non-negative".to_string()));
        }
        if !self.verlet_damping.is_finite() || self.verlet_damping < 0.0 {
            return Err(SimulationError::InvalidCoefficient("verlet_damping must be finite and non-negative".to_string()));
        }
        self.solver.validate()
    }

    /// Wall-clock length of one rendered frame.
    pub fn frame_dt(&self) -> f64 {
        1.0 / self.frame_rate
    }

    pub fn substep_dt(&self) -> f64 {
        self.frame_dt() / self.substeps as f64
    }
}
