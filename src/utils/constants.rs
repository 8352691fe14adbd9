use crate::models::Vector3D;
use crate::utils::{SimulationConfig, SolverCoefficients};

/// Empirical factor applied to `a·dt²` in the Verlet step. It offsets the energy
/// gained by running several substeps per frame and is not physically derived.
pub const VERLET_ACCELERATION_DAMPING: f64 = 0.27;

/// Fraction of a particle's radius added as a safety margin by the near-border test.
pub const NEAR_BORDER_MARGIN: f64 = 1.25;

/// Magnitude of the random offset used when two particle centers coincide.
pub const COINCIDENT_JITTER: f64 = 1e-4;

/// Number of queue items a resolution worker claims per batch.
pub const RESOLUTION_BATCH_SIZE: usize = 10;

/// Upper bound on resolution workers spawned for a single queue.
pub const MAX_RESOLUTION_WORKERS: usize = 4;

pub const DEFAULT_SOLVER_COEFFICIENTS: SolverCoefficients = SolverCoefficients {
    boundary_restitution: 0.1,
    boundary_damping: 0.25,
    collision_restitution: 0.1,
    collision_damping: 0.9,
    separation_correction: 1.0,
};

pub const DEFAULT_SIMULATION_CONFIG: SimulationConfig = SimulationConfig {
    world_center: Vector3D { x: 0.0, y: 0.0, z: 0.0 },
    world_extent: 16.0,
    node_capacity: 16,
    max_depth: 3,
    gravity: Vector3D { x: 0.0, y: -1000.0, z: 0.0 },
    substeps: 4,
    frame_rate: 60.0,
    max_particles: 4000,
    threads: None,
    batch_size: RESOLUTION_BATCH_SIZE,
    max_workers: MAX_RESOLUTION_WORKERS,
    near_border_margin: NEAR_BORDER_MARGIN,
    verlet_damping: VERLET_ACCELERATION_DAMPING,
    solver: DEFAULT_SOLVER_COEFFICIENTS,
};
