use std::f64::consts::PI;
use rand::Rng;
use crate::models::Vector3D;
use crate::octree::ParticleId;
use crate::particles::Simulation;
use crate::utils::{SimulationConfig, SimulationError};

/// Fraction of a full turn between consecutive spiral samples: `(3 - √5)·π`.
pub fn golden_turn() -> f64 {
    (3.0 - 5.0_f64.sqrt()) * PI
}

/// Random vector with every component drawn uniformly from `[min, max)`.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use rs_verlet::particles::random_vector;
///
/// let mut rng = StdRng::seed_from_u64(3);
/// let v = random_vector(-1.0, 1.0, &mut rng);
/// assert!(v.x >= -1.0 && v.x < 1.0);
/// ```
pub fn random_vector<R: Rng + ?Sized>(min: f64, max: f64, rng: &mut R) -> Vector3D {
    if min >= max {
        return Vector3D::splat(min);
    }
    Vector3D::new(rng.random_range(min..max), rng.random_range(min..max), rng.random_range(min..max))
}

/// Feeds a simulation one particle at a time from a fixed spout, fanning the
/// launch velocities out along a golden-angle spiral.
#[derive(Debug, Clone)]
pub struct FountainEmitter {
    pub origin: Vector3D,
    pub radius: f64,
    pub mass: f64,
    /// Scale of the spiral's radial spread and of its vertical component.
    pub spread: f64,
    limit: usize,
    emitted: usize,
}

impl FountainEmitter {
    /// A spout two units below the world's ceiling, emitting unit-mass particles of radius 0.5
    /// until the configured population ceiling.
    pub fn new(config: &SimulationConfig) -> Self {
        let drop = (config.world_extent - 2.0).max(0.0);
        FountainEmitter {
            origin: config.world_center + Vector3D::new(0.0, drop, 0.0),
            radius: 0.5,
            mass: 1.0,
            spread: 10.0,
            limit: config.max_particles,
            emitted: 0,
        }
    }

    /// Launch velocity of the `index`-th particle.
    ///
    /// With `t = index / (limit - 1)`, the radial distance is `spread·√t`, the
    /// angle is `2π·turn·index`, and the velocity is
    /// `(d·cos a, d·sin a, spread·sin(t·π))`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_verlet::models::Vector3D;
    /// use rs_verlet::particles::FountainEmitter;
    /// use rs_verlet::utils::SimulationConfig;
    ///
    /// let emitter = FountainEmitter::new(&SimulationConfig::default());
    /// assert_eq!(emitter.spiral_velocity(0), Vector3D::ZERO);
    /// ```
    pub fn spiral_velocity(&self, index: usize) -> Vector3D {
        let t = index as f64 / self.limit.saturating_sub(1).max(1) as f64;
        let distance = self.spread * t.sqrt();
        let angle = 2.0 * PI * golden_turn() * index as f64;
        Vector3D::new(
            distance * angle.cos(),
            distance * angle.sin(),
            self.spread * (t * PI).sin(),
        )
    }

    /// Spawns the next particle. Returns `Ok(None)` once the simulation is full.
    pub fn emit(&mut self, simulation: &mut Simulation) -> Result<Option<ParticleId>, SimulationError> {
        let velocity = self.spiral_velocity(self.emitted);
        let spawned = simulation.spawn(self.origin, velocity, self.radius, self.mass)?;
        if spawned.is_some() {
            self.emitted += 1;
        }
        Ok(spawned)
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }
}
