use std::fmt;
use crate::models::Vector3D;
use crate::utils::{SimulationError, VERLET_ACCELERATION_DAMPING};

/// A Verlet-integrated spherical point mass.
///
/// Velocity is never stored: it is always `(position - last_position) / dt`.
/// Setting a velocity therefore relocates `last_position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Current center of the sphere.
    pub position: Vector3D,
    /// Center at the previous step; together with `position` it encodes velocity.
    pub last_position: Vector3D,
    /// Acceleration accumulated since the last integration step.
    pub acceleration: Vector3D,
    /// Particle's mass.
    pub mass: f64,
    /// Particle's radius.
    pub radius: f64,
}

impl Particle {
    /// Creates a new particle at rest.
    ///
    /// # Errors
    ///
    /// Returns an error if `mass` or `radius` is non-positive or not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_verlet::models::Vector3D;
    /// use rs_verlet::particles::Particle;
    ///
    /// let particle = Particle::new(Vector3D::new(1.0, 2.0, 3.0), 0.5, 1.0)
    ///     .expect("Failed to create particle");
    /// assert_eq!(particle.position, particle.last_position);
    /// assert_eq!(particle.velocity(0.016), Vector3D::ZERO);
    ///
    /// assert!(Particle::new(Vector3D::ZERO, 0.5, 0.0).is_err());
    /// ```
    pub fn new(position: Vector3D, radius: f64, mass: f64) -> Result<Self, SimulationError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(SimulationError::InvalidMass);
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SimulationError::InvalidRadius);
        }
        Ok(Particle {
            position,
            last_position: position,
            acceleration: Vector3D::ZERO,
            mass,
            radius,
        })
    }

    /// Velocity derived from the last two positions.
    pub fn velocity(&self, dt: f64) -> Vector3D {
        (self.position - self.last_position) / dt
    }

    /// Makes the derived velocity exactly `velocity` by moving `last_position`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_verlet::models::Vector3D;
    /// use rs_verlet::particles::Particle;
    ///
    /// let mut particle = Particle::new(Vector3D::ZERO, 0.5, 1.0).unwrap();
    /// particle.set_velocity(Vector3D::new(2.0, 0.0, 0.0), 0.5);
    /// assert_eq!(particle.last_position, Vector3D::new(-1.0, 0.0, 0.0));
    /// assert_eq!(particle.velocity(0.5), Vector3D::new(2.0, 0.0, 0.0));
    /// ```
    pub fn set_velocity(&mut self, velocity: Vector3D, dt: f64) {
        self.last_position = self.position - velocity * dt;
    }

    /// Adds `velocity` on top of the current derived velocity.
    pub fn add_velocity(&mut self, velocity: Vector3D, dt: f64) {
        self.last_position -= velocity * dt;
    }

    pub fn accelerate(&mut self, acceleration: Vector3D) {
        self.acceleration += acceleration;
    }

    /// Adds a unit acceleration pointing at `target`, whatever the distance.
    ///
    /// There is no falloff. A particle sitting exactly on `target` has no
    /// direction to move in and is left unchanged.
    pub fn accelerate_toward(&mut self, target: Vector3D) {
        if let Some(direction) = (target - self.position).normalize() {
            self.accelerate(direction);
        }
    }

    /// Advances the particle one step using position Verlet with the default damping factor.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_verlet::models::Vector3D;
    /// use rs_verlet::particles::Particle;
    ///
    /// let mut particle = Particle::new(Vector3D::ZERO, 0.5, 1.0).unwrap();
    /// particle.set_velocity(Vector3D::new(1.0, 0.0, 0.0), 0.1);
    /// particle.update(0.1);
    /// assert!((particle.position.x - 0.1).abs() < 1e-12);
    /// assert_eq!(particle.last_position, Vector3D::ZERO);
    /// ```
    pub fn update(&mut self, dt: f64) {
        self.update_with_damping(dt, VERLET_ACCELERATION_DAMPING);
    }

    /// Advances the particle one step, scaling the acceleration term by `damping`.
    ///
    /// `new = position + (position - last_position) + acceleration * dt² * damping`,
    /// after which the accumulated acceleration is cleared.
    pub fn update_with_damping(&mut self, dt: f64, damping: f64) {
        let displacement = self.position - self.last_position;
        let new_position = self.position + displacement + self.acceleration * (dt * dt * damping);

        self.last_position = self.position;
        self.position = new_position;
        self.acceleration = Vector3D::ZERO;
    }
}

impl fmt::Display for Particle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[position: {}][mass {}][radius {}]", self.position, self.mass, self.radius)
    }
}
