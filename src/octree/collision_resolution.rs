use rand::Rng;
use crate::models::Vector3D;
use crate::octree::{Bounds, ParticleId};
use crate::particles::Particle;
use crate::utils::{SolverCoefficients, COINCIDENT_JITTER};

/// Two particles queued for resolution.
///
/// Cross-cell pairs are stored in canonical order (smaller id first) so the
/// same pair found from both sides collapses to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollisionPair {
    pub p1: ParticleId,
    pub p2: ParticleId,
}

impl CollisionPair {
    pub fn new(p1: ParticleId, p2: ParticleId) -> Self {
        CollisionPair { p1, p2 }
    }

    /// Orders the ids so `(a, b)` and `(b, a)` compare equal.
    pub fn canonical(a: ParticleId, b: ParticleId) -> Self {
        CollisionPair { p1: a.min(b), p2: a.max(b) }
    }
}

/// Sphere overlap test, touching included.
pub fn overlaps(a: &Vector3D, a_radius: f64, b: &Vector3D, b_radius: f64) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) <= reach * reach
}

/// Random offset of length [`COINCIDENT_JITTER`], used to separate particles sharing a center.
pub fn random_jitter() -> Vector3D {
    let mut rng = rand::rng();
    for _ in 0..8 {
        let candidate = Vector3D::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        if let Some(direction) = candidate.normalize() {
            return direction * COINCIDENT_JITTER;
        }
    }
    Vector3D::new(COINCIDENT_JITTER, 0.0, 0.0)
}

/// Resolves an overlapping pair: positional separation weighted by mass, then a
/// restitution impulse along the contact normal if the two are approaching.
///
/// Returns `false` when the particles do not overlap, in which case neither is touched.
///
/// # Examples
///
/// ```
/// use rs_verlet::models::Vector3D;
/// use rs_verlet::octree::resolve_collision;
/// use rs_verlet::particles::Particle;
/// use rs_verlet::utils::SolverCoefficients;
///
/// let mut a = Particle::new(Vector3D::new(0.0, 0.0, 0.0), 0.5, 1.0).unwrap();
/// let mut b = Particle::new(Vector3D::new(0.9, 0.0, 0.0), 0.5, 1.0).unwrap();
///
/// assert!(resolve_collision(&mut a, &mut b, 1.0 / 240.0, &SolverCoefficients::default()));
/// assert!((a.position.x + 0.05).abs() < 1e-9);
/// assert!((b.position.x - 0.95).abs() < 1e-9);
/// ```
pub fn resolve_collision(p1: &mut Particle, p2: &mut Particle, dt: f64, coefficients: &SolverCoefficients) -> bool {
    resolve_collision_with(p1, p2, dt, coefficients, random_jitter)
}

/// [`resolve_collision`] with the coincident-center offset supplied by `jitter`.
pub fn resolve_collision_with<J>(
    p1: &mut Particle,
    p2: &mut Particle,
    dt: f64,
    coefficients: &SolverCoefficients,
    jitter: J,
) -> bool
where
    J: FnOnce() -> Vector3D,
{
    let mut delta = p2.position - p1.position;
    let mut distance = delta.length();
    if distance == 0.0 {
        delta = jitter();
        distance = delta.length();
        if distance == 0.0 || !distance.is_finite() {
            return false;
        }
    }

    let radius_sum = p1.radius + p2.radius;
    if distance > radius_sum {
        return false;
    }

    let normal = delta / distance;
    let total_mass = p1.mass + p2.mass;
    let correction = (radius_sum - distance) * coefficients.separation_correction / total_mass;
    p1.position -= normal * (correction * p2.mass);
    p2.position += normal * (correction * p1.mass);

    let v1 = p1.velocity(dt);
    let v2 = p2.velocity(dt);
    let normal_velocity = (v2 - v1).dot(&normal);
    if normal_velocity >= 0.0 {
        return true;
    }

    let impulse = (1.0 + coefficients.collision_restitution) * normal_velocity / total_mass;
    p1.set_velocity((v1 + normal * (impulse * p2.mass)) * coefficients.collision_damping, dt);
    p2.set_velocity((v2 - normal * (impulse * p1.mass)) * coefficients.collision_damping, dt);
    true
}

/// Reflects `velocity` off a wall with inward `normal` if it points into the wall,
/// then scales it by the boundary restitution and damping.
pub fn reflect_velocity(velocity: Vector3D, normal: Vector3D, coefficients: &SolverCoefficients) -> Vector3D {
    let normal_speed = velocity.dot(&normal);
    if normal_speed >= 0.0 {
        return velocity;
    }
    (velocity - normal * (2.0 * normal_speed)) * (coefficients.boundary_restitution * coefficients.boundary_damping)
}

/// Keeps a particle inside `world`.
///
/// On each axis where the sphere touches or crosses a face it is clamped back
/// onto the face and its velocity reflected. The velocity is read once before
/// the clamps and written once after them. A particle that hit any wall gets
/// its acceleration reset to `gravity`. Returns whether a wall was hit.
pub fn resolve_boundary(
    particle: &mut Particle,
    world: &Bounds,
    gravity: Vector3D,
    dt: f64,
    coefficients: &SolverCoefficients,
) -> bool {
    let (min, max) = (world.min(), world.max());
    let radius = particle.radius;
    let mut velocity = particle.velocity(dt);
    let mut hit = false;

    for axis in 0..3 {
        let coordinate = particle.position.axis(axis);
        let (normal, clamped) = if coordinate - radius <= min.axis(axis) {
            (Vector3D::unit_axis(axis, 1.0), min.axis(axis) + radius)
        } else if coordinate + radius >= max.axis(axis) {
            (Vector3D::unit_axis(axis, -1.0), max.axis(axis) - radius)
        } else {
            continue;
        };
        velocity = reflect_velocity(velocity, normal, coefficients);
        *particle.position.axis_mut(axis) = clamped;
        hit = true;
    }

    if hit {
        particle.set_velocity(velocity, dt);
        particle.acceleration = Vector3D::ZERO;
        particle.accelerate(gravity);
    }
    hit
}
