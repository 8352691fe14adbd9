//! Parallel Verlet particle simulation over an adaptive octree.
//!
//! Particles live in a fixed cubic world. Each substep runs gravity, wall
//! collisions, same-leaf and cross-leaf particle collisions, Verlet
//! integration and re-partitioning, with the collision phases spread over a
//! dedicated worker pool.
pub mod utils;
pub mod models;
pub mod particles;
pub mod octree;

/// ### General helper function
/// - Asserts that two floating point numbers are approximately equal.
///
/// ### Arguments
///
/// * `a` - The first floating point number.
/// * `b` - The second floating point number.
/// * `epsilon` - The maximum difference between `a` and `b` for them to be considered equal.
/// * `optional_message` - An optional message to display if the assertion fails.
///
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64, optional_message: Option<&str>) {
    match optional_message {
        Some(message) => assert!((a - b).abs() < epsilon, "a: {:?},\nb: {:?},\nepsilon: {:?},\n message: {:?}", a, b, epsilon, message),
        None => assert!((a - b).abs() < epsilon, "Expected {} to be approximately equal to {} (epsilon: {})", a, b, epsilon),
    }
}
