use approx::assert_relative_eq;
use crate::assert_float_eq;
use crate::models::Vector3D;
use crate::particles::{FountainEmitter, Simulation};
use crate::utils::{SimulationConfig, SimulationError};

fn config() -> SimulationConfig {
    SimulationConfig { threads: Some(2), ..SimulationConfig::default() }
}

fn weightless() -> SimulationConfig {
    SimulationConfig { gravity: Vector3D::ZERO, ..config() }
}

#[test]
fn test_new_simulation_is_empty() {
    let sim = Simulation::new(config()).expect("Failed to create simulation");
    assert_eq!(sim.particle_count(), 0);
    let stats = sim.stats();
    assert_eq!(stats.octree.nodes, 1);
    assert_eq!(stats.substeps_run, 0);
    assert_eq!(sim.elapsed_time(), 0.0);
}

#[test]
fn test_new_rejects_invalid_config() {
    let bad_capacity = SimulationConfig { node_capacity: 0, ..config() };
    assert_eq!(Simulation::new(bad_capacity).unwrap_err(), SimulationError::InvalidCapacity);
    let bad_substeps = SimulationConfig { substeps: 0, ..config() };
    assert_eq!(Simulation::new(bad_substeps).unwrap_err(), SimulationError::InvalidSubsteps);
}

#[test]
fn test_spawn_assigns_sequential_ids() {
    let mut sim = Simulation::new(config()).unwrap();
    let a = sim.spawn(Vector3D::new(1.0, 0.0, 0.0), Vector3D::ZERO, 0.5, 1.0).unwrap();
    let b = sim.spawn(Vector3D::new(-1.0, 0.0, 0.0), Vector3D::ZERO, 0.5, 1.0).unwrap();
    assert_eq!((a, b), (Some(0), Some(1)));
    assert_eq!(sim.particle_count(), 2);
}

#[test]
fn test_spawn_encodes_velocity_for_substep() {
    let mut sim = Simulation::new(config()).unwrap();
    let velocity = Vector3D::new(3.0, 4.0, -1.0);
    let id = sim.spawn(Vector3D::ZERO, velocity, 0.5, 1.0).unwrap().unwrap();
    let derived = sim.octree().particle(id).velocity(sim.config.substep_dt());
    assert_float_eq(derived.distance(&velocity), 0.0, 1e-9, None);
}

#[test]
fn test_spawn_past_ceiling_is_ignored() {
    let mut sim = Simulation::new(SimulationConfig { max_particles: 3, ..config() }).unwrap();
    for i in 0..3 {
        assert!(sim.spawn(Vector3D::new(i as f64, 0.0, 0.0), Vector3D::ZERO, 0.5, 1.0).unwrap().is_some());
    }
    assert_eq!(sim.spawn(Vector3D::ZERO, Vector3D::ZERO, 0.5, 1.0), Ok(None));
    assert_eq!(sim.particle_count(), 3);
}

#[test]
fn test_spawn_rejects_invalid_particles() {
    let mut sim = Simulation::new(config()).unwrap();
    assert_eq!(sim.spawn(Vector3D::ZERO, Vector3D::ZERO, 0.5, 0.0), Err(SimulationError::InvalidMass));
    assert_eq!(sim.spawn(Vector3D::ZERO, Vector3D::ZERO, -0.5, 1.0), Err(SimulationError::InvalidRadius));
    assert_eq!(
        sim.spawn(Vector3D::new(f64::NAN, 0.0, 0.0), Vector3D::ZERO, 0.5, 1.0),
        Err(SimulationError::InvalidPosition)
    );
    assert_eq!(
        sim.spawn(Vector3D::ZERO, Vector3D::new(0.0, f64::INFINITY, 0.0), 0.5, 1.0),
        Err(SimulationError::InvalidPosition)
    );
    assert_eq!(sim.particle_count(), 0);
}

#[test]
fn test_step_validates_arguments() {
    let mut sim = Simulation::new(config()).unwrap();
    assert_eq!(sim.step(1.0 / 60.0, 0), Err(SimulationError::InvalidSubsteps));
    assert_eq!(sim.step(0.0, 4), Err(SimulationError::InvalidTimeStep));
    assert_eq!(sim.step(f64::NAN, 4), Err(SimulationError::InvalidTimeStep));
    assert_eq!(sim.stats().substeps_run, 0);
}

#[test]
fn test_advance_frame_tracks_time_and_substeps() {
    let mut sim = Simulation::new(config()).unwrap();
    sim.spawn(Vector3D::ZERO, Vector3D::ZERO, 0.5, 1.0).unwrap();
    sim.simulate(3).expect("Simulation failed");

    let stats = sim.stats();
    assert_eq!(stats.substeps_run, 12);
    assert_relative_eq!(stats.elapsed, 3.0 / 60.0, epsilon = 1e-12);
    assert_relative_eq!(sim.elapsed_time(), stats.elapsed);
}

#[test]
fn test_overlapping_pair_is_separated_after_step() {
    let mut sim = Simulation::new(weightless()).unwrap();
    sim.spawn(Vector3D::new(0.0, 0.0, 0.0), Vector3D::ZERO, 0.5, 1.0).unwrap();
    sim.spawn(Vector3D::new(0.9, 0.0, 0.0), Vector3D::ZERO, 0.5, 1.0).unwrap();
    sim.step(1.0 / 60.0, 1).unwrap();

    let positions = sim.positions();
    assert!(positions[0].distance(&positions[1]) >= 1.0 - 1e-9);
    assert_float_eq(positions[0].y, 0.0, 1e-12, Some("no motion off the contact axis"));
}

#[test]
fn test_particles_fall_under_gravity() {
    let mut sim = Simulation::new(config()).unwrap();
    sim.spawn(Vector3D::new(0.0, 8.0, 0.0), Vector3D::ZERO, 0.5, 1.0).unwrap();
    let mut last = 8.0;
    for _ in 0..5 {
        sim.advance_frame().unwrap();
        let y = sim.positions()[0].y;
        assert!(y < last, "particle must keep falling");
        last = y;
    }
}

#[test]
fn test_resting_particle_settles_on_floor() {
    let mut sim = Simulation::new(config()).unwrap();
    sim.spawn(Vector3D::new(0.0, -14.0, 0.0), Vector3D::ZERO, 0.5, 1.0).unwrap();
    sim.simulate(120).unwrap();
    let y = sim.positions()[0].y;
    assert!(y >= -16.0 && y < -15.0, "particle should rest near the floor, got {}", y);
}

#[test]
fn test_point_force_pulls_nearby_particles() {
    let mut sim = Simulation::new(weightless()).unwrap();
    sim.spawn(Vector3D::new(2.0, 0.0, 0.0), Vector3D::ZERO, 0.5, 1.0).unwrap();
    sim.spawn(Vector3D::new(14.0, 0.0, 0.0), Vector3D::ZERO, 0.5, 1.0).unwrap();

    assert_eq!(sim.apply_point_force(Vector3D::ZERO, 10.0), 1);
    sim.advance_frame().unwrap();

    let mut positions = Vec::new();
    sim.for_each_particle(|id, particle| positions.push((id, particle.position.x)));
    positions.sort_by_key(|&(id, _)| id);
    assert!(positions[0].1 < 2.0, "near particle moves toward the point");
    assert_eq!(positions[1].1, 14.0, "far particle stays put");
}

#[test]
fn test_positions_match_particle_count() {
    let mut sim = Simulation::new(config()).unwrap();
    let mut emitter = FountainEmitter::new(&sim.config);
    for _ in 0..25 {
        emitter.emit(&mut sim).unwrap();
        sim.advance_frame().unwrap();
    }
    assert_eq!(sim.positions().len(), sim.particle_count());
    assert_eq!(sim.particle_count(), 25);
}

#[test]
fn test_identical_runs_match() {
    let run = || {
        let mut sim = Simulation::new(config()).unwrap();
        for i in 0..10 {
            let position = Vector3D::new(-9.0 + 2.0 * i as f64, 4.0, (i % 2) as f64);
            sim.spawn(position, Vector3D::new(1.0, 0.0, 0.5), 0.5, 1.0).unwrap();
        }
        sim.simulate(10).unwrap();
        let mut states = Vec::new();
        sim.for_each_particle(|id, particle| states.push((id, particle.clone())));
        states.sort_by_key(|(id, _)| *id);
        states
    };
    assert_eq!(run(), run());
}

#[test]
fn test_shutdown_releases_everything_and_allows_reuse() {
    let mut sim = Simulation::new(config()).unwrap();
    let mut emitter = FountainEmitter::new(&sim.config);
    for _ in 0..40 {
        emitter.emit(&mut sim).unwrap();
    }
    sim.advance_frame().unwrap();
    sim.shutdown();

    assert_eq!(sim.particle_count(), 0);
    assert_eq!(sim.stats().octree.nodes, 1);
    assert!(sim.spawn(Vector3D::ZERO, Vector3D::ZERO, 0.5, 1.0).unwrap().is_some());
    sim.advance_frame().unwrap();
    assert_eq!(sim.particle_count(), 1);
}

#[test]
fn test_single_worker_pool() {
    let mut sim = Simulation::new(SimulationConfig { threads: Some(1), ..SimulationConfig::default() }).unwrap();
    let mut emitter = FountainEmitter::new(&sim.config);
    for _ in 0..50 {
        emitter.emit(&mut sim).unwrap();
        sim.advance_frame().unwrap();
    }
    assert_eq!(sim.particle_count(), 50);
}
