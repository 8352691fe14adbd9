use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use approx::assert_relative_eq;
use crate::assert_float_eq;
use crate::models::Vector3D;
use crate::octree::{Octree, ParticleId};
use crate::particles::Particle;
use crate::utils::{SimulationConfig, VERLET_ACCELERATION_DAMPING};

const DT: f64 = 1.0 / 240.0;

fn octree(extent: f64, capacity: usize, max_depth: u32) -> Octree {
    let config = SimulationConfig {
        threads: Some(4),
        ..SimulationConfig::new(Some(extent), Some(capacity), Some(max_depth), None, None)
    };
    Octree::new(&config).expect("valid configuration")
}

fn add(octree: &mut Octree, position: Vector3D) -> ParticleId {
    octree.add_particle(Particle::new(position, 0.5, 1.0).expect("valid particle"))
}

fn scatter(octree: &mut Octree, count: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let reach = octree.world().half_extent - 1.0;
    for _ in 0..count {
        let position = Vector3D::new(
            rng.random_range(-reach..reach),
            rng.random_range(-reach..reach),
            rng.random_range(-reach..reach),
        );
        add(octree, position);
    }
}

#[test]
fn test_gravity_accumulates_on_every_particle() {
    let mut octree = octree(16.0, 4, 2);
    scatter(&mut octree, 20, 1);
    octree.resolve_gravity();
    octree.for_each_particle(|_, particle| {
        assert_eq!(particle.acceleration, Vector3D::new(0.0, -1000.0, 0.0));
    });
}

#[test]
fn test_update_particles_integrates_and_clears_acceleration() {
    let mut octree = octree(16.0, 4, 2);
    let id = add(&mut octree, Vector3D::new(0.0, 5.0, 0.0));
    octree.resolve_gravity();
    octree.update_particles(DT);

    let particle = octree.particle_snapshot(id);
    assert_float_eq(particle.position.y, 5.0 - 1000.0 * DT * DT * VERLET_ACCELERATION_DAMPING, 1e-12, None);
    assert_eq!(particle.acceleration, Vector3D::ZERO);
}

#[test]
fn test_boundary_phase_clamps_floor_particle() {
    let mut octree = octree(16.0, 16, 3);
    let id = add(&mut octree, Vector3D::new(0.0, -15.8, 0.0));
    octree.particle(id).set_velocity(Vector3D::new(0.0, -10.0, 0.0), DT);

    let checked = octree.resolve_boundary_parallel(DT);
    assert_eq!(checked, 1, "a lone root leaf touches the world boundary");

    let particle = octree.particle_snapshot(id);
    assert_float_eq(particle.position.y, -15.5, 1e-12, None);
    assert_float_eq(particle.velocity(DT).y, 0.25, 1e-9, None);
    assert_eq!(particle.acceleration, octree.gravity());
}

#[test]
fn test_inner_phase_separates_overlapping_pair() {
    let mut octree = octree(16.0, 16, 3);
    let a = add(&mut octree, Vector3D::new(0.0, 0.0, 0.0));
    let b = add(&mut octree, Vector3D::new(0.9, 0.0, 0.0));

    assert_eq!(octree.resolve_inner_collisions_parallel(DT), 1);
    assert_float_eq(octree.particle(a).position.x, -0.05, 1e-12, None);
    assert_float_eq(octree.particle(b).position.x, 0.95, 1e-12, None);
    assert!(octree.inner_queue.is_empty());
}

#[test]
fn test_outer_phase_resolves_straddling_pair_once() {
    let mut octree = octree(4.0, 1, 1);
    let a = add(&mut octree, Vector3D::new(-0.3, -2.0, -2.0));
    let b = add(&mut octree, Vector3D::new(0.3, -2.0, -2.0));

    assert_eq!(octree.resolve_inner_collisions_parallel(DT), 0);
    let (resolved, duplicates) = octree.resolve_outer_collisions_parallel(DT);
    assert_eq!((resolved, duplicates), (1, 1));
    assert_float_eq(octree.particle(a).position.distance(&octree.particle_snapshot(b).position), 1.0, 1e-12, None);
    assert!(octree.outer_queue.is_empty());
}

#[test]
fn test_substep_free_fall() {
    let mut octree = octree(16.0, 16, 3);
    let id = add(&mut octree, Vector3D::new(1.0, 2.0, 3.0));
    let report = octree.substep(DT);

    assert_eq!(report.inner_pairs, 0);
    assert_eq!(report.outer_pairs, 0);
    let particle = octree.particle_snapshot(id);
    assert_relative_eq!(particle.position.y, 2.0 - 1000.0 * DT * DT * VERLET_ACCELERATION_DAMPING, epsilon = 1e-12);
    assert_eq!(particle.position.x, 1.0);
}

#[test]
fn test_substep_moves_particle_between_leaves() {
    let mut octree = octree(4.0, 1, 1);
    let mover = add(&mut octree, Vector3D::new(-0.01, 2.0, 2.0));
    add(&mut octree, Vector3D::new(2.0, -2.0, 2.0));
    octree.particle(mover).set_velocity(Vector3D::new(12.0, 0.0, 0.0), DT);

    let report = octree.substep(DT);
    assert_eq!(report.moved, 1);
    let leaf = octree.find_leaf(&octree.particle_snapshot(mover).position);
    assert!(octree.node(leaf).particles().contains(&mover));
}

#[test]
fn test_substeps_preserve_population_and_residency() {
    let mut octree = octree(16.0, 16, 3);
    scatter(&mut octree, 300, 7);
    let mut nodes = octree.stats().nodes;

    for _ in 0..20 {
        octree.substep(DT);
        let stats = octree.stats();
        assert!(stats.nodes >= nodes, "the tree never collapses");
        nodes = stats.nodes;
        assert_eq!(stats.particles, 300);
    }

    let mut resident: Vec<ParticleId> = octree
        .leaves()
        .into_iter()
        .flat_map(|leaf| octree.node(leaf).particles().to_vec())
        .collect();
    resident.sort_unstable();
    assert_eq!(resident, (0..300).collect::<Vec<_>>());
}

#[test]
fn test_particles_stay_in_world() {
    let mut octree = octree(8.0, 8, 2);
    scatter(&mut octree, 150, 11);
    for _ in 0..60 {
        octree.substep(DT);
    }
    // Integration may carry a particle past a wall; the next boundary phase brings it back.
    octree.resolve_boundary_parallel(DT);
    let world = octree.world();
    octree.for_each_particle(|_, particle| {
        assert!(particle.position.is_finite());
        for axis in 0..3 {
            let offset = (particle.position.axis(axis) - world.center.axis(axis)).abs();
            assert!(offset <= world.half_extent - particle.radius + 1e-9, "particle escaped: {}", particle);
        }
    });
}

#[test]
fn test_centers_never_cross_a_wall_during_substeps() {
    let mut octree = octree(8.0, 8, 2);
    for i in 0..8 {
        for j in 0..4 {
            for k in 0..8 {
                let cell = |n: i32| -5.25 + 1.5 * n as f64;
                add(&mut octree, Vector3D::new(cell(i), -7.0 + 1.5 * j as f64, cell(k)));
            }
        }
    }
    let world = octree.world();
    let positions = |octree: &Octree| {
        (0..octree.stored_particles()).map(|id| octree.particle_snapshot(id).position).collect::<Vec<_>>()
    };

    let mut before = positions(&octree);
    let mut largest_step: f64 = 0.0;
    for _ in 0..240 {
        octree.substep(DT);
        let after = positions(&octree);
        for (start, end) in before.iter().zip(&after) {
            largest_step = largest_step.max(start.distance(end));
            for axis in 0..3 {
                let offset = (end.axis(axis) - world.center.axis(axis)).abs();
                assert!(offset < world.half_extent, "center crossed a wall at {}", end);
            }
        }
        before = after;
    }
    assert!(largest_step < 0.5, "per-substep displacement must stay below the radius, got {}", largest_step);
}

#[test]
fn test_substep_bounces_particle_off_far_wall() {
    let mut octree = octree(8.0, 16, 3);
    let id = add(&mut octree, Vector3D::new(7.75, 0.0, 0.0));
    octree.particle(id).set_velocity(Vector3D::new(4.0, 0.0, 0.0), DT);

    octree.substep(DT);

    let particle = octree.particle_snapshot(id);
    assert_relative_eq!(particle.velocity(DT).x, -4.0 * 0.1 * 0.25, epsilon = 1e-9);
    assert!(particle.position.x < 7.5);
}

#[test]
fn test_substeps_are_deterministic_without_coincident_centers() {
    let build = || {
        let mut octree = octree(16.0, 4, 3);
        for i in 0..12 {
            add(&mut octree, Vector3D::new(-10.0 + 2.0 * i as f64, 0.0, (i % 3) as f64 * 3.0));
        }
        add(&mut octree, Vector3D::new(0.35, 6.0, 0.0));
        add(&mut octree, Vector3D::new(1.05, 6.2, 0.1));
        octree
    };
    let (mut first, mut second) = (build(), build());
    for _ in 0..10 {
        first.substep(DT);
        second.substep(DT);
    }
    for id in 0..first.stored_particles() {
        assert_eq!(first.particle_snapshot(id), second.particle_snapshot(id));
    }
}
