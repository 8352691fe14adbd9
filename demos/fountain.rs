// demos/fountain.rs
//
// Run with `RUST_LOG=debug cargo run --release --example fountain`.

use log::info;
use rs_verlet::models::Vector3D;
use rs_verlet::particles::{FountainEmitter, Simulation};
use rs_verlet::utils::{SimulationConfig, SimulationError};

fn main() -> Result<(), SimulationError> {
    env_logger::init();

    let config = SimulationConfig::default();
    let mut sim = Simulation::new(config)?;
    let mut emitter = FountainEmitter::new(&config);

    // Ten simulated seconds at the configured frame rate.
    let frames = (config.frame_rate * 10.0) as usize;
    let per_second = (config.frame_rate as usize).max(1);
    for frame in 0..frames {
        emitter.emit(&mut sim)?;

        // Stir the pile once a second, like a mouse push at the floor's center.
        if frame % per_second == 0 {
            let push = Vector3D::new(0.0, -config.world_extent + 2.0, 0.0);
            let affected = sim.apply_point_force(push, 10.0);
            info!("frame {}: pushed {} particles", frame, affected);
        }

        sim.advance_frame()?;

        if frame % per_second == 0 {
            let stats = sim.stats();
            info!(
                "t = {:.2}s: {} particles, {} nodes, {} leaves, deepest leaf {}",
                stats.elapsed,
                stats.octree.particles,
                stats.octree.nodes,
                stats.octree.leaves,
                stats.octree.max_leaf_depth
            );
        }
    }

    let lowest = sim
        .positions()
        .into_iter()
        .map(|position| position.y)
        .fold(f64::INFINITY, f64::min);
    println!("Simulated {} particles for {:.1}s", sim.particle_count(), sim.elapsed_time());
    println!("Lowest particle rests at y = {:.3}", lowest);

    sim.shutdown();
    Ok(())
}
