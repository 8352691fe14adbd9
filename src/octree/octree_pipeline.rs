use log::trace;
use rayon::prelude::*;
use crate::octree::{resolve_boundary, resolve_collision, CollisionPair, NodeId, Octree};
use super::octree::{lock_particle, particle_mut};

/// What a single substep did, phase by phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubstepReport {
    pub boundary_nodes: usize,
    pub inner_pairs: usize,
    pub outer_pairs: usize,
    /// Cross-cell pairs dropped because they were found from both sides.
    pub duplicate_pairs: usize,
    /// Particles re-partitioned into a different leaf.
    pub moved: usize,
}

impl Octree {
    /// Adds gravity to the accumulated acceleration of every particle.
    pub fn resolve_gravity(&mut self) {
        let gravity = self.gravity;
        let particles = &mut self.particles;
        self.pool.install(|| {
            particles.par_iter_mut().for_each(|cell| particle_mut(cell).accelerate(gravity));
        });
    }

    fn resolve_boundary_node(&self, node: NodeId, dt: f64) {
        for &id in self.nodes[node].particles() {
            let mut particle = lock_particle(&self.particles[id]);
            resolve_boundary(&mut particle, &self.world, self.gravity, dt, &self.solver);
        }
    }

    /// Queues every leaf touching the world boundary and resolves wall contacts
    /// for its particles with batch workers. Returns how many leaves were checked.
    pub fn resolve_boundary_parallel(&self, dt: f64) -> usize {
        let border = self.border_leaves();
        let count = border.len();
        border.into_iter().for_each(|node| self.boundary_queue.push(node));
        self.pool.install(|| {
            self.boundary_queue
                .process_in_batches(self.batch_size, self.max_workers, |node| self.resolve_boundary_node(node, dt));
        });
        count
    }

    /// Locks both particles in ascending id order and resolves them in the pair's orientation.
    fn resolve_pair(&self, pair: CollisionPair, dt: f64) {
        if pair.p1 == pair.p2 {
            return;
        }
        let (low, high) = (pair.p1.min(pair.p2), pair.p1.max(pair.p2));
        let mut first = lock_particle(&self.particles[low]);
        let mut second = lock_particle(&self.particles[high]);
        if pair.p1 == low {
            resolve_collision(&mut first, &mut second, dt, &self.solver);
        } else {
            resolve_collision(&mut second, &mut first, dt, &self.solver);
        }
    }

    /// Detects same-leaf pairs across the whole tree, then resolves the queue.
    /// Returns how many pairs were resolved.
    pub fn resolve_inner_collisions_parallel(&self, dt: f64) -> usize {
        self.pool.install(|| {
            self.detect_inner_collisions(self.root(), &self.inner_queue);
            let pairs = self.inner_queue.len();
            self.inner_queue
                .process_in_batches(self.batch_size, self.max_workers, |pair| self.resolve_pair(pair, dt));
            pairs
        })
    }

    /// Detects cross-leaf pairs, removes the duplicates, then resolves each
    /// remaining pair exactly once. Returns `(resolved, duplicates)`.
    pub fn resolve_outer_collisions_parallel(&self, dt: f64) -> (usize, usize) {
        self.pool.install(|| {
            self.detect_outer_collisions(self.root(), &self.outer_queue);
            let duplicates = self.outer_queue.dedup();
            let pairs = self.outer_queue.len();
            self.outer_queue
                .process_in_batches(self.batch_size, self.max_workers, |pair| self.resolve_pair(pair, dt));
            (pairs, duplicates)
        })
    }

    /// Verlet-integrates every particle.
    pub fn update_particles(&mut self, dt: f64) {
        let damping = self.verlet_damping;
        let particles = &mut self.particles;
        self.pool.install(|| {
            particles
                .par_iter_mut()
                .for_each(|cell| particle_mut(cell).update_with_damping(dt, damping));
        });
    }

    /// Runs one substep: gravity, walls, same-leaf pairs, cross-leaf pairs,
    /// integration, then re-partitioning. Each phase finishes before the next starts.
    pub fn substep(&mut self, dt: f64) -> SubstepReport {
        self.resolve_gravity();
        let boundary_nodes = self.resolve_boundary_parallel(dt);
        let inner_pairs = self.resolve_inner_collisions_parallel(dt);
        let (outer_pairs, duplicate_pairs) = self.resolve_outer_collisions_parallel(dt);
        self.update_particles(dt);
        let moved = self.update_spatial_lookup();

        let report = SubstepReport { boundary_nodes, inner_pairs, outer_pairs, duplicate_pairs, moved };
        trace!("substep: {:?}", report);
        report
    }
}
