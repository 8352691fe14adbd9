use std::sync::{Mutex, MutexGuard, PoisonError};
use log::{debug, trace};
use rayon::prelude::*;
use crate::models::Vector3D;
use crate::octree::{Bounds, CollisionPair, NodeContents, NodeId, OctreeNode, ParticleId, WorkQueue};
use crate::particles::Particle;
use crate::utils::{SimulationConfig, SimulationError, SolverCoefficients};

/// Locks a particle, recovering the data if another worker panicked while holding it.
pub(crate) fn lock_particle(cell: &Mutex<Particle>) -> MutexGuard<'_, Particle> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Exclusive access without locking, for phases that hold `&mut Octree`.
pub(crate) fn particle_mut(cell: &mut Mutex<Particle>) -> &mut Particle {
    cell.get_mut().unwrap_or_else(PoisonError::into_inner)
}

/// Shape of the tree at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OctreeStats {
    pub nodes: usize,
    pub leaves: usize,
    /// Depth of the deepest leaf; the root sits at depth 0.
    pub max_leaf_depth: u32,
    /// Particles resident in leaves.
    pub particles: usize,
}

/// Adaptive spatial index over a fixed cubic world.
///
/// Nodes are stored in an arena indexed by [`NodeId`], with the root at index 0.
/// Particles are stored once in a lock-per-particle store indexed by [`ParticleId`];
/// leaves only hold ids. Every stored particle is resident in exactly one leaf.
///
/// Structural changes (insertion, subdivision, re-partitioning) take `&mut self`,
/// while the detection and resolution phases share `&self` across the worker pool.
///
/// # Examples
///
/// ```
/// use rs_verlet::models::Vector3D;
/// use rs_verlet::octree::Octree;
/// use rs_verlet::particles::Particle;
/// use rs_verlet::utils::SimulationConfig;
///
/// let config = SimulationConfig::new(Some(4.0), Some(2), Some(2), None, None);
/// let mut octree = Octree::new(&config).unwrap();
/// for x in [-3.0, -1.0, 1.0] {
///     octree.add_particle(Particle::new(Vector3D::new(x, 0.0, 0.0), 0.1, 1.0).unwrap());
/// }
///
/// assert_eq!(octree.particle_count(), 3);
/// assert!(!octree.node(octree.root()).is_leaf(), "three particles overflow a capacity of two");
/// ```
#[derive(Debug)]
pub struct Octree {
    pub(crate) nodes: Vec<OctreeNode>,
    pub(crate) particles: Vec<Mutex<Particle>>,
    pub(crate) world: Bounds,
    pub(crate) gravity: Vector3D,
    pub(crate) capacity: usize,
    pub(crate) max_depth: u32,
    pub(crate) near_border_margin: f64,
    pub(crate) verlet_damping: f64,
    pub(crate) solver: SolverCoefficients,
    pub(crate) batch_size: usize,
    pub(crate) max_workers: usize,
    pub(crate) inner_queue: WorkQueue<CollisionPair>,
    pub(crate) outer_queue: WorkQueue<CollisionPair>,
    pub(crate) boundary_queue: WorkQueue<NodeId>,
    pub(crate) pool: rayon::ThreadPool,
}

const ROOT: NodeId = 0;

impl Octree {
    /// Builds an empty tree whose root covers the configured world exactly.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or the worker pool cannot be started.
    pub fn new(config: &SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|index| format!("rs-verlet-worker-{}", index));
        if let Some(threads) = config.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| SimulationError::ThreadPool(e.to_string()))?;
        debug!("octree worker pool started with {} threads", pool.current_num_threads());

        let world = Bounds::new(config.world_center, config.world_extent);
        let mut octree = Octree {
            nodes: Vec::new(),
            particles: Vec::new(),
            world,
            gravity: config.gravity,
            capacity: config.node_capacity,
            max_depth: config.max_depth,
            near_border_margin: config.near_border_margin,
            verlet_damping: config.verlet_damping,
            solver: config.solver,
            batch_size: config.batch_size,
            max_workers: config.max_workers,
            inner_queue: WorkQueue::new(),
            outer_queue: WorkQueue::new(),
            boundary_queue: WorkQueue::new(),
            pool,
        };
        octree.reset_root();
        Ok(octree)
    }

    fn reset_root(&mut self) {
        self.nodes.clear();
        self.nodes.push(OctreeNode::new(self.world, self.capacity, self.max_depth, 0, None, &self.world));
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn world(&self) -> Bounds {
        self.world
    }

    pub fn gravity(&self) -> Vector3D {
        self.gravity
    }

    pub fn solver(&self) -> &SolverCoefficients {
        &self.solver
    }

    pub fn node(&self, id: NodeId) -> &OctreeNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    /// Locks and returns the particle with the given id.
    pub fn particle(&self, id: ParticleId) -> MutexGuard<'_, Particle> {
        lock_particle(&self.particles[id])
    }

    /// Copy of a particle's current state.
    pub fn particle_snapshot(&self, id: ParticleId) -> Particle {
        self.particle(id).clone()
    }

    pub fn stored_particles(&self) -> usize {
        self.particles.len()
    }

    /// Number of particles resident in leaves, summed over the whole tree.
    pub fn particle_count(&self) -> usize {
        self.nodes.iter().map(|node| node.particles().len()).sum()
    }

    /// Adds a particle to the store and routes it from the root into its leaf.
    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        let id = self.particles.len();
        self.particles.push(Mutex::new(particle));
        self.insert(id);
        id
    }

    pub(crate) fn position_of(&self, id: ParticleId) -> Vector3D {
        self.particle(id).position
    }

    fn insert(&mut self, id: ParticleId) {
        self.insert_below(ROOT, id);
    }

    /// Places a stored particle in the leaf under `node` that contains it.
    /// An internal `node` routes the particle down by octant first.
    pub(crate) fn insert_below(&mut self, node: NodeId, id: ParticleId) {
        let position = self.position_of(id);
        let leaf = self.descend(node, &position);
        let node = &mut self.nodes[leaf];
        if let NodeContents::Leaf(ids) = &mut node.contents {
            ids.push(id);
        }
        let (split, resident, depth) = (node.should_subdivide(), node.particles().len(), node.depth);
        if split {
            self.subdivide(leaf);
        } else if resident > self.capacity {
            trace!("leaf {} at depth {} holds {} particles past capacity", leaf, depth, resident);
        }
    }

    /// Turns a leaf into an internal node and pushes its particles one level down.
    /// Children that overflow subdivide in turn while their budget lasts.
    fn subdivide(&mut self, node_id: NodeId) {
        let node = &self.nodes[node_id];
        if !node.is_leaf() || node.depth_budget == 0 {
            return;
        }
        let (bounds, budget, depth) = (node.bounds, node.depth_budget, node.depth);

        let first_child = self.nodes.len();
        for index in 0..8 {
            let child = OctreeNode::new(
                bounds.child_bounds(index),
                self.capacity,
                budget - 1,
                depth + 1,
                Some(node_id),
                &self.world,
            );
            self.nodes.push(child);
        }
        let children: [NodeId; 8] = std::array::from_fn(|index| first_child + index);

        let residents = match std::mem::replace(&mut self.nodes[node_id].contents, NodeContents::Internal(children)) {
            NodeContents::Leaf(ids) => ids,
            NodeContents::Internal(_) => Vec::new(),
        };
        for id in residents {
            let child = children[bounds.child_index(&self.position_of(id))];
            self.insert_below(child, id);
        }
    }

    /// Descends from the root to the leaf whose octant path matches `position`.
    ///
    /// Positions outside the world still resolve to a border leaf.
    pub fn find_leaf(&self, position: &Vector3D) -> NodeId {
        self.descend(ROOT, position)
    }

    fn descend(&self, from: NodeId, position: &Vector3D) -> NodeId {
        let mut current = from;
        while let NodeContents::Internal(children) = &self.nodes[current].contents {
            current = children[self.nodes[current].bounds.child_index(position)];
        }
        current
    }

    /// Every leaf in depth-first order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            match &self.nodes[id].contents {
                NodeContents::Leaf(_) => leaves.push(id),
                NodeContents::Internal(children) => stack.extend(children.iter().rev()),
            }
        }
        leaves
    }

    /// Leaves touching the world boundary; only these need wall checks.
    pub fn border_leaves(&self) -> Vec<NodeId> {
        self.leaves()
            .into_iter()
            .filter(|&id| !self.nodes[id].world_interior)
            .collect()
    }

    /// Leaves that share a full face with `leaf`.
    ///
    /// Only same-sized leaves qualify, so a leaf bordering a deeper or shallower
    /// subtree finds no neighbors there.
    pub fn adjacent_leaves(&self, leaf: NodeId) -> Vec<NodeId> {
        let target = &self.nodes[leaf];
        let mut found = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.bounds.touches(&target.bounds) {
                continue;
            }
            match &node.contents {
                NodeContents::Leaf(_) => {
                    if id != leaf && target.is_adjacent(node) {
                        found.push(id);
                    }
                }
                NodeContents::Internal(children) => stack.extend(children.iter()),
            }
        }
        found
    }

    /// Non-empty leaves whose box intersects the sphere at `position`.
    pub fn leaves_near(&self, position: &Vector3D, radius: f64) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.bounds.intersects_sphere(position, radius) {
                continue;
            }
            match &node.contents {
                NodeContents::Leaf(ids) if !ids.is_empty() => found.push(id),
                NodeContents::Leaf(_) => {}
                NodeContents::Internal(children) => stack.extend(children.iter()),
            }
        }
        found
    }

    /// Pulls every particle within `radius` of `position` toward it with a unit acceleration.
    /// Returns how many particles were affected.
    pub fn apply_point_force(&mut self, position: Vector3D, radius: f64) -> usize {
        if !radius.is_finite() || radius <= 0.0 || !position.is_finite() {
            return 0;
        }
        let mut affected = 0;
        for leaf in self.leaves_near(&position, radius) {
            for &id in self.nodes[leaf].particles() {
                let mut particle = lock_particle(&self.particles[id]);
                if particle.position.distance(&position) <= radius {
                    particle.accelerate_toward(position);
                    affected += 1;
                }
            }
        }
        affected
    }

    /// Calls `visitor` with a snapshot of every resident particle, leaf by leaf.
    /// No lock is held while the visitor runs, so it may query the tree.
    pub fn for_each_particle<F>(&self, mut visitor: F)
    where
        F: FnMut(ParticleId, &Particle),
    {
        for leaf in self.leaves() {
            for &id in self.nodes[leaf].particles() {
                let snapshot = self.particle_snapshot(id);
                visitor(id, &snapshot);
            }
        }
    }

    fn misplaced_in(&self, leaf: NodeId) -> Vec<(NodeId, ParticleId)> {
        self.nodes[leaf]
            .particles()
            .iter()
            .filter(|&&id| self.find_leaf(&self.position_of(id)) != leaf)
            .map(|&id| (leaf, id))
            .collect()
    }

    /// Moves every particle whose position left its leaf into the correct one.
    ///
    /// Misplaced particles are collected first, then all of them are removed,
    /// then each is re-inserted from the root. A particle therefore cannot be
    /// re-examined after moving, and none is lost or duplicated. Returns how many moved.
    pub fn update_spatial_lookup(&mut self) -> usize {
        let leaves = self.leaves();
        let movers: Vec<(NodeId, ParticleId)> = self.pool.install(|| {
            leaves.par_iter().flat_map_iter(|&leaf| self.misplaced_in(leaf)).collect()
        });

        for &(leaf, id) in &movers {
            if let NodeContents::Leaf(ids) = &mut self.nodes[leaf].contents {
                if let Some(slot) = ids.iter().position(|&resident| resident == id) {
                    ids.swap_remove(slot);
                }
            }
        }
        for &(_, id) in &movers {
            self.insert(id);
        }
        movers.len()
    }

    /// Reports node count, leaf count, deepest leaf depth and resident particles.
    pub fn stats(&self) -> OctreeStats {
        let leaves = self.leaves();
        OctreeStats {
            nodes: self.nodes.len(),
            leaves: leaves.len(),
            max_leaf_depth: leaves.iter().map(|&id| self.nodes[id].depth).max().unwrap_or(0),
            particles: self.particle_count(),
        }
    }

    /// Drops every particle and collapses the tree back to an empty root leaf.
    pub fn clear(&mut self) {
        self.inner_queue.drain();
        self.outer_queue.drain();
        self.boundary_queue.drain();
        self.particles.clear();
        self.reset_root();
        debug!("octree cleared");
    }
}
