use crate::models::Vector3D;
use crate::octree::{overlaps, CollisionPair, NodeContents, NodeId, Octree, ParticleId, WorkQueue};

/// Position and radius of a particle, copied out of its lock for pair tests.
#[derive(Debug, Clone, Copy)]
struct Body {
    id: ParticleId,
    position: Vector3D,
    radius: f64,
}

impl Octree {
    fn bodies(&self, ids: &[ParticleId]) -> Vec<Body> {
        ids.iter()
            .map(|&id| {
                let particle = self.particle(id);
                Body { id, position: particle.position, radius: particle.radius }
            })
            .collect()
    }

    /// Fork-join scan of the subtree under `node` for overlapping pairs that
    /// share a leaf. Each internal node forks one task per child and joins them
    /// before returning. Every unordered pair within a leaf is tested once.
    pub fn detect_inner_collisions(&self, node: NodeId, queue: &WorkQueue<CollisionPair>) {
        match &self.nodes[node].contents {
            NodeContents::Leaf(ids) => {
                let bodies = self.bodies(ids);
                for (i, a) in bodies.iter().enumerate() {
                    for b in &bodies[i + 1..] {
                        if overlaps(&a.position, a.radius, &b.position, b.radius) {
                            queue.push(CollisionPair::new(a.id, b.id));
                        }
                    }
                }
            }
            NodeContents::Internal(children) => rayon::scope(|scope| {
                for &child in children {
                    scope.spawn(move |_| self.detect_inner_collisions(child, queue));
                }
            }),
        }
    }

    /// Particles of `leaf` whose margin-inflated sphere crosses the leaf's faces.
    pub fn near_border_particles(&self, leaf: NodeId) -> Vec<ParticleId> {
        let node = &self.nodes[leaf];
        node.particles()
            .iter()
            .copied()
            .filter(|&id| node.is_near_border(&self.particle(id), self.near_border_margin))
            .collect()
    }

    /// Fork-join scan for overlapping pairs that straddle two face-adjacent leaves.
    ///
    /// Every particle of a leaf is tested against the near-border particles of
    /// each same-sized face neighbor. Pairs are pushed in canonical order; the
    /// same pair is normally found from both leaves, so the queue must be
    /// de-duplicated before resolution.
    pub fn detect_outer_collisions(&self, node: NodeId, queue: &WorkQueue<CollisionPair>) {
        match &self.nodes[node].contents {
            NodeContents::Leaf(ids) => {
                if ids.is_empty() {
                    return;
                }
                let own = self.bodies(ids);
                let bordering: Vec<Body> = self
                    .adjacent_leaves(node)
                    .into_iter()
                    .flat_map(|neighbor| self.bodies(&self.near_border_particles(neighbor)))
                    .collect();
                for a in &own {
                    for b in &bordering {
                        if overlaps(&a.position, a.radius, &b.position, b.radius) {
                            queue.push(CollisionPair::canonical(a.id, b.id));
                        }
                    }
                }
            }
            NodeContents::Internal(children) => rayon::scope(|scope| {
                for &child in children {
                    scope.spawn(move |_| self.detect_outer_collisions(child, queue));
                }
            }),
        }
    }
}
