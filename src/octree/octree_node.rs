use approx::abs_diff_eq;
use crate::models::Vector3D;
use crate::particles::Particle;

/// Index of a node inside the octree arena.
pub type NodeId = usize;

/// Index of a particle inside the octree's particle store. It doubles as the
/// particle's identity when pairs are put in canonical order.
pub type ParticleId = usize;

/// An axis-aligned cube described by its center and half of its side length.
///
/// # Examples
///
/// ```
/// use rs_verlet::models::Vector3D;
/// use rs_verlet::octree::Bounds;
///
/// let bounds = Bounds::new(Vector3D::ZERO, 2.0);
/// assert_eq!(bounds.min(), Vector3D::new(-2.0, -2.0, -2.0));
/// assert_eq!(bounds.max(), Vector3D::new(2.0, 2.0, 2.0));
///
/// // Child 7 is the (+x, +y, +z) octant.
/// let child = bounds.child_bounds(7);
/// assert_eq!(child.center, Vector3D::new(1.0, 1.0, 1.0));
/// assert_eq!(child.half_extent, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vector3D,
    pub half_extent: f64,
}

impl Bounds {
    pub fn new(center: Vector3D, half_extent: f64) -> Self {
        Bounds { center, half_extent }
    }

    pub fn min(&self) -> Vector3D {
        self.center.sub_scalar(self.half_extent)
    }

    pub fn max(&self) -> Vector3D {
        self.center + Vector3D::splat(self.half_extent)
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: &Vector3D) -> bool {
        let (min, max) = (self.min(), self.max());
        (0..3).all(|axis| point.axis(axis) >= min.axis(axis) && point.axis(axis) <= max.axis(axis))
    }

    /// Octant of `position` as a 3-bit code: bit 0 for x, bit 1 for y, bit 2 for z,
    /// each set when the coordinate is at or above the center. Ties go to the positive side.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_verlet::models::Vector3D;
    /// use rs_verlet::octree::Bounds;
    ///
    /// let bounds = Bounds::new(Vector3D::ZERO, 1.0);
    /// assert_eq!(bounds.child_index(&Vector3D::new(-0.5, -0.5, -0.5)), 0);
    /// assert_eq!(bounds.child_index(&Vector3D::new(0.5, -0.5, -0.5)), 1);
    /// assert_eq!(bounds.child_index(&Vector3D::new(-0.5, 0.5, 0.5)), 6);
    /// assert_eq!(bounds.child_index(&Vector3D::ZERO), 7);
    /// ```
    pub fn child_index(&self, position: &Vector3D) -> usize {
        let mut index = 0;
        if position.x >= self.center.x { index |= 1; }
        if position.y >= self.center.y { index |= 2; }
        if position.z >= self.center.z { index |= 4; }
        index
    }

    /// Bounds of the octant with the given 3-bit code.
    pub fn child_bounds(&self, index: usize) -> Bounds {
        let quarter = self.half_extent / 2.0;
        let offset = |bit: usize| if index & bit == 0 { -quarter } else { quarter };
        Bounds {
            center: self.center + Vector3D::new(offset(1), offset(2), offset(4)),
            half_extent: quarter,
        }
    }

    /// True only when this box lies strictly inside `outer` on all six faces.
    pub fn is_strictly_inside(&self, outer: &Bounds) -> bool {
        let (min, max) = (self.min(), self.max());
        let (outer_min, outer_max) = (outer.min(), outer.max());
        (0..3).all(|axis| min.axis(axis) > outer_min.axis(axis) && max.axis(axis) < outer_max.axis(axis))
    }

    /// Face adjacency: both cubes have the same size and share exactly one face
    /// with full overlap on the two remaining axes.
    ///
    /// Cubes of different sizes are never adjacent, even when they touch.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_verlet::models::Vector3D;
    /// use rs_verlet::octree::Bounds;
    ///
    /// let a = Bounds::new(Vector3D::new(-1.0, -1.0, -1.0), 1.0);
    /// let face = Bounds::new(Vector3D::new(1.0, -1.0, -1.0), 1.0);
    /// let edge = Bounds::new(Vector3D::new(1.0, 1.0, -1.0), 1.0);
    ///
    /// assert!(a.is_adjacent(&face));
    /// assert!(!a.is_adjacent(&edge));
    /// assert!(!a.is_adjacent(&a));
    /// ```
    pub fn is_adjacent(&self, other: &Bounds) -> bool {
        let tolerance = 1e-9 * self.half_extent.max(other.half_extent);
        if !abs_diff_eq!(self.half_extent, other.half_extent, epsilon = tolerance) {
            return false;
        }
        let size = self.half_extent * 2.0;
        let mut touching_axes = 0;
        for axis in 0..3 {
            let offset = (self.center.axis(axis) - other.center.axis(axis)).abs();
            if abs_diff_eq!(offset, 0.0, epsilon = tolerance) {
                continue;
            }
            if abs_diff_eq!(offset, size, epsilon = tolerance) {
                touching_axes += 1;
            } else {
                return false;
            }
        }
        touching_axes == 1
    }

    /// Closed-box overlap, touching faces included.
    pub fn touches(&self, other: &Bounds) -> bool {
        let reach = self.half_extent + other.half_extent;
        let tolerance = 1e-9 * reach;
        (0..3).all(|axis| (self.center.axis(axis) - other.center.axis(axis)).abs() <= reach + tolerance)
    }

    /// Whether a sphere of `radius` scaled by `margin` pokes through any face.
    pub fn is_near_border(&self, position: &Vector3D, radius: f64, margin: f64) -> bool {
        let reach = radius * margin;
        let (min, max) = (self.min(), self.max());
        (0..3).any(|axis| {
            position.axis(axis) - reach < min.axis(axis) || position.axis(axis) + reach > max.axis(axis)
        })
    }

    /// Box-sphere intersection.
    pub fn intersects_sphere(&self, center: &Vector3D, radius: f64) -> bool {
        let (min, max) = (self.min(), self.max());
        let closest = Vector3D::new(
            center.x.clamp(min.x, max.x),
            center.y.clamp(min.y, max.y),
            center.z.clamp(min.z, max.z),
        );
        closest.distance_squared(center) <= radius * radius
    }
}

/// What a node holds: particles when it is a leaf, exactly eight children otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContents {
    Leaf(Vec<ParticleId>),
    Internal([NodeId; 8]),
}

/// A cell of the adaptive octree.
///
/// Nodes live in the [`Octree`](crate::octree::Octree) arena and refer to each
/// other by [`NodeId`]. A leaf turns internal once it overflows `capacity`
/// while it still has depth budget; the change is never undone.
#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub bounds: Bounds,
    /// Particles a leaf accepts before subdividing.
    pub capacity: usize,
    /// How many more times this node may be subdivided.
    pub depth_budget: u32,
    /// Distance from the root.
    pub depth: u32,
    pub parent: Option<NodeId>,
    /// Precomputed at construction: box strictly inside the world on every face.
    pub world_interior: bool,
    pub contents: NodeContents,
}

impl OctreeNode {
    pub fn new(
        bounds: Bounds,
        capacity: usize,
        depth_budget: u32,
        depth: u32,
        parent: Option<NodeId>,
        world: &Bounds,
    ) -> Self {
        OctreeNode {
            bounds,
            capacity,
            depth_budget,
            depth,
            parent,
            world_interior: bounds.is_strictly_inside(world),
            contents: NodeContents::Leaf(Vec::new()),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.contents, NodeContents::Leaf(_))
    }

    /// Resident particles; always empty for internal nodes.
    pub fn particles(&self) -> &[ParticleId] {
        match &self.contents {
            NodeContents::Leaf(ids) => ids,
            NodeContents::Internal(_) => &[],
        }
    }

    pub fn children(&self) -> Option<&[NodeId; 8]> {
        match &self.contents {
            NodeContents::Leaf(_) => None,
            NodeContents::Internal(children) => Some(children),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.particles().is_empty()
    }

    /// A leaf over capacity splits only while it has depth budget left.
    pub fn should_subdivide(&self) -> bool {
        self.is_leaf() && self.particles().len() > self.capacity && self.depth_budget > 0
    }

    /// Leaf-to-leaf adjacency as used by the cross-cell pass.
    pub fn is_adjacent(&self, other: &OctreeNode) -> bool {
        self.is_leaf() && other.is_leaf() && self.bounds.is_adjacent(&other.bounds)
    }

    pub fn is_near_border(&self, particle: &Particle, margin: f64) -> bool {
        self.bounds.is_near_border(&particle.position, particle.radius, margin)
    }
}
