mod octree_node;
mod octree;
mod work_queue;
mod collision_detection;
mod collision_resolution;
mod octree_pipeline;

pub use octree_node::*;
pub use octree::*;
pub use work_queue::*;
pub use collision_resolution::*;
pub use octree_pipeline::*;

#[cfg(test)]
mod octree_pipeline_tests;
