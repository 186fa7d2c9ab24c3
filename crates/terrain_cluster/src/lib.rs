//! terrain_cluster - GPU-driven LOD, culling, and compaction for tiled terrain
//!
//! Terrain tiles register from a submission thread; a consuming thread
//! aggregates them into one render entity per terrain and, every frame, runs
//! three compute passes that end in one indirect draw per LOD:
//!
//! - **Classify**: one LOD per tile from its projected screen size
//! - **Cull + pack**: frustum and HZB tests, then a packed record holding each
//!   surviving cluster's LOD and its four neighbors' LODs for crack stitching
//! - **Compact**: order survivors by LOD bucket and fill the indirect
//!   arguments
//!
//! Passes run against a software compute device (`gpu`) that tracks every
//! buffer's resource state, so a missing barrier is an error instead of a
//! flickering frame.
//!
//! # Example
//!
//! ```ignore
//! use terrain_cluster::{command_queue, FrameView, RenderConfig};
//!
//! let (mut game, mut render) = command_queue(RenderConfig::default());
//!
//! // Submission thread
//! game.register_tile(&descriptor, &heightmap)?;
//!
//! // Consuming thread, once per view
//! let frame = render.render_world(world, &FrameView::new(eye, projection, view_projection))?;
//! for command in frame.commands.commands() {
//!     // replay on the real device
//! }
//! ```

pub mod bounds;
pub mod config;
pub mod constants;
pub mod entity;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod gpu;
pub mod heightmap;
pub mod ledger;
pub mod lod;
pub mod metrics;
pub mod passes;
pub mod submission;
pub mod world;

#[cfg(test)]
mod test_utils;

// Re-export commonly used items
pub use bounds::{Aabb, BoxSphereBounds};
pub use config::RenderConfig;
pub use constants::{CLUSTER_LOD_COUNT, CLUSTER_QUAD_SIZE, MAX_CLUSTER_COUNT};
pub use entity::{ClusterBuffers, ClusterGrid, TerrainRenderEntity, TileRect};
pub use error::{GpuError, TileDescriptorError};
pub use frame::{FrameOutput, FrameStats, FrameView};
pub use geometry::ClusterGeometry;
pub use gpu::{CommandList, GpuBuffer, Hzb, LodFieldLayout, PackedClusterRecord};
pub use heightmap::{HeightSource, HeightTexel, HeightmapImage};
pub use ledger::{command_queue, GameLedger, RenderLedger, TileCommand, WorldLedger};
pub use lod::{LodDistribution, LodSettings};
pub use passes::PermutedPlanes;
pub use submission::{ClusterBoundsSet, TileDescriptor, TileSubmission};
pub use world::{TerrainGuid, TileKey, WorldId};
