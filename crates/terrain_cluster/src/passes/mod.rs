//! The three per-frame compute passes and the frustum they cull against.
//!
//! ```text
//! tile origins ──► classify ──► cluster LODs ──► cull + pack ──► visible records
//!                                                    │             LOD counts
//!                                                    ▼
//!                           indirect args ◄── compact ──► ordered records
//! ```
//!
//! Every pass records its barriers and dispatch into a
//! [`CommandList`](crate::gpu::CommandList) first; the kernel runs only after
//! the command list accepted the dispatch.

pub mod classify;
pub mod compact;
pub mod cull;
pub mod frustum;

pub use classify::{classify, ClassifyView};
pub use compact::{compact, CompactOutput};
pub use cull::{cull, CullOutput, CullView};
pub use frustum::PermutedPlanes;
