//! Identifiers for world instances, terrains, and the tiles they are built from.
//!
//! A world instance hosts any number of terrains; a terrain is assembled from
//! tiles placed on an integer grid. `TileKey` names one tile uniquely across the
//! process.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::IVec2;

// =============================================================================
// WorldId - unique identifier
// =============================================================================

/// Atomic counter for generating unique WorldIds.
static WORLD_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque world-instance identifier.
///
/// Either generated atomically (unique within process lifetime) or adopted from
/// the host engine's own world id via [`WorldId::from_raw`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct WorldId(u64);

impl WorldId {
    /// Generate a new unique WorldId.
    pub fn new() -> Self {
        Self(WORLD_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an engine-provided world id.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

// =============================================================================
// TerrainGuid - stable terrain identity
// =============================================================================

/// Stable identity of one terrain (shared by all of its tiles).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TerrainGuid(u128);

impl TerrainGuid {
    pub const fn from_u128(raw: u128) -> Self {
        Self(raw)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for TerrainGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

// =============================================================================
// TileKey - one tile instance
// =============================================================================

/// Process-wide identity of a single terrain tile.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TileKey {
    pub world: WorldId,
    pub terrain: TerrainGuid,
    /// Tile coordinate on the terrain's tile grid.
    pub coord: IVec2,
}

impl TileKey {
    pub fn new(world: WorldId, terrain: TerrainGuid, coord: IVec2) -> Self {
        Self {
            world,
            terrain,
            coord,
        }
    }
}
