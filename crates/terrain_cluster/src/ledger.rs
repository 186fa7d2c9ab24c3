//! Registration ledgers on both sides of the command queue.
//!
//! ```text
//! submission thread                           consuming thread
//! ┌──────────────────┐   TileCommand (FIFO)   ┌──────────────────────────┐
//! │ GameLedger       │ ─────────────────────► │ RenderLedger             │
//! │  world → terrain │                        │  world → WorldLedger     │
//! │    → tile coords │                        │    terrain → RenderEntity│
//! └──────────────────┘                        └──────────────────────────┘
//! ```
//!
//! Both sides are rebuilt from the same submission records and never share
//! memory. The game side deduplicates registrations and samples cluster
//! bounds; the render side owns every GPU buffer and runs the frame.

use std::collections::{HashMap, HashSet};

use crossbeam_channel::{self as channel, Receiver, Sender, TryRecvError};
use glam::IVec2;

use crate::config::RenderConfig;
use crate::entity::TerrainRenderEntity;
use crate::error::{GpuError, TileDescriptorError};
use crate::frame::{render_terrain, FrameOutput, FrameView};
use crate::geometry::ClusterGeometry;
use crate::heightmap::HeightSource;
use crate::metrics::RenderMetrics;
use crate::submission::{ClusterBoundsSet, TileDescriptor, TileSubmission};
use crate::world::{TerrainGuid, WorldId};

/// Command crossing from the submission thread to the consuming thread.
#[derive(Clone, Debug)]
pub enum TileCommand {
  Register {
    tile: TileSubmission,
    clusters: ClusterBoundsSet,
  },
  Unregister {
    tile: TileSubmission,
  },
}

/// Create a connected ledger pair.
///
/// The queue is unbounded so the submission thread never blocks.
pub fn command_queue(config: RenderConfig) -> (GameLedger, RenderLedger) {
  let (sender, receiver) = channel::unbounded();
  (GameLedger::new(sender), RenderLedger::new(receiver, config))
}

// =============================================================================
// Submission side
// =============================================================================

/// Submission-thread mirror of registered tiles.
pub struct GameLedger {
  sender: Sender<TileCommand>,
  worlds: HashMap<WorldId, HashMap<TerrainGuid, HashSet<IVec2>>>,
}

impl GameLedger {
  fn new(sender: Sender<TileCommand>) -> Self {
    Self {
      sender,
      worlds: HashMap::new(),
    }
  }

  /// Register a tile and queue it for the consuming thread.
  ///
  /// Returns `Ok(false)` if the tile is already registered. Cluster bounds are
  /// sampled from `heightmap` once, here.
  pub fn register_tile(
    &mut self,
    desc: &TileDescriptor,
    heightmap: &(impl HeightSource + ?Sized),
  ) -> Result<bool, TileDescriptorError> {
    let tile = TileSubmission::from_descriptor(desc)?;
    let tiles = self.worlds.entry(tile.world).or_default().entry(tile.terrain).or_default();
    if !tiles.insert(tile.coord) {
      return Ok(false);
    }

    let clusters = ClusterBoundsSet::sample(desc, &tile, heightmap);
    tracing::debug!(world = %tile.world, terrain = %tile.terrain, tile = %tile.coord, "register tile");
    self.send(TileCommand::Register { tile, clusters });
    Ok(true)
  }

  /// Unregister a tile. Returns `Ok(false)` if it was not registered.
  pub fn unregister_tile(&mut self, desc: &TileDescriptor) -> Result<bool, TileDescriptorError> {
    let tile = TileSubmission::from_descriptor(desc)?;
    let Some(terrains) = self.worlds.get_mut(&tile.world) else {
      return Ok(false);
    };
    let Some(tiles) = terrains.get_mut(&tile.terrain) else {
      return Ok(false);
    };
    if !tiles.remove(&tile.coord) {
      return Ok(false);
    }
    if tiles.is_empty() {
      terrains.remove(&tile.terrain);
    }
    if terrains.is_empty() {
      self.worlds.remove(&tile.world);
    }

    tracing::debug!(world = %tile.world, terrain = %tile.terrain, tile = %tile.coord, "unregister tile");
    self.send(TileCommand::Unregister { tile });
    Ok(true)
  }

  /// Tiles registered in `world` across all terrains.
  pub fn world_tile_count(&self, world: WorldId) -> u32 {
    self
      .worlds
      .get(&world)
      .map_or(0, |terrains| terrains.values().map(|t| t.len() as u32).sum())
  }

  pub fn terrain_tile_count(&self, world: WorldId, terrain: TerrainGuid) -> u32 {
    self
      .worlds
      .get(&world)
      .and_then(|terrains| terrains.get(&terrain))
      .map_or(0, |tiles| tiles.len() as u32)
  }

  pub fn is_empty(&self) -> bool {
    self.worlds.is_empty()
  }

  fn send(&self, command: TileCommand) {
    if self.sender.send(command).is_err() {
      tracing::warn!("render ledger is gone; tile command dropped");
    }
  }
}

// =============================================================================
// Consuming side
// =============================================================================

/// Render-side state of one world.
#[derive(Debug)]
pub struct WorldLedger {
  terrains: HashMap<TerrainGuid, TerrainRenderEntity>,
  tile_count: u32,
  metrics: RenderMetrics,
}

impl WorldLedger {
  fn new(metrics_window: usize) -> Self {
    Self {
      terrains: HashMap::new(),
      tile_count: 0,
      metrics: RenderMetrics::new(metrics_window),
    }
  }

  /// Tiles registered across all terrains of this world.
  #[inline]
  pub fn tile_count(&self) -> u32 {
    self.tile_count
  }

  #[inline]
  pub fn terrain_count(&self) -> usize {
    self.terrains.len()
  }

  pub fn terrain(&self, terrain: TerrainGuid) -> Option<&TerrainRenderEntity> {
    self.terrains.get(&terrain)
  }

  pub fn terrains(&self) -> impl Iterator<Item = &TerrainRenderEntity> {
    self.terrains.values()
  }

  #[inline]
  pub fn metrics(&self) -> &RenderMetrics {
    &self.metrics
  }
}

/// Consuming-thread owner of every terrain render entity.
pub struct RenderLedger {
  receiver: Receiver<TileCommand>,
  worlds: HashMap<WorldId, WorldLedger>,
  geometry: ClusterGeometry,
  config: RenderConfig,
}

impl RenderLedger {
  fn new(receiver: Receiver<TileCommand>, config: RenderConfig) -> Self {
    assert!(config.workgroup_size > 0, "RenderConfig::workgroup_size must be non-zero");
    Self {
      receiver,
      worlds: HashMap::new(),
      geometry: ClusterGeometry::new(),
      config,
    }
  }

  /// Apply every queued command in issue order. Returns how many ran.
  pub fn pump_commands(&mut self) -> usize {
    let mut applied = 0;
    loop {
      match self.receiver.try_recv() {
        Ok(command) => {
          self.apply(command);
          applied += 1;
        }
        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
      }
    }
    applied
  }

  /// Apply one command.
  ///
  /// # Panics
  /// On an unregister for a world or terrain with no render state, or any
  /// registration contract violation of [`TerrainRenderEntity`].
  pub fn apply(&mut self, command: TileCommand) {
    match command {
      TileCommand::Register { tile, clusters } => self.register(tile, clusters),
      TileCommand::Unregister { tile } => self.unregister(tile),
    }
  }

  fn register(&mut self, tile: TileSubmission, clusters: ClusterBoundsSet) {
    let config = &self.config;
    let world = self
      .worlds
      .entry(tile.world)
      .or_insert_with(|| WorldLedger::new(config.metrics_window));
    world.tile_count += 1;
    world
      .terrains
      .entry(tile.terrain)
      .or_insert_with(|| TerrainRenderEntity::new(&tile, config))
      .register_tile(&tile, clusters);

    tracing::debug!(
      world = %tile.world,
      terrain = %tile.terrain,
      tile = %tile.coord,
      world_tiles = world.tile_count,
      "tile registered"
    );
  }

  fn unregister(&mut self, tile: TileSubmission) {
    let Some(world) = self.worlds.get_mut(&tile.world) else {
      panic!("no render ledger for {} while unregistering tile {}", tile.world, tile.coord);
    };
    let Some(entity) = world.terrains.get_mut(&tile.terrain) else {
      panic!("{} has no render entity for terrain {}", tile.world, tile.terrain);
    };
    entity.unregister_tile(&tile);
    world.tile_count -= 1;

    if entity.registered_tile_count() == 0 {
      world.terrains.remove(&tile.terrain);
      tracing::debug!(world = %tile.world, terrain = %tile.terrain, "render entity released");
    }
    if world.tile_count == 0 {
      self.worlds.remove(&tile.world);
      tracing::debug!(world = %tile.world, "world ledger released");
    }
  }

  pub fn world(&self, world: WorldId) -> Option<&WorldLedger> {
    self.worlds.get(&world)
  }

  pub fn entity(&self, world: WorldId, terrain: TerrainGuid) -> Option<&TerrainRenderEntity> {
    self.worlds.get(&world)?.terrain(terrain)
  }

  #[inline]
  pub fn world_count(&self) -> usize {
    self.worlds.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.worlds.is_empty()
  }

  #[inline]
  pub fn geometry(&self) -> &ClusterGeometry {
    &self.geometry
  }

  #[inline]
  pub fn config(&self) -> &RenderConfig {
    &self.config
  }

  /// Apply pending commands, then run the frame pipeline for every terrain
  /// of `world`.
  ///
  /// A world with no registered tiles renders nothing.
  #[tracing::instrument(skip_all, fields(world = %world))]
  pub fn render_world(&mut self, world: WorldId, view: &FrameView<'_>) -> Result<FrameOutput, GpuError> {
    self.pump_commands();

    let mut output = FrameOutput::default();
    let Some(ledger) = self.worlds.get_mut(&world) else {
      return Ok(output);
    };
    for entity in ledger.terrains.values_mut() {
      render_terrain(
        entity,
        &self.geometry,
        view,
        &self.config,
        &mut output.commands,
        &mut output.stats,
      )?;
    }
    ledger.metrics.record_frame(&output.stats);
    Ok(output)
  }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod ledger_test;
