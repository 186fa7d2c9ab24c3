//! Frame pipeline benchmarks.
//!
//! Times one full frame (classify, cull + pack, compact, draws) over a 16×16
//! tile terrain at two cluster densities, plus the one-off buffer rebuild.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::{Affine3A, IVec2, Mat4, Quat, UVec2, Vec3};
use terrain_cluster::{
  command_queue, FrameView, GameLedger, HeightmapImage, LodDistribution, RenderConfig, RenderLedger,
  TerrainGuid, TileDescriptor, WorldId,
};

const GRID: i32 = 16;
const WORLD: WorldId = WorldId::from_raw(1);
const TERRAIN: TerrainGuid = TerrainGuid::from_u128(1);

/// Subsection size in quads, two subsections per tile.
/// 15 → 2×2 clusters per tile, 31 → 4×4.
const SUBSECTIONS: [u32; 2] = [15, 31];

fn descriptor(subsection_size_quads: u32, coord: IVec2) -> TileDescriptor {
  let size = (subsection_size_quads * 2) as i32;
  let section_base = coord * size;
  TileDescriptor {
    world: WORLD,
    terrain: TERRAIN,
    section_base,
    subsection_size_quads,
    num_subsections: 2,
    lod_distribution: LodDistribution::default(),
    local_to_world: Affine3A::from_scale_rotation_translation(
      Vec3::splat(4.0),
      Quat::IDENTITY,
      Vec3::new(section_base.x as f32, section_base.y as f32, 0.0) * 4.0,
    ),
    heightmap_texel_base: UVec2::ZERO,
    terrain_tile_count: (GRID * GRID) as u32,
  }
}

/// Gentle ramp so cluster bounds are not all flat.
fn ramp(subsection_size_quads: u32) -> HeightmapImage {
  let texels = (subsection_size_quads + 1) * 2;
  let heights: Vec<u16> = (0..texels * texels)
    .map(|i| 32768 + ((i % texels) * 64) as u16)
    .collect();
  HeightmapImage::from_packed(UVec2::splat(texels), &heights)
}

fn ready_ledger(subsection_size_quads: u32) -> (GameLedger, RenderLedger) {
  let (mut game, mut render) = command_queue(RenderConfig::default());
  let heightmap = ramp(subsection_size_quads);
  for y in 0..GRID {
    for x in 0..GRID {
      game
        .register_tile(&descriptor(subsection_size_quads, IVec2::new(x, y)), &heightmap)
        .expect("valid descriptor");
    }
  }
  render.pump_commands();
  (game, render)
}

fn view(subsection_size_quads: u32) -> FrameView<'static> {
  let extent = (GRID as u32 * subsection_size_quads * 2) as f32 * 4.0;
  let eye = Vec3::new(extent * 0.5, -extent * 0.1, extent * 0.05);
  let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 16.0 / 9.0, 0.5, 100_000.0);
  let view = Mat4::look_at_rh(eye, Vec3::new(extent * 0.5, extent * 0.5, 0.0), Vec3::Z);
  FrameView::new(eye, projection, projection * view)
}

fn bench_frame(c: &mut Criterion) {
  let mut group = c.benchmark_group("frame_16x16_tiles");

  for sub in SUBSECTIONS {
    let (_game, mut render) = ready_ledger(sub);
    let view = view(sub);
    // First frame builds the buffers.
    render.render_world(WORLD, &view).expect("frame");
    let clusters = render
      .entity(WORLD, TERRAIN)
      .and_then(|e| e.buffers())
      .map_or(0, |b| b.cluster_count());

    group.throughput(Throughput::Elements(clusters as u64));
    group.bench_with_input(BenchmarkId::new("clusters", clusters), &view, |b, view| {
      b.iter(|| {
        let output = render.render_world(WORLD, black_box(view)).expect("frame");
        black_box(output.stats.visible())
      });
    });
  }

  group.finish();
}

fn bench_registration(c: &mut Criterion) {
  let mut group = c.benchmark_group("register_16x16_tiles");
  group.sample_size(20);

  for sub in SUBSECTIONS {
    let view = view(sub);
    group.bench_with_input(BenchmarkId::from_parameter(sub), &sub, |b, &sub| {
      b.iter(|| {
        let (_game, mut render) = ready_ledger(sub);
        let output = render.render_world(WORLD, &view).expect("frame");
        black_box(output.stats.rebuilds)
      });
    });
  }

  group.finish();
}

criterion_group!(benches, bench_frame, bench_registration);
criterion_main!(benches);
