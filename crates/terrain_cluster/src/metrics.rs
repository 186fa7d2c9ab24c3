//! Engine-agnostic metrics for the terrain cluster pipeline.
//!
//! Feature-gated and runtime-toggled so recording costs nothing when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use terrain_cluster::metrics::{RenderMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics (on by default)
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! // After each frame:
//! metrics.record_frame(&stats);
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::constants::CLUSTER_LOD_COUNT;
use crate::frame::FrameStats;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Rolling window of the most recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Push a new value, evicting the oldest if at capacity.
    pub fn push(&mut self, value: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Iterate over values (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl<T: Copy + Default + std::ops::Add<Output = T>> RollingWindow<T> {
    pub fn sum(&self) -> T {
        self.buffer.iter().copied().fold(T::default(), |acc, x| acc + x)
    }
}

impl RollingWindow<u64> {
    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = *self.buffer.iter().min()?;
        let max = *self.buffer.iter().max()?;
        Some((min, max))
    }
}

/// Rolling pass timings and visibility of one world.
#[derive(Debug, Clone)]
pub struct RenderMetrics {
    /// Pass timings in microseconds.
    pub classify_timings: RollingWindow<u64>,
    pub cull_timings: RollingWindow<u64>,
    pub compact_timings: RollingWindow<u64>,
    /// Visible clusters per frame.
    pub visible_clusters: RollingWindow<u64>,

    // Last frame snapshot
    pub visible_per_lod: [u32; CLUSTER_LOD_COUNT as usize],
    pub last_total_clusters: u32,
    pub last_frustum_culled: u32,
    pub last_occlusion_culled: u32,

    /// Frames recorded this session.
    pub frames: u64,
    /// Buffer rebuilds this session.
    pub rebuilds: u64,
}

impl RenderMetrics {
    pub fn new(window: usize) -> Self {
        Self {
            classify_timings: RollingWindow::new(window),
            cull_timings: RollingWindow::new(window),
            compact_timings: RollingWindow::new(window),
            visible_clusters: RollingWindow::new(window),
            visible_per_lod: [0; CLUSTER_LOD_COUNT as usize],
            last_total_clusters: 0,
            last_frustum_culled: 0,
            last_occlusion_culled: 0,
            frames: 0,
            rebuilds: 0,
        }
    }

    /// Fold one frame's statistics into the windows.
    pub fn record_frame(&mut self, stats: &FrameStats) {
        if !is_enabled() {
            return;
        }

        self.classify_timings.push(stats.classify_time.as_micros() as u64);
        self.cull_timings.push(stats.cull_time.as_micros() as u64);
        self.compact_timings.push(stats.compact_time.as_micros() as u64);
        self.visible_clusters.push(stats.visible() as u64);

        self.visible_per_lod = [0; CLUSTER_LOD_COUNT as usize];
        for (slot, &count) in self.visible_per_lod.iter_mut().zip(&stats.visible_per_lod) {
            *slot = count;
        }
        self.last_total_clusters = stats.total_clusters;
        self.last_frustum_culled = stats.frustum_culled;
        self.last_occlusion_culled = stats.occlusion_culled;

        self.frames += 1;
        self.rebuilds += stats.rebuilds as u64;
    }

    /// Average time of all three passes, in microseconds.
    pub fn avg_pass_time_us(&self) -> f64 {
        self.classify_timings.average() + self.cull_timings.average() + self.compact_timings.average()
    }

    /// Fraction of last frame's clusters that were culled.
    pub fn cull_ratio(&self) -> f64 {
        if self.last_total_clusters == 0 {
            return 0.0;
        }
        (self.last_frustum_culled + self.last_occlusion_culled) as f64 / self.last_total_clusters as f64
    }
}

impl Default for RenderMetrics {
    fn default() -> Self {
        Self::new(128) // ~2 seconds at 60fps
    }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use std::time::Duration;

    #[test]
    fn test_rolling_window() {
        let mut window = RollingWindow::new(3);
        assert!(window.is_empty());
        assert_eq!(window.min_max(), None);

        window.push(10u64);
        window.push(20);
        window.push(30);
        assert_eq!(window.sum(), 60);
        assert_eq!(window.average(), 20.0);

        // Oldest evicted
        window.push(40);
        assert_eq!(window.len(), 3);
        assert_eq!(window.sum(), 90);
        assert_eq!(window.min_max(), Some((20, 40)));
    }

    #[test]
    fn test_record_frame() {
        let mut metrics = RenderMetrics::new(4);
        let stats = FrameStats {
            terrains_rendered: 1,
            rebuilds: 1,
            total_clusters: 64,
            frustum_culled: 24,
            occlusion_culled: 8,
            visible_per_lod: smallvec![10, 20, 2],
            classify_time: Duration::from_micros(5),
            cull_time: Duration::from_micros(7),
            compact_time: Duration::from_micros(3),
            ..Default::default()
        };
        metrics.record_frame(&stats);
        metrics.record_frame(&FrameStats {
            rebuilds: 0,
            ..stats.clone()
        });

        assert_eq!(metrics.frames, 2);
        assert_eq!(metrics.rebuilds, 1);
        assert_eq!(metrics.visible_per_lod, [10, 20, 2, 0, 0]);
        assert_eq!(metrics.visible_clusters.last(), Some(&32));
        assert_eq!(metrics.avg_pass_time_us(), 15.0);
        assert_eq!(metrics.cull_ratio(), 0.5);
    }
}
