//! Typed GPU buffers with RAII release and an owning execution domain.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use bytemuck::Pod;

use super::{BufferUsage, ResourceAccess};
use crate::error::GpuError;

static BUFFER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique buffer handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
  fn next() -> Self {
    Self(BUFFER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
  }
}

/// Buffer of `T` elements, allocated on creation and released on drop.
///
/// A buffer belongs to the execution domain (thread) that created it and must
/// be released there: dropping it anywhere else is a contract violation and
/// panics. Writes go through [`uav_mut`](Self::uav_mut) /
/// [`copy_dest_mut`](Self::copy_dest_mut), which require the matching tracked
/// state.
pub struct GpuBuffer<T: Pod> {
  id: BufferId,
  name: &'static str,
  usage: BufferUsage,
  state: ResourceAccess,
  data: Vec<T>,
  owner: ThreadId,
}

impl<T: Pod> GpuBuffer<T> {
  /// Allocate and upload `data`, starting in `initial` state.
  pub fn with_data(
    name: &'static str,
    usage: BufferUsage,
    initial: ResourceAccess,
    data: Vec<T>,
  ) -> Result<Self, GpuError> {
    if !usage.contains(initial.required_usage()) {
      return Err(GpuError::InvalidUsage {
        buffer: name,
        usage,
        access: initial,
      });
    }
    let buffer = Self {
      id: BufferId::next(),
      name,
      usage,
      state: initial,
      data,
      owner: thread::current().id(),
    };
    tracing::trace!(buffer = name, elements = buffer.data.len(), bytes = buffer.size_bytes(), "allocate");
    Ok(buffer)
  }

  /// Allocate `len` zeroed elements.
  pub fn zeroed(
    name: &'static str,
    usage: BufferUsage,
    initial: ResourceAccess,
    len: usize,
  ) -> Result<Self, GpuError> {
    Self::with_data(name, usage, initial, vec![T::zeroed(); len])
  }

  #[inline]
  pub fn id(&self) -> BufferId {
    self.id
  }

  #[inline]
  pub fn name(&self) -> &'static str {
    self.name
  }

  #[inline]
  pub fn usage(&self) -> BufferUsage {
    self.usage
  }

  /// Currently tracked resource state.
  #[inline]
  pub fn state(&self) -> ResourceAccess {
    self.state
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  #[inline]
  pub fn size_bytes(&self) -> usize {
    std::mem::size_of_val(self.data.as_slice())
  }

  /// Element view (kernel reads and CPU readback).
  #[inline]
  pub fn contents(&self) -> &[T] {
    &self.data
  }

  /// Raw bytes exactly as the kernels see them.
  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.data)
  }

  /// Kernel write access.
  ///
  /// # Panics
  /// If the buffer is not in [`ResourceAccess::UavCompute`].
  pub fn uav_mut(&mut self) -> &mut [T] {
    assert_eq!(
      self.state,
      ResourceAccess::UavCompute,
      "`{}` written outside the UAV state",
      self.name
    );
    &mut self.data
  }

  /// Clear/copy write access.
  ///
  /// # Panics
  /// If the buffer is not in [`ResourceAccess::CopyDest`].
  pub fn copy_dest_mut(&mut self) -> &mut [T] {
    assert_eq!(
      self.state,
      ResourceAccess::CopyDest,
      "`{}` cleared outside the copy-dest state",
      self.name
    );
    &mut self.data
  }

  pub(super) fn set_state(&mut self, state: ResourceAccess) {
    self.state = state;
  }
}

impl<T: Pod> Drop for GpuBuffer<T> {
  fn drop(&mut self) {
    if thread::panicking() {
      return;
    }
    assert_eq!(
      thread::current().id(),
      self.owner,
      "GPU buffer `{}` released outside its owning execution domain",
      self.name
    );
    tracing::trace!(buffer = self.name, "release");
  }
}

impl<T: Pod> std::fmt::Debug for GpuBuffer<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GpuBuffer")
      .field("name", &self.name)
      .field("len", &self.data.len())
      .field("state", &self.state)
      .finish()
  }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;
