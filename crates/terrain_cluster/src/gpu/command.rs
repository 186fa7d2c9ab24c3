//! Command recording with resource-state validation.

use bytemuck::Pod;

use super::{BufferId, DrawIndexedIndirectArgs, GpuBuffer, ResourceAccess};
use crate::error::GpuError;

/// How a dispatch uses a bound buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingAccess {
  Read,
  ReadWrite,
}

impl BindingAccess {
  fn expected_state(self) -> ResourceAccess {
    match self {
      Self::Read => ResourceAccess::SrvCompute,
      Self::ReadWrite => ResourceAccess::UavCompute,
    }
  }
}

/// Snapshot of a buffer binding taken when a dispatch is recorded.
#[derive(Clone, Copy, Debug)]
pub struct Binding {
  pub buffer: BufferId,
  pub name: &'static str,
  pub state: ResourceAccess,
  pub access: BindingAccess,
}

impl<T: Pod> GpuBuffer<T> {
  /// Bind as a read-only compute input.
  pub fn bind_read(&self) -> Binding {
    self.binding(BindingAccess::Read)
  }

  /// Bind as a read-write compute output.
  pub fn bind_write(&self) -> Binding {
    self.binding(BindingAccess::ReadWrite)
  }

  fn binding(&self, access: BindingAccess) -> Binding {
    Binding {
      buffer: self.id(),
      name: self.name(),
      state: self.state(),
      access,
    }
  }
}

/// One recorded command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
  Transition {
    buffer: BufferId,
    name: &'static str,
    from: ResourceAccess,
    to: ResourceAccess,
  },
  Clear {
    buffer: BufferId,
    name: &'static str,
  },
  Dispatch {
    pass: &'static str,
    groups: u32,
  },
  DrawIndexedIndirect {
    args: BufferId,
    instances: BufferId,
    draw: u32,
  },
}

/// Ordered list of commands for one frame.
#[derive(Debug, Default)]
pub struct CommandList {
  commands: Vec<Command>,
}

impl CommandList {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a barrier moving `buffer` from `from` to `to`.
  pub fn transition<T: Pod>(
    &mut self,
    buffer: &mut GpuBuffer<T>,
    from: ResourceAccess,
    to: ResourceAccess,
  ) -> Result<(), GpuError> {
    if buffer.state() != from {
      return Err(GpuError::StateMismatch {
        buffer: buffer.name(),
        from,
        actual: buffer.state(),
      });
    }
    if !buffer.usage().contains(to.required_usage()) {
      return Err(GpuError::InvalidUsage {
        buffer: buffer.name(),
        usage: buffer.usage(),
        access: to,
      });
    }
    buffer.set_state(to);
    self.commands.push(Command::Transition {
      buffer: buffer.id(),
      name: buffer.name(),
      from,
      to,
    });
    Ok(())
  }

  /// Zero `buffer`; it must be in [`ResourceAccess::CopyDest`].
  pub fn clear_buffer<T: Pod>(&mut self, buffer: &mut GpuBuffer<T>) -> Result<(), GpuError> {
    if buffer.state() != ResourceAccess::CopyDest {
      return Err(GpuError::Hazard {
        pass: "clear",
        buffer: buffer.name(),
        expected: ResourceAccess::CopyDest,
        actual: buffer.state(),
      });
    }
    buffer.copy_dest_mut().fill(T::zeroed());
    self.commands.push(Command::Clear {
      buffer: buffer.id(),
      name: buffer.name(),
    });
    Ok(())
  }

  /// Record a compute dispatch after checking every binding's state.
  pub fn dispatch(&mut self, pass: &'static str, groups: u32, bindings: &[Binding]) -> Result<(), GpuError> {
    for binding in bindings {
      let expected = binding.access.expected_state();
      if binding.state != expected {
        return Err(GpuError::Hazard {
          pass,
          buffer: binding.name,
          expected,
          actual: binding.state,
        });
      }
    }
    self.commands.push(Command::Dispatch { pass, groups });
    Ok(())
  }

  /// Record one indirect draw reading argument block `draw`.
  pub fn draw_indexed_indirect<I: Pod>(
    &mut self,
    args: &GpuBuffer<DrawIndexedIndirectArgs>,
    instances: &GpuBuffer<I>,
    draw: u32,
  ) -> Result<(), GpuError> {
    if args.state() != ResourceAccess::IndirectArgs {
      return Err(GpuError::Hazard {
        pass: "draw",
        buffer: args.name(),
        expected: ResourceAccess::IndirectArgs,
        actual: args.state(),
      });
    }
    if instances.state() != ResourceAccess::SrvGraphics {
      return Err(GpuError::Hazard {
        pass: "draw",
        buffer: instances.name(),
        expected: ResourceAccess::SrvGraphics,
        actual: instances.state(),
      });
    }
    if draw as usize >= args.len() {
      return Err(GpuError::ArgsOutOfRange {
        buffer: args.name(),
        draw,
        len: args.len(),
      });
    }
    self.commands.push(Command::DrawIndexedIndirect {
      args: args.id(),
      instances: instances.id(),
      draw,
    });
    Ok(())
  }

  #[inline]
  pub fn commands(&self) -> &[Command] {
    &self.commands
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.commands.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.commands.is_empty()
  }

  /// Dispatched pass names, in order.
  pub fn dispatches(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.commands.iter().filter_map(|c| match c {
      Command::Dispatch { pass, .. } => Some(*pass),
      _ => None,
    })
  }

  /// State transitions recorded for `buffer`, in order.
  pub fn transitions_of(&self, buffer: BufferId) -> Vec<(ResourceAccess, ResourceAccess)> {
    self
      .commands
      .iter()
      .filter_map(|c| match c {
        Command::Transition { buffer: id, from, to, .. } if *id == buffer => Some((*from, *to)),
        _ => None,
      })
      .collect()
  }
}

#[cfg(test)]
#[path = "command_test.rs"]
mod command_test;
