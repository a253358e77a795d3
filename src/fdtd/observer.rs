//! Read-only hooks into the time loop.
//!
//! An observer is handed the field state after a step has fully completed
//! (all four sub-steps, including the source injection), at the cadence
//! chosen with [`Simulation::set_observer`](crate::fdtd::Simulation::set_observer).
//!
//! # Hook order
//!
//! 1. `on_start` - once, before the first step
//! 2. `observe` - every `every_n_steps` steps
//! 3. `check_termination` - right after each `observe`
//! 4. `on_finish` - once, after the last executed step

use crate::arrays::Field2D;
use crate::fdtd::fields::FieldState;
use crate::fdtd::operator::Operator;
use crate::Result;
use std::collections::VecDeque;

/// Periodic, read-only inspection of a running simulation.
///
/// Only `name` and `observe` are required; the other hooks default to
/// no-ops.
pub trait Observer {
    /// Observer name for logging.
    fn name(&self) -> &str;

    /// Called once before stepping starts.
    fn on_start(&mut self, _operator: &Operator) -> Result<()> {
        Ok(())
    }

    /// Called with the consistent field state after step `step`.
    fn observe(&mut self, fields: &FieldState, step: u64) -> Result<()>;

    /// Called once with the final field state.
    fn on_finish(&mut self, _fields: &FieldState) -> Result<()> {
        Ok(())
    }

    /// Return `Some(reason)` to stop the run after the current step.
    fn check_termination(&self) -> Option<String> {
        None
    }
}

/// Adapts a closure into an [`Observer`].
pub struct FnObserver<F> {
    name: String,
    callback: F,
}

impl<F> FnObserver<F>
where
    F: FnMut(&FieldState, u64),
{
    /// Wrap `callback` under `name`.
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> Observer for FnObserver<F>
where
    F: FnMut(&FieldState, u64),
{
    fn name(&self) -> &str {
        &self.name
    }

    fn observe(&mut self, fields: &FieldState, step: u64) -> Result<()> {
        (self.callback)(fields, step);
        Ok(())
    }
}

/// One recorded copy of `E_z`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Step index the copy was taken after
    pub step: u64,
    /// `E_z` at `step · dt`
    pub e_z: Field2D,
}

/// Keeps the most recent `capacity` snapshots of `E_z`.
///
/// Memory stays bounded by `capacity` grids no matter how long the run is;
/// older snapshots are dropped first.
#[derive(Debug, Clone)]
pub struct SnapshotRecorder {
    capacity: usize,
    frames: VecDeque<Snapshot>,
}

impl SnapshotRecorder {
    /// Ring buffer holding at most `capacity` snapshots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Maximum number of retained snapshots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained snapshots, oldest first.
    pub fn frames(&self) -> impl Iterator<Item = &Snapshot> {
        self.frames.iter()
    }

    /// Most recent snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.frames.back()
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop the buffer and return the snapshots, oldest first.
    pub fn into_frames(self) -> Vec<Snapshot> {
        self.frames.into()
    }
}

impl Observer for SnapshotRecorder {
    fn name(&self) -> &str {
        "snapshot-recorder"
    }

    fn observe(&mut self, fields: &FieldState, step: u64) -> Result<()> {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(Snapshot {
            step,
            e_z: fields.ez().clone(),
        });
        Ok(())
    }
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_start(&mut self, operator: &Operator) -> Result<()> {
        (**self).on_start(operator)
    }

    fn observe(&mut self, fields: &FieldState, step: u64) -> Result<()> {
        (**self).observe(fields, step)
    }

    fn on_finish(&mut self, fields: &FieldState) -> Result<()> {
        (**self).on_finish(fields)
    }

    fn check_termination(&self) -> Option<String> {
        (**self).check_termination()
    }
}
