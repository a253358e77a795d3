//! Run bookkeeping: termination, energy samples and cancellation.

use crate::fdtd::fields::FieldState;
use crate::fdtd::measurement::MeasurementPoint;
use crate::fdtd::operator::Operator;
use instant::Duration;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reason why a run stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationReason {
    /// All `Nt - 1` steps were executed
    StepsCompleted,

    /// The [`CancelFlag`] was raised
    Cancelled,

    /// An observer requested early termination
    ObserverStop {
        /// Observer name
        observer: String,
        /// Reason provided by the observer
        reason: String,
    },
}

/// Summary of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of steps actually executed
    pub steps_executed: u64,

    /// Reason for termination
    pub termination_reason: TerminationReason,

    /// Energy samples collected during execution
    pub energy_samples: Vec<EnergySample>,

    /// Wall clock time elapsed
    pub elapsed_time: Duration,
}

impl RunReport {
    /// Whether the full time span was simulated.
    pub fn completed(&self) -> bool {
        self.termination_reason == TerminationReason::StepsCompleted
    }

    /// Sample with the largest total energy.
    pub fn peak_energy(&self) -> Option<&EnergySample> {
        self.energy_samples
            .iter()
            .max_by(|a, b| a.total_energy.total_cmp(&b.total_energy))
    }
}

/// Everything a run hands back to the caller.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// One record per measurement point, in configuration order
    pub measurements: Vec<MeasurementPoint>,

    /// Run statistics
    pub report: RunReport,
}

/// Configuration for energy monitoring during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnergyMonitorConfig {
    /// Sample energy every N steps (0 = disabled)
    #[serde(default)]
    pub sample_interval: u64,
}

impl EnergyMonitorConfig {
    /// Sample every `sample_interval` steps.
    pub fn every(sample_interval: u64) -> Self {
        Self { sample_interval }
    }

    /// Whether a sample is due after `step`.
    #[inline]
    pub fn is_due(&self, step: u64) -> bool {
        self.sample_interval > 0 && step % self.sample_interval == 0
    }
}

/// Energy per unit length in z at a specific step [J/m].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    /// Step when the sample was taken
    pub timestep: u64,

    /// Electric field energy
    pub e_energy: f64,

    /// Magnetic field energy
    pub h_energy: f64,

    /// Total energy (E + H)
    pub total_energy: f64,
}

impl EnergySample {
    /// Create a new energy sample.
    pub fn new(timestep: u64, e_energy: f64, h_energy: f64) -> Self {
        Self {
            timestep,
            e_energy,
            h_energy,
            total_energy: e_energy + h_energy,
        }
    }

    /// Compute energy from field data.
    pub fn from_fields(fields: &FieldState, op: &Operator) -> Self {
        let (e_energy, h_energy) = fields.energy(op);
        Self::new(fields.timestep(), e_energy, h_energy)
    }
}

/// Shared flag that stops a run at the next step boundary.
///
/// Clones share the same flag, so one clone can be handed to another
/// thread while the simulation holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag so the simulation can be run again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}
