//! FDTD core: operator, field update, sources, probes and the run loop.

mod batch;
mod config;
mod excitation;
mod fields;
mod measurement;
mod observer;
mod operator;
mod permittivity;
mod simulation;

#[cfg(test)]
mod engine_testing;

pub use batch::{
    CancelFlag, EnergyMonitorConfig, EnergySample, RunOutput, RunReport, TerminationReason,
};
pub use config::{SimulationConfig, DEFAULT_CHECK_INTERVAL};
pub use excitation::{ProfileKind, SourceProfile, Waveform};
pub use fields::FieldState;
pub use measurement::{interference_time, MeasurementCollector, MeasurementPoint, ProbeSpec};
pub use observer::{FnObserver, Observer, Snapshot, SnapshotRecorder};
pub use operator::{EFieldCoefficients, HFieldCoefficients, Operator};
pub use permittivity::{AveragingMode, PermittivityMap};
pub use simulation::{Simulation, SimulationState};
