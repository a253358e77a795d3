//! Immutable run configuration.
//!
//! A [`SimulationConfig`] is assembled once, either in code through the
//! `with_*` builder methods or from a TOML document, and then moved into
//! [`Simulation::new`](crate::fdtd::Simulation::new).
//!
//! ```toml
//! averaging = "averaged"
//!
//! [domain]
//! x_length = 1.0
//! y_length = 1.0
//! t_length = 2e-9
//!
//! [discretization]
//! dx = 5e-3
//! dy = 5e-3
//! dt = 1e-11
//!
//! [source]
//! profile = "gaussian_pulse"
//! pos_x = 0.3
//! pos_y = 0.5
//! tc = 4e-10
//! sigma = 1e-10
//!
//! [[dielectrics]]
//! pos_x = 0.5
//! pos_y = 0.0
//! width = 0.5
//! height = 1.0
//! eps_r = 4.0
//!
//! [[probes]]
//! pos_x = 0.6
//! pos_y = 0.5
//! title = "transmitted"
//! ```

use crate::fdtd::batch::EnergyMonitorConfig;
use crate::fdtd::excitation::{SourceProfile, Waveform};
use crate::fdtd::measurement::ProbeSpec;
use crate::fdtd::permittivity::AveragingMode;
use crate::geometry::{DielectricRegion, Discretization, OverlapPolicy, SimulationDomain};
use crate::{Error, Result};
use serde::Deserialize;

/// Default number of steps between full-grid finiteness checks.
pub const DEFAULT_CHECK_INTERVAL: u64 = 100;

/// Everything that determines the result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Enclosure size and simulated time span
    pub domain: SimulationDomain,
    /// Step sizes
    pub discretization: Discretization,
    /// Dielectric blocks, rasterized in this order
    pub dielectrics: Vec<DielectricRegion>,
    /// The single line source
    pub source: SourceProfile,
    /// Probe locations, reported in this order
    pub probes: Vec<ProbeSpec>,
    /// Node permittivity sampling
    pub averaging: AveragingMode,
    /// Handling of overlapping dielectrics
    pub overlap: OverlapPolicy,
    /// Energy sampling
    pub energy: EnergyMonitorConfig,
    /// Steps between full-grid finiteness checks (0 = only at the end)
    pub check_interval: u64,
}

impl SimulationConfig {
    /// Vacuum enclosure with one source, no probes and default policies.
    pub fn new(domain: SimulationDomain, discretization: Discretization, source: SourceProfile) -> Self {
        Self {
            domain,
            discretization,
            dielectrics: Vec::new(),
            source,
            probes: Vec::new(),
            averaging: AveragingMode::default(),
            overlap: OverlapPolicy::default(),
            energy: EnergyMonitorConfig::default(),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Append a dielectric region.
    pub fn with_dielectric(mut self, region: DielectricRegion) -> Self {
        self.dielectrics.push(region);
        self
    }

    /// Append several dielectric regions.
    pub fn with_dielectrics(mut self, regions: impl IntoIterator<Item = DielectricRegion>) -> Self {
        self.dielectrics.extend(regions);
        self
    }

    /// Append an unlabelled probe.
    pub fn with_probe(mut self, pos_x: f64, pos_y: f64) -> Self {
        self.probes.push(ProbeSpec::new(pos_x, pos_y));
        self
    }

    /// Append a labelled probe.
    pub fn with_probe_titled(mut self, pos_x: f64, pos_y: f64, title: impl Into<String>) -> Self {
        self.probes.push(ProbeSpec::titled(pos_x, pos_y, title));
        self
    }

    /// Choose the permittivity sampling mode.
    pub fn with_averaging(mut self, averaging: AveragingMode) -> Self {
        self.averaging = averaging;
        self
    }

    /// Choose how overlapping dielectrics are treated.
    pub fn with_overlap_policy(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Sample the field energy every `sample_interval` steps.
    pub fn with_energy_monitor(mut self, energy: EnergyMonitorConfig) -> Self {
        self.energy = energy;
        self
    }

    /// Steps between full-grid finiteness checks.
    pub fn with_check_interval(mut self, check_interval: u64) -> Self {
        self.check_interval = check_interval;
        self
    }

    /// Parse a TOML document.
    ///
    /// Syntax and schema errors map to [`Error::Config`]; an unknown
    /// `profile` selector to [`Error::UnsupportedProfile`]. Geometry is not
    /// validated here, that happens in `Simulation::new`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| Error::Config(format!("invalid TOML config: {e}")))?;
        file.try_into()
    }
}

impl std::str::FromStr for SimulationConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_toml_str(s)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    domain: SimulationDomain,
    discretization: Discretization,
    source: SourceSpec,
    #[serde(default)]
    dielectrics: Vec<DielectricRegion>,
    #[serde(default)]
    probes: Vec<ProbeSpec>,
    #[serde(default)]
    averaging: AveragingMode,
    #[serde(default)]
    overlap: OverlapPolicy,
    #[serde(default)]
    energy: EnergyMonitorConfig,
    #[serde(default = "default_check_interval")]
    check_interval: u64,
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL
}

/// Source table: a selector plus the parameters its profile needs.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceSpec {
    profile: String,
    pos_x: f64,
    pos_y: f64,
    #[serde(default = "default_amplitude")]
    j0: f64,
    tc: Option<f64>,
    sigma: Option<f64>,
    omega_c: Option<f64>,
}

fn default_amplitude() -> f64 {
    1.0
}

impl TryFrom<ConfigFile> for SimulationConfig {
    type Error = Error;

    fn try_from(file: ConfigFile) -> Result<Self> {
        let s = file.source;
        let waveform = Waveform::from_selector(&s.profile, s.j0, s.tc, s.sigma, s.omega_c)?;

        Ok(Self {
            domain: file.domain,
            discretization: file.discretization,
            dielectrics: file.dielectrics,
            source: SourceProfile::new(s.pos_x, s.pos_y, waveform),
            probes: file.probes,
            averaging: file.averaging,
            overlap: file.overlap,
            energy: file.energy,
            check_interval: file.check_interval,
        })
    }
}
