//! Line-current sources.
//!
//! A source is a fixed position plus one of three current waveforms. The
//! waveform set is closed: every profile answers the same two questions,
//! the instantaneous current and the shortest wavelength it radiates.

use crate::constants::C0;
use crate::geometry::{GridShape, SimulationDomain};
use crate::{Error, Result};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Time profile of the injected current.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// `J0 · exp(-(t - tc)² / (2σ²))`
    GaussianPulse {
        /// Peak current [A]
        j0: f64,
        /// Time of the peak [s]
        tc: f64,
        /// Standard deviation [s]
        sigma: f64,
    },
    /// Gaussian envelope times `sin(ω_c · t)`
    GaussianModulatedRf {
        /// Peak envelope current [A]
        j0: f64,
        /// Time of the envelope peak [s]
        tc: f64,
        /// Envelope standard deviation [s]
        sigma: f64,
        /// Carrier angular frequency [rad/s]
        omega_c: f64,
    },
    /// `J0 · sin(ω_c · t)`
    Sine {
        /// Amplitude [A]
        j0: f64,
        /// Angular frequency [rad/s]
        omega_c: f64,
    },
}

impl Waveform {
    /// Gaussian pulse centred at `tc`.
    pub fn gaussian_pulse(j0: f64, tc: f64, sigma: f64) -> Self {
        Self::GaussianPulse { j0, tc, sigma }
    }

    /// Gaussian-modulated RF pulse.
    pub fn gaussian_modulated_rf(j0: f64, tc: f64, sigma: f64, omega_c: f64) -> Self {
        Self::GaussianModulatedRf {
            j0,
            tc,
            sigma,
            omega_c,
        }
    }

    /// Continuous sine.
    pub fn sine(j0: f64, omega_c: f64) -> Self {
        Self::Sine { j0, omega_c }
    }

    /// Build a waveform from a selector name and loose parameters.
    ///
    /// Fails with [`Error::UnsupportedProfile`] for an unknown selector or
    /// when a parameter the selected profile needs is missing.
    pub fn from_selector(
        selector: &str,
        j0: f64,
        tc: Option<f64>,
        sigma: Option<f64>,
        omega_c: Option<f64>,
    ) -> Result<Self> {
        let kind: ProfileKind = selector.parse()?;
        let need = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| {
                Error::UnsupportedProfile(format!("{kind} requires parameter `{name}`"))
            })
        };
        let waveform = match kind {
            ProfileKind::GaussianPulse => {
                Self::gaussian_pulse(j0, need(tc, "tc")?, need(sigma, "sigma")?)
            }
            ProfileKind::GaussianModulatedRf => Self::gaussian_modulated_rf(
                j0,
                need(tc, "tc")?,
                need(sigma, "sigma")?,
                need(omega_c, "omega_c")?,
            ),
            ProfileKind::Sine => Self::sine(j0, need(omega_c, "omega_c")?),
        };
        waveform.validate()?;
        Ok(waveform)
    }

    /// Selector of this waveform.
    pub fn kind(&self) -> ProfileKind {
        match self {
            Self::GaussianPulse { .. } => ProfileKind::GaussianPulse,
            Self::GaussianModulatedRf { .. } => ProfileKind::GaussianModulatedRf,
            Self::Sine { .. } => ProfileKind::Sine,
        }
    }

    /// Instantaneous current at time `t` [A].
    #[inline]
    pub fn current(&self, t: f64) -> f64 {
        match *self {
            Self::GaussianPulse { j0, tc, sigma } => j0 * gaussian(t, tc, sigma),
            Self::GaussianModulatedRf {
                j0,
                tc,
                sigma,
                omega_c,
            } => j0 * gaussian(t, tc, sigma) * (omega_c * t).sin(),
            Self::Sine { j0, omega_c } => j0 * (omega_c * t).sin(),
        }
    }

    /// Bandwidth estimate: highest significant angular frequency [rad/s].
    ///
    /// A Gaussian of width σ is taken to carry no energy above `3/σ`.
    pub fn omega_max(&self) -> f64 {
        match *self {
            Self::GaussianPulse { sigma, .. } => 3.0 / sigma,
            Self::GaussianModulatedRf { sigma, omega_c, .. } => 3.0 / sigma + omega_c,
            Self::Sine { omega_c, .. } => omega_c,
        }
    }

    /// Shortest wavelength radiated into a medium of permittivity `eps_r` [m].
    ///
    /// `2π · v_min / ω_max` with `v_min = c / sqrt(eps_r)`. Cells of a
    /// twentieth to a thirtieth of this keep numerical dispersion low.
    pub fn min_wavelength(&self, eps_r: f64) -> f64 {
        let v_min = C0 / eps_r.sqrt();
        2.0 * PI * v_min / self.omega_max()
    }

    /// Reject parameters that would make the current undefined or
    /// identically zero: non-finite values and a non-positive `sigma`.
    pub(crate) fn validate(&self) -> Result<()> {
        let (j0, tc, sigma, omega_c) = match *self {
            Self::GaussianPulse { j0, tc, sigma } => (j0, Some(tc), Some(sigma), None),
            Self::GaussianModulatedRf {
                j0,
                tc,
                sigma,
                omega_c,
            } => (j0, Some(tc), Some(sigma), Some(omega_c)),
            Self::Sine { j0, omega_c } => (j0, None, None, Some(omega_c)),
        };
        for (name, value) in [("j0", Some(j0)), ("tc", tc), ("sigma", sigma), ("omega_c", omega_c)] {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(Error::UnsupportedProfile(format!(
                        "{} needs a finite {name}, got {value}",
                        self.kind()
                    )));
                }
            }
        }
        if let Some(sigma) = sigma {
            if sigma <= 0.0 {
                return Err(Error::UnsupportedProfile(format!(
                    "{} needs a positive sigma, got {sigma}",
                    self.kind()
                )));
            }
        }
        Ok(())
    }
}

#[inline]
fn gaussian(t: f64, tc: f64, sigma: f64) -> f64 {
    let arg = t - tc;
    (-(arg * arg) / (2.0 * sigma * sigma)).exp()
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::GaussianPulse { j0, tc, sigma } => {
                write!(f, "gaussian pulse (J0 {j0} A, tc {tc:e} s, sigma {sigma:e} s)")
            }
            Self::GaussianModulatedRf {
                j0,
                tc,
                sigma,
                omega_c,
            } => write!(
                f,
                "gaussian modulated rf (J0 {j0} A, tc {tc:e} s, sigma {sigma:e} s, omega_c {omega_c:e} rad/s)"
            ),
            Self::Sine { j0, omega_c } => write!(f, "sine (J0 {j0} A, omega_c {omega_c:e} rad/s)"),
        }
    }
}

/// Selector naming a [`Waveform`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    /// `"gaussian_pulse"`
    GaussianPulse,
    /// `"gaussian_modulated_rf"`
    GaussianModulatedRf,
    /// `"sine"`
    Sine,
}

impl ProfileKind {
    /// Selector string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GaussianPulse => "gaussian_pulse",
            Self::GaussianModulatedRf => "gaussian_modulated_rf",
            Self::Sine => "sine",
        }
    }
}

impl FromStr for ProfileKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian_pulse" | "gaussian" => Ok(Self::GaussianPulse),
            "gaussian_modulated_rf" | "gaussian_modulated" => Ok(Self::GaussianModulatedRf),
            "sine" | "sin" => Ok(Self::Sine),
            other => Err(Error::UnsupportedProfile(format!("unknown selector `{other}`"))),
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Waveform injected at a fixed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceProfile {
    /// x position [m]
    pub pos_x: f64,
    /// y position [m]
    pub pos_y: f64,
    /// Current waveform
    pub waveform: Waveform,
}

impl SourceProfile {
    /// Place `waveform` at `(pos_x, pos_y)`.
    pub fn new(pos_x: f64, pos_y: f64, waveform: Waveform) -> Self {
        Self {
            pos_x,
            pos_y,
            waveform,
        }
    }

    /// Instantaneous current at time `t` [A].
    #[inline]
    pub fn current(&self, t: f64) -> f64 {
        self.waveform.current(t)
    }

    /// Shortest radiated wavelength in a medium of permittivity `eps_r` [m].
    pub fn min_wavelength(&self, eps_r: f64) -> f64 {
        self.waveform.min_wavelength(eps_r)
    }

    /// Check the waveform parameters and the position against the
    /// enclosure, and return the injection node.
    ///
    /// The node must be interior: injecting on a wall node would break the
    /// PEC condition.
    pub fn locate(&self, domain: &SimulationDomain, shape: &GridShape) -> Result<(usize, usize)> {
        self.waveform.validate()?;
        if !self.pos_x.is_finite() || !self.pos_y.is_finite() || !domain.contains(self.pos_x, self.pos_y) {
            return Err(Error::OutOfBounds(format!(
                "source at ({}, {}) lies outside the {} x {} m enclosure",
                self.pos_x, self.pos_y, domain.x_length, domain.y_length
            )));
        }
        let (i, j) = shape.node_index(self.pos_x, self.pos_y);
        if !shape.is_interior(i, j) {
            return Err(Error::OutOfBounds(format!(
                "source at ({}, {}) maps to wall node ({i}, {j})",
                self.pos_x, self.pos_y
            )));
        }
        Ok((i, j))
    }
}

impl fmt::Display for SourceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at ({} m, {} m)", self.waveform, self.pos_x, self.pos_y)
    }
}
