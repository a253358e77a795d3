//! Post-processing of probe series.
//!
//! Helpers for the usual validation experiments: compare reflection-free
//! peak amplitudes against the normal-incidence Fresnel coefficients, and
//! look at the spectrum of a windowed series normalized by the analytic
//! spectrum of the Gaussian source. In vacuum that normalized spectrum is
//! the field of an infinite line current, `-μ0·ω/4 · H0⁽²⁾(ω·r/c)`.

use crate::constants::{C0, MU0};
use crate::fdtd::{MeasurementPoint, Waveform};
use puruspe::{Jn, Yn};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::PI;

/// Largest absolute value in `samples` (0 for an empty slice).
pub fn peak_amplitude(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0f64, |m, v| m.max(v.abs()))
}

/// Ratio of the reflection-free `E_z` peaks of `measured` and `reference`.
///
/// With `reference` recorded at the same place in an otherwise identical
/// vacuum run, this estimates the transmission coefficient.
pub fn peak_ratio(measured: &MeasurementPoint, reference: &MeasurementPoint) -> f64 {
    peak_amplitude(measured.reflection_free_e_z()) / peak_amplitude(reference.reflection_free_e_z())
}

/// Normal-incidence amplitude transmission from vacuum into `eps_r`:
/// `2 / (√ε_r + 1)`.
pub fn fresnel_transmission(eps_r: f64) -> f64 {
    2.0 / (eps_r.sqrt() + 1.0)
}

/// Normal-incidence amplitude reflection from vacuum off `eps_r`:
/// `(1 - √ε_r) / (1 + √ε_r)`.
pub fn fresnel_reflection(eps_r: f64) -> f64 {
    let n = eps_r.sqrt();
    (1.0 - n) / (1.0 + n)
}

/// Fourier transform `J0·√(2π)·σ·exp(-σ²ω²/2)` of a Gaussian pulse,
/// magnitude only.
pub fn gaussian_spectrum(j0: f64, sigma: f64, omega: f64) -> f64 {
    j0 * (2.0 * PI).sqrt() * sigma * (-(sigma * sigma) * omega * omega / 2.0).exp()
}

/// Analytic spectrum magnitude of a pulsed `waveform`.
///
/// The modulated pulse keeps only the sideband around `+ω_c`; its mirror
/// at `-ω_c` is below `exp(-(σ·ω_c)²/2)` of the peak. A continuous sine has
/// no finite spectrum and yields `None`.
pub fn source_spectrum(waveform: &Waveform, omega: f64) -> Option<f64> {
    match *waveform {
        Waveform::GaussianPulse { j0, sigma, .. } => Some(gaussian_spectrum(j0, sigma, omega)),
        Waveform::GaussianModulatedRf {
            j0, sigma, omega_c, ..
        } => Some(0.5 * gaussian_spectrum(j0, sigma, omega - omega_c)),
        Waveform::Sine { .. } => None,
    }
}

/// Angular frequency band `[ω_c - 3/σ, ω_c + 3/σ]` carried by a pulsed
/// waveform, clipped at 0. `ω_c = 0` for the plain Gaussian pulse.
pub fn source_band(waveform: &Waveform) -> Option<(f64, f64)> {
    let (sigma, omega_c) = match *waveform {
        Waveform::GaussianPulse { sigma, .. } => (sigma, 0.0),
        Waveform::GaussianModulatedRf { sigma, omega_c, .. } => (sigma, omega_c),
        Waveform::Sine { .. } => return None,
    };
    Some(((omega_c - 3.0 / sigma).max(0.0), omega_c + 3.0 / sigma))
}

/// `E_z(ω)` at distance `r` from an infinite line current `j0` in vacuum:
/// `-j0·μ0·ω/4 · H0⁽²⁾(ω·r/c)` with `H0⁽²⁾ = J0 - i·Y0`.
///
/// Needs `r > 0` and `omega > 0`; the Hankel function diverges at 0.
pub fn line_source_reference(j0: f64, r: f64, omega: f64) -> Complex<f64> {
    let z = omega * r / C0;
    let scale = -j0 * MU0 * omega / 4.0;
    Complex::new(scale * Jn(0, z), -scale * Yn(0, z))
}

/// Reflection-free `E_z` spectrum of `point` per unit source spectrum,
/// restricted to [`source_band`].
///
/// In vacuum this approaches `|line_source_reference(1, r, ω)|`. Bins
/// below a few `2π / T` of the window length `T` carry the truncation of
/// the slowly decaying 2D tail and should not be compared.
pub fn transfer_spectrum(point: &MeasurementPoint, waveform: &Waveform, pad_to: usize) -> Option<Spectrum> {
    let (lo, hi) = source_band(waveform)?;
    let band = amplitude_spectrum(point.reflection_free_e_z(), point.timestep(), pad_to).restrict(lo, hi);
    let magnitude = band
        .omega
        .iter()
        .zip(&band.magnitude)
        .map(|(&w, &m)| source_spectrum(waveform, w).map(|s| m / s))
        .collect::<Option<Vec<f64>>>()?;
    Some(Spectrum {
        omega: band.omega,
        magnitude,
    })
}

/// One-sided magnitude spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Angular frequency of each bin [rad/s]
    pub omega: Vec<f64>,
    /// `|X(ω)|·dt`
    pub magnitude: Vec<f64>,
}

impl Spectrum {
    /// Keep only the bins with `lo <= ω <= hi`.
    pub fn restrict(&self, lo: f64, hi: f64) -> Spectrum {
        let (omega, magnitude) = self
            .omega
            .iter()
            .zip(&self.magnitude)
            .filter(|(w, _)| **w >= lo && **w <= hi)
            .map(|(w, m)| (*w, *m))
            .unzip();
        Spectrum { omega, magnitude }
    }

    /// Bin with the largest magnitude, as `(ω, |X|)`.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.omega
            .iter()
            .zip(&self.magnitude)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(w, m)| (*w, *m))
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.omega.len()
    }

    /// Whether there are no bins.
    pub fn is_empty(&self) -> bool {
        self.omega.is_empty()
    }
}

/// Zero-padded DFT of a real series sampled every `dt`.
///
/// The series is zero-padded to `pad_to` points; a `pad_to` shorter than
/// the series leaves it unpadded. Returns bins `0..=N/2` at
/// `ω_k = 2πk / (N·dt)` with magnitudes scaled by `dt`, so they approximate
/// the continuous transform.
pub fn amplitude_spectrum(samples: &[f64], dt: f64, pad_to: usize) -> Spectrum {
    let n = pad_to.max(samples.len());
    if n == 0 {
        return Spectrum {
            omega: Vec::new(),
            magnitude: Vec::new(),
        };
    }

    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .map(|&v| Complex::new(v, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(n)
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let bins = n / 2 + 1;
    let d_omega = 2.0 * PI / (n as f64 * dt);
    Spectrum {
        omega: (0..bins).map(|k| k as f64 * d_omega).collect(),
        magnitude: buffer[..bins].iter().map(|c| c.norm() * dt).collect(),
    }
}
