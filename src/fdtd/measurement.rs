//! Point probes and reflection-free time windows.
//!
//! A probe maps its coordinates to a node by truncation and reads `H_x`,
//! `H_y` and `E_z` at that same index after every step. The three
//! components are really half a cell apart; that offset is not corrected.

use crate::constants::C0;
use crate::fdtd::fields::FieldState;
use crate::fdtd::operator::Operator;
use crate::geometry::SimulationDomain;
use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Requested probe location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSpec {
    /// x position [m]
    pub pos_x: f64,
    /// y position [m]
    pub pos_y: f64,
    /// Optional label
    #[serde(default)]
    pub title: Option<String>,
}

impl ProbeSpec {
    /// Unlabelled probe.
    pub fn new(pos_x: f64, pos_y: f64) -> Self {
        Self {
            pos_x,
            pos_y,
            title: None,
        }
    }

    /// Labelled probe.
    pub fn titled(pos_x: f64, pos_y: f64, title: impl Into<String>) -> Self {
        Self {
            pos_x,
            pos_y,
            title: Some(title.into()),
        }
    }
}

/// Earliest time a wall reflection can reach `probe` from `source` [s].
///
/// The probe is mirrored across each of the four walls; the closest mirror
/// image to the source gives the shortest reflected path.
pub fn interference_time(source: (f64, f64), probe: (f64, f64), domain: &SimulationDomain) -> f64 {
    let (sx, sy) = source;
    let (px, py) = probe;
    let images = [
        (-px, py),
        (px, -py),
        (2.0 * domain.x_length - px, py),
        (px, 2.0 * domain.y_length - py),
    ];
    let shortest = images
        .iter()
        .map(|&(ix, iy)| (ix - sx).hypot(iy - sy))
        .fold(f64::INFINITY, f64::min);
    shortest / C0
}

/// Time series recorded at one probe.
///
/// Sample `n` is taken right after step `n`. At that moment the `H` arrays
/// hold values at `(n - ½)·dt`, but the series labels them `(n + ½)·dt`,
/// half a step later, so that `E_z` and `H` samples share index `n` and the
/// `H` axis starts at `dt/2`. Shift by one `dt` when exact `H` timing matters.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementPoint {
    /// x position [m]
    pub pos_x: f64,
    /// y position [m]
    pub pos_y: f64,
    /// Label
    pub title: String,
    /// Earliest wall-reflection arrival [s]
    pub interference_time: f64,
    /// `H_x` samples, sample `n` at `(n + ½)·dt`
    pub h_x: Vec<f64>,
    /// `H_y` samples, sample `n` at `(n + ½)·dt`
    pub h_y: Vec<f64>,
    /// `E_z` samples, sample `n` at `n·dt`
    pub e_z: Vec<f64>,
    node: (usize, usize),
    hx_node: (usize, usize),
    hy_node: (usize, usize),
    dt: f64,
}

impl MeasurementPoint {
    /// Node `(i, j)` the probe reads `E_z` from.
    pub fn node(&self) -> (usize, usize) {
        self.node
    }

    /// Sample spacing [s].
    pub fn timestep(&self) -> f64 {
        self.dt
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.e_z.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.e_z.is_empty()
    }

    /// Sample times of `H_x` and `H_y` as labelled: `(n + ½)·dt`.
    pub fn time_h(&self) -> Vec<f64> {
        (0..self.len()).map(|n| (n as f64 + 0.5) * self.dt).collect()
    }

    /// Sample times of `E_z`: `n·dt`.
    pub fn time_e(&self) -> Vec<f64> {
        (0..self.len()).map(|n| n as f64 * self.dt).collect()
    }

    /// Number of leading `E_z` samples strictly before the interference time.
    pub fn reflection_free_len(&self) -> usize {
        let limit = (self.interference_time / self.dt).ceil();
        if limit.is_finite() {
            (limit.max(0.0) as usize).min(self.len())
        } else {
            self.len()
        }
    }

    /// `E_z` samples guaranteed free of wall reflections.
    pub fn reflection_free_e_z(&self) -> &[f64] {
        &self.e_z[..self.reflection_free_len()]
    }

    fn record(&mut self, fields: &FieldState) {
        self.h_x.push(fields.hx().get(self.hx_node.0, self.hx_node.1));
        self.h_y.push(fields.hy().get(self.hy_node.0, self.hy_node.1));
        self.e_z.push(fields.ez().get(self.node.0, self.node.1));
    }

    fn last_is_finite(&self) -> bool {
        [&self.h_x, &self.h_y, &self.e_z]
            .iter()
            .all(|series| series.last().map_or(true, |v| v.is_finite()))
    }
}

/// Samples every probe once per step.
#[derive(Debug, Clone)]
pub struct MeasurementCollector {
    points: Vec<MeasurementPoint>,
}

impl MeasurementCollector {
    /// Resolve probe locations on the operator grid.
    ///
    /// `source` is the physical source position used for the interference
    /// times. Buffers are pre-allocated for `Nt` samples.
    pub fn new(probes: &[ProbeSpec], source: (f64, f64), op: &Operator) -> Result<Self> {
        let domain = op.domain();
        let shape = op.shape();
        let mut points = Vec::with_capacity(probes.len());

        for probe in probes {
            if !probe.pos_x.is_finite()
                || !probe.pos_y.is_finite()
                || !domain.contains(probe.pos_x, probe.pos_y)
            {
                return Err(Error::OutOfBounds(format!(
                    "probe at ({}, {}) lies outside the {} x {} m enclosure",
                    probe.pos_x, probe.pos_y, domain.x_length, domain.y_length
                )));
            }
            let (i, j) = shape.node_index(probe.pos_x, probe.pos_y);
            let title = probe
                .title
                .clone()
                .unwrap_or_else(|| format!("({}, {})", probe.pos_x, probe.pos_y));
            let t_int = interference_time(source, (probe.pos_x, probe.pos_y), domain);
            debug!(
                "probe '{}' at node ({}, {}), reflection-free until {:.4e} s",
                title, i, j, t_int
            );

            points.push(MeasurementPoint {
                pos_x: probe.pos_x,
                pos_y: probe.pos_y,
                title,
                interference_time: t_int,
                h_x: Vec::with_capacity(shape.nt),
                h_y: Vec::with_capacity(shape.nt),
                e_z: Vec::with_capacity(shape.nt),
                node: (i, j),
                // H_x has Ny-1 rows and H_y has Nx-1 columns
                hx_node: (i, j.min(shape.ny - 2)),
                hy_node: (i.min(shape.nx - 2), j),
                dt: shape.dt,
            });
        }

        Ok(Self { points })
    }

    /// Append the current values at every probe.
    pub fn record(&mut self, fields: &FieldState) {
        for point in &mut self.points {
            point.record(fields);
        }
    }

    /// Title of the first probe whose latest sample is not finite.
    pub fn first_non_finite(&self) -> Option<&str> {
        self.points
            .iter()
            .find(|p| !p.last_is_finite())
            .map(|p| p.title.as_str())
    }

    /// Recorded series.
    pub fn points(&self) -> &[MeasurementPoint] {
        &self.points
    }

    /// Hand the series to the caller.
    pub fn into_points(self) -> Vec<MeasurementPoint> {
        self.points
    }
}
