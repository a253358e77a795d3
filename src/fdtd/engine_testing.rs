//! Scenario-based physics tests for the simulation loop.
//!
//! A scenario builds a complete [`SimulationConfig`] and checks the physics
//! of the finished run. Every scenario is executed under both permittivity
//! averaging modes, and every run also watches the PEC walls after each step.
//!
//! Geometry below is given in whole cells plus a quarter or half cell so
//! that truncating `position / dx` lands on the intended index regardless
//! of rounding.

use crate::fdtd::{
    AveragingMode, EnergyMonitorConfig, FieldState, FnObserver, Operator, RunOutput, Simulation,
    SimulationConfig, SourceProfile, Waveform,
};
use crate::geometry::{DielectricRegion, Discretization, SimulationDomain};
use crate::{Error, Result};
use std::cell::RefCell;

/// A complete simulation test scenario with physics verification.
pub trait SimulationScenario {
    /// Scenario name for test identification.
    fn name(&self) -> &str;

    /// Build the configuration; the runner overrides the averaging mode.
    fn build(&self) -> SimulationConfig;

    /// Verify physical correctness after the run.
    fn verify(&self, result: &ScenarioResult) -> Result<()>;
}

/// Results from running a complete scenario.
pub struct ScenarioResult {
    /// Operator the run used
    pub operator: Operator,
    /// Probe series and report
    pub output: RunOutput,
    /// Field state after the last step
    pub final_fields: FieldState,
    /// Steps after which a wall node was non-zero
    pub wall_violations: Vec<u64>,
}

/// Run `scenario` with `mode` and verify it.
pub fn test_scenario_with_mode(scenario: &dyn SimulationScenario, mode: AveragingMode) -> Result<()> {
    let result = run_scenario(scenario, mode)?;
    if let Some(step) = result.wall_violations.first() {
        return Err(Error::Numerical(format!(
            "{}: PEC wall touched after step {step}",
            scenario.name()
        )));
    }
    scenario.verify(&result)
}

/// Run `scenario` with `mode` and return everything the checks need.
pub fn run_scenario(scenario: &dyn SimulationScenario, mode: AveragingMode) -> Result<ScenarioResult> {
    let config = scenario.build().with_averaging(mode);
    let violations = RefCell::new(Vec::new());

    let mut sim = Simulation::new(config)?;
    sim.set_observer(
        FnObserver::new("pec-walls", |fields: &FieldState, step| {
            if !fields.walls_are_zero() {
                violations.borrow_mut().push(step);
            }
        }),
        1,
    );
    let output = sim.run()?;
    let final_fields = sim.fields().clone();
    let operator = sim.operator().clone();
    drop(sim);

    Ok(ScenarioResult {
        operator,
        output,
        final_fields,
        wall_violations: violations.into_inner(),
    })
}

/// Step of the first sample whose magnitude exceeds `fraction` of the
/// largest magnitude in `samples`.
pub fn arrival_step(samples: &[f64], fraction: f64) -> Option<usize> {
    let peak = samples.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if peak == 0.0 {
        return None;
    }
    samples.iter().position(|v| v.abs() > fraction * peak)
}

/// Cell size shared by the scenarios.
const DX: f64 = 0.025;

/// Time step at half the Courant limit.
fn half_courant_dt() -> f64 {
    0.5 * Discretization::courant_limit(DX, DX)
}

/// Gaussian pulse with `σ = 4·dt` peaking at `5σ`.
fn short_pulse(dt: f64) -> Waveform {
    let sigma = 4.0 * dt;
    Waveform::gaussian_pulse(1.0, 5.0 * sigma, sigma)
}

/// Square enclosure of `cells × cells` cells, simulated for `steps` steps.
fn square_box(cells: f64, steps: f64, dt: f64) -> SimulationDomain {
    let side = (cells + 0.5) * DX;
    SimulationDomain::new(side, side, (steps + 0.5) * dt)
}

// =============================================================================
// TEST SCENARIOS
// =============================================================================

/// Scenario 1: closed PEC cavity with a dielectric block, energy conservation.
pub struct PecCavityScenario;

impl SimulationScenario for PecCavityScenario {
    fn name(&self) -> &str {
        "pec_cavity_energy_conservation"
    }

    fn build(&self) -> SimulationConfig {
        let dt = half_courant_dt();
        SimulationConfig::new(
            square_box(40.0, 600.0, dt),
            Discretization::new(DX, DX, dt),
            SourceProfile::new(20.5 * DX, 20.5 * DX, short_pulse(dt)),
        )
        .with_dielectric(DielectricRegion::new(4.25 * DX, 4.25 * DX, 10.25 * DX, 10.25 * DX, 2.0))
        .with_energy_monitor(EnergyMonitorConfig::every(10))
    }

    fn verify(&self, result: &ScenarioResult) -> Result<()> {
        let samples = &result.output.report.energy_samples;
        assert_eq!(samples.len(), 59);

        // The pulse is over after tc + 5σ = 40 steps
        let reference = samples
            .iter()
            .find(|s| s.timestep == 60)
            .map(|s| s.total_energy)
            .expect("sample at step 60");
        assert!(reference > 0.0);

        for sample in samples.iter().filter(|s| s.timestep > 60) {
            let drift = (sample.total_energy - reference).abs() / reference;
            assert!(
                drift < 0.10,
                "PEC cavity energy not conserved at step {}: {:.3e} vs {:.3e} ({:.1}%)",
                sample.timestep,
                sample.total_energy,
                reference,
                drift * 100.0
            );
        }
        Ok(())
    }
}

/// Scenario 2: continuous sine next to a wall, through a dielectric that
/// touches three walls.
pub struct BoundaryInvariantScenario;

impl SimulationScenario for BoundaryInvariantScenario {
    fn name(&self) -> &str {
        "boundary_invariant"
    }

    fn build(&self) -> SimulationConfig {
        let dt = half_courant_dt();
        let domain = square_box(30.0, 400.0, dt);
        let omega = 2.0 * std::f64::consts::PI / (20.0 * dt);
        SimulationConfig::new(
            domain,
            Discretization::new(DX, DX, dt),
            SourceProfile::new(1.5 * DX, 15.5 * DX, Waveform::sine(1.0, omega)),
        )
        .with_dielectric(DielectricRegion::new(
            20.25 * DX,
            0.0,
            domain.x_length - 20.25 * DX,
            domain.y_length,
            6.0,
        ))
        .with_probe_titled(1.5 * DX, 15.5 * DX, "source")
    }

    fn verify(&self, result: &ScenarioResult) -> Result<()> {
        // The run loop already checked the walls after every step
        assert!(result.wall_violations.is_empty());
        assert!(result.final_fields.walls_are_zero());
        assert!(result.final_fields.ez().max_abs() > 0.0);
        assert!(result.final_fields.is_finite());
        Ok(())
    }
}

/// Scenario 3: pulse in vacuum arrives after the light travel time.
pub struct FreePropagationScenario;

impl SimulationScenario for FreePropagationScenario {
    fn name(&self) -> &str {
        "free_propagation_delay"
    }

    fn build(&self) -> SimulationConfig {
        let dt = half_courant_dt();
        SimulationConfig::new(
            square_box(60.0, 120.0, dt),
            Discretization::new(DX, DX, dt),
            SourceProfile::new(20.5 * DX, 30.5 * DX, short_pulse(dt)),
        )
        .with_probe_titled(10.5 * DX, 30.5 * DX, "left")
        .with_probe_titled(30.5 * DX, 30.5 * DX, "right")
    }

    fn verify(&self, result: &ScenarioResult) -> Result<()> {
        let dt = result.operator.timestep();
        // short_pulse in units of dt
        let (tc, sigma) = (20.0, 4.0);
        let travel = 10.0 * DX / crate::constants::C0 / dt;

        let left = &result.output.measurements[0];
        let right = &result.output.measurements[1];
        let arrival = arrival_step(left.reflection_free_e_z(), 0.1).expect("left probe saw the pulse");

        // Leading edge crosses 10% between tc - 3σ and tc after the travel time
        assert!(
            arrival as f64 >= travel + tc - 3.0 * sigma && arrival as f64 <= travel + tc,
            "arrival at step {arrival}, light travel {travel:.1} steps"
        );

        // Both probes are ten cells from the source
        let right_arrival =
            arrival_step(right.reflection_free_e_z(), 0.1).expect("right probe saw the pulse");
        assert!(right_arrival.abs_diff(arrival) <= 1);
        Ok(())
    }
}

/// Scenario 4: a dielectric half-space delays the wavefront.
pub struct DielectricWavefrontScenario;

impl SimulationScenario for DielectricWavefrontScenario {
    fn name(&self) -> &str {
        "dielectric_slows_wavefront"
    }

    fn build(&self) -> SimulationConfig {
        let dt = half_courant_dt();
        let domain = square_box(60.0, 120.0, dt);
        SimulationConfig::new(
            domain,
            Discretization::new(DX, DX, dt),
            SourceProfile::new(20.5 * DX, 30.5 * DX, short_pulse(dt)),
        )
        .with_dielectric(DielectricRegion::new(
            22.25 * DX,
            0.0,
            domain.x_length - 22.25 * DX,
            domain.y_length,
            4.0,
        ))
        .with_probe_titled(10.5 * DX, 30.5 * DX, "vacuum")
        .with_probe_titled(30.5 * DX, 30.5 * DX, "dielectric")
    }

    fn verify(&self, result: &ScenarioResult) -> Result<()> {
        let dt = result.operator.timestep();
        let vacuum = &result.output.measurements[0];
        let dielectric = &result.output.measurements[1];

        let t_vacuum = arrival_step(vacuum.reflection_free_e_z(), 0.1).expect("vacuum arrival");
        let t_dielectric =
            arrival_step(dielectric.reflection_free_e_z(), 0.1).expect("dielectric arrival");

        // 8 of the 10 cells lie in a medium at half the speed of light
        let extra = 8.0 * DX / crate::constants::C0 / dt;
        assert!(
            (t_dielectric - t_vacuum) as f64 >= 0.5 * extra,
            "dielectric arrival {t_dielectric} vs vacuum {t_vacuum}, expected about {extra:.1} steps later"
        );

        let peak = |s: &[f64]| s.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(peak(dielectric.reflection_free_e_z()) < peak(vacuum.reflection_free_e_z()));
        Ok(())
    }
}

/// Generate one test per averaging mode for a scenario.
///
/// ```ignore
/// test_scenario!(PecCavityScenario, test_pec_cavity);
/// ```
///
/// expands to `test_pec_cavity_averaged()` and `test_pec_cavity_shifted()`.
macro_rules! test_scenario {
    ($scenario:expr, $test_name_base:ident) => {
        paste::paste! {
            #[test]
            fn [<$test_name_base _averaged>]() {
                let scenario = $scenario;
                $crate::fdtd::engine_testing::test_scenario_with_mode(
                    &scenario,
                    $crate::fdtd::AveragingMode::Averaged,
                )
                .unwrap();
            }

            #[test]
            fn [<$test_name_base _shifted>]() {
                let scenario = $scenario;
                $crate::fdtd::engine_testing::test_scenario_with_mode(
                    &scenario,
                    $crate::fdtd::AveragingMode::Shifted,
                )
                .unwrap();
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    test_scenario!(super::PecCavityScenario, test_pec_cavity);
    test_scenario!(super::BoundaryInvariantScenario, test_boundary_invariant);
    test_scenario!(super::FreePropagationScenario, test_free_propagation);
    test_scenario!(super::DielectricWavefrontScenario, test_dielectric_wavefront);

    #[test]
    fn test_arrival_step() {
        assert_eq!(arrival_step(&[0.0, 0.01, -0.5, 1.0, 0.2], 0.1), Some(2));
        assert_eq!(arrival_step(&[0.0, 0.0], 0.1), None);
    }

    #[test]
    fn test_modes_agree_in_vacuum() {
        let averaged = run_scenario(&FreePropagationScenario, AveragingMode::Averaged).unwrap();
        let shifted = run_scenario(&FreePropagationScenario, AveragingMode::Shifted).unwrap();
        assert_eq!(averaged.output.measurements, shifted.output.measurements);
    }
}
