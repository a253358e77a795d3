//! High-level simulation control.
//!
//! [`Simulation`] validates a [`SimulationConfig`], builds the operator once
//! and drives the leapfrog loop over steps `1..Nt`, sampling every probe
//! after each step.

use super::{
    CancelFlag, EnergySample, FieldState, MeasurementCollector, Observer, Operator, RunOutput,
    RunReport, SimulationConfig, TerminationReason,
};
use crate::{Error, Result};

use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use log::{info, warn};

/// Simulation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// Validated and ready to run
    Ready,
    /// Currently stepping
    Running,
    /// Last run simulated the full time span
    Finished,
    /// Last run was cancelled or stopped by an observer
    Stopped,
    /// Last run aborted with an error
    Failed,
}

struct ObserverSlot<'a> {
    observer: Box<dyn Observer + 'a>,
    every_n_steps: u64,
}

/// Main simulation controller.
///
/// Owns the operator, the field state and the probe buffers of one run; no
/// state is shared between simulations.
pub struct Simulation<'a> {
    /// Configuration the simulation was built from
    config: SimulationConfig,
    /// Grid, materials and coefficients
    operator: Operator,
    /// Current fields
    fields: FieldState,
    /// Injection node of the source
    source_node: (usize, usize),
    /// Resolved probes with empty buffers
    probes: MeasurementCollector,
    /// Optional periodic hook
    observer: Option<ObserverSlot<'a>>,
    /// Stop request shared with the caller
    cancel: CancelFlag,
    /// Show progress bar
    show_progress: bool,
    /// Current state
    state: SimulationState,
}

impl<'a> Simulation<'a> {
    /// Validate `config` and allocate the grid.
    ///
    /// Every configuration error surfaces here, before any stepping:
    /// discretization first, then dielectric regions, then the source and
    /// the probes. A time step above the Courant limit is only logged.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let operator = Operator::new(
            config.domain,
            config.discretization,
            &config.dielectrics,
            config.averaging,
            config.overlap,
        )?;
        let shape = *operator.shape();
        let source_node = config.source.locate(operator.domain(), &shape)?;
        let probes = MeasurementCollector::new(
            &config.probes,
            (config.source.pos_x, config.source.pos_y),
            &operator,
        )?;

        info!(
            "FDTD grid: {}x{} nodes, {} steps of {:.6e} s",
            shape.nx, shape.ny, shape.nt, shape.dt
        );
        info!(
            "Courant number {:.4}, Nyquist: {:.3e} Hz, estimated memory: {}",
            shape.courant_number(),
            shape.nyquist_frequency(),
            shape.memory_display()
        );
        info!("Source: {}", config.source);

        let courant = shape.courant_number();
        if courant > 1.0 {
            warn!(
                "dt = {:.6e} s exceeds the Courant limit {:.6e} s (ratio {:.4}); fields will diverge",
                shape.dt,
                shape.dt / courant,
                courant
            );
        }

        let lambda_min = config.source.min_wavelength(operator.permittivity().range().1);
        let cells = lambda_min / shape.dx.max(shape.dy);
        if cells < 20.0 {
            warn!(
                "only {:.1} cells per shortest wavelength ({:.4e} m); expect dispersion",
                cells, lambda_min
            );
        }

        let fields = FieldState::new(&shape);

        Ok(Self {
            config,
            operator,
            fields,
            source_node,
            probes,
            observer: None,
            cancel: CancelFlag::new(),
            show_progress: false,
            state: SimulationState::Ready,
        })
    }

    /// Enable/disable progress bar.
    pub fn set_show_progress(&mut self, show: bool) -> &mut Self {
        self.show_progress = show;
        self
    }

    /// Call `observer` after every `every_n_steps`-th step (at least 1).
    ///
    /// Replaces any previously set observer.
    pub fn set_observer(&mut self, observer: impl Observer + 'a, every_n_steps: u64) -> &mut Self {
        self.observer = Some(ObserverSlot {
            observer: Box::new(observer),
            every_n_steps: every_n_steps.max(1),
        });
        self
    }

    /// Remove the observer.
    pub fn clear_observer(&mut self) -> &mut Self {
        self.observer = None;
        self
    }

    /// Share an externally held cancellation flag.
    pub fn set_cancel_flag(&mut self, flag: CancelFlag) -> &mut Self {
        self.cancel = flag;
        self
    }

    /// Handle that cancels the run from elsewhere.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run from zero fields over steps `1..Nt`.
    ///
    /// Returns one [`MeasurementPoint`](super::MeasurementPoint) per probe
    /// with `Nt` samples (fewer if the run stopped early) and the run report.
    /// Non-finite fields abort the run with [`Error::Numerical`]; the
    /// observer still gets [`Observer::on_finish`] with the failed state.
    pub fn run(&mut self) -> Result<RunOutput> {
        self.state = SimulationState::Running;
        let result = self.execute();
        self.state = match &result {
            Ok(output) if output.report.completed() => SimulationState::Finished,
            Ok(_) => SimulationState::Stopped,
            Err(_) => SimulationState::Failed,
        };
        result
    }

    fn execute(&mut self) -> Result<RunOutput> {
        self.fields.reset();
        let mut collector = self.probes.clone();
        let shape = *self.operator.shape();

        if let Some(slot) = self.observer.as_mut() {
            slot.observer.on_start(&self.operator)?;
        }

        let progress = if self.show_progress {
            let pb = ProgressBar::new(shape.nt as u64 - 1);
            let style = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-");
            pb.set_style(style);
            Some(pb)
        } else {
            None
        };

        let start_time = Instant::now();
        let mut energy_samples = Vec::new();
        let outcome = self.step_loop(&mut collector, progress.as_ref(), &mut energy_samples);

        let finished = match self.observer.as_mut() {
            Some(slot) => slot.observer.on_finish(&self.fields),
            None => Ok(()),
        };

        let outcome = match (outcome, finished) {
            (Ok(done), Ok(())) => Ok(done),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(finish_err)) => {
                warn!("Observer finish hook failed after an aborted run: {}", finish_err);
                Err(e)
            }
        };
        let (steps_executed, termination_reason) = match outcome {
            Ok(done) => done,
            Err(e) => {
                if let Some(pb) = progress {
                    pb.abandon_with_message("Simulation failed");
                }
                warn!("Simulation aborted after step {}: {}", self.fields.timestep(), e);
                return Err(e);
            }
        };

        if let Some(pb) = progress {
            pb.finish_with_message("Simulation complete");
        }

        let elapsed_time = start_time.elapsed();
        let wall_time = elapsed_time.as_secs_f64();
        let speed = if wall_time > 0.0 {
            (steps_executed as f64 * shape.num_nodes() as f64) / wall_time / 1e6
        } else {
            0.0
        };
        info!(
            "Completed {} steps ({:.4e} s simulated) in {:.2}s ({:.2} MC/s)",
            steps_executed,
            steps_executed as f64 * shape.dt,
            wall_time,
            speed
        );

        Ok(RunOutput {
            measurements: collector.into_points(),
            report: RunReport {
                steps_executed,
                termination_reason,
                energy_samples,
                elapsed_time,
            },
        })
    }

    /// Steps `1..Nt` until done, cancelled, stopped by the observer or the
    /// fields stop being finite.
    fn step_loop(
        &mut self,
        collector: &mut MeasurementCollector,
        progress: Option<&ProgressBar>,
        energy_samples: &mut Vec<EnergySample>,
    ) -> Result<(u64, TerminationReason)> {
        let dt = self.operator.timestep();
        let max_steps = self.operator.shape().nt as u64 - 1;
        let check_interval = self.config.check_interval;
        let energy_monitor = self.config.energy;
        let mut termination_reason = TerminationReason::StepsCompleted;
        let mut steps_executed = 0u64;

        collector.record(&self.fields);

        for n in 1..=max_steps {
            if self.cancel.is_cancelled() {
                info!("Simulation cancelled after {} steps", steps_executed);
                termination_reason = TerminationReason::Cancelled;
                break;
            }

            // H advances to (n - 1/2)·dt, so the source is sampled there too
            let current = self.config.source.current((n as f64 - 0.5) * dt);
            self.fields.step(&self.operator, self.source_node, current);
            steps_executed = n;

            collector.record(&self.fields);
            if let Some(title) = collector.first_non_finite() {
                return Err(Error::Numerical(format!(
                    "non-finite field at probe '{title}' after step {n}"
                )));
            }
            if check_interval > 0 && n % check_interval == 0 {
                self.check_finite(n)?;
            }

            if energy_monitor.is_due(n) {
                energy_samples.push(EnergySample::from_fields(&self.fields, &self.operator));
            }

            if let Some(slot) = self.observer.as_mut() {
                if n % slot.every_n_steps == 0 {
                    slot.observer.observe(&self.fields, n)?;
                    if let Some(reason) = slot.observer.check_termination() {
                        info!(
                            "Observer '{}' stopped simulation: {} at step {}",
                            slot.observer.name(),
                            reason,
                            n
                        );
                        termination_reason = TerminationReason::ObserverStop {
                            observer: slot.observer.name().to_string(),
                            reason,
                        };
                        break;
                    }
                }
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        self.check_finite(steps_executed)?;
        Ok((steps_executed, termination_reason))
    }

    fn check_finite(&self, step: u64) -> Result<()> {
        if self.fields.is_finite() {
            Ok(())
        } else {
            Err(Error::Numerical(format!(
                "field values are no longer finite after step {step}"
            )))
        }
    }

    /// Configuration the simulation was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Grid, materials and coefficients.
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Field state after the last run (zero before the first).
    pub fn fields(&self) -> &FieldState {
        &self.fields
    }

    /// Node the source current is injected at.
    pub fn source_node(&self) -> (usize, usize) {
        self.source_node
    }

    /// Get the current state.
    pub fn state(&self) -> SimulationState {
        self.state
    }
}
