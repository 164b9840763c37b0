//! Module driving the stages of the Runge-Kutta scheme over the whole network.
//!
//! A step goes through the phases `Idle -> StageEval(0) -> ... -> StageEval(3) -> Combine -> Idle`.
//! Every stage is completed for all neurons of all populations before the next one starts. Calling
//! a phase out of order is a programming error and panics.
use derivative::Derivative;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::CortexError;
use crate::integrator::NUM_STAGES;
use crate::network::Network;

/// The phase of the stepper within a step.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Phase {
    /// Between two steps.
    Idle,
    /// Waiting for the evaluation of a stage.
    StageEval(usize),
    /// Waiting for the combination of the stages.
    Combine,
}

/// Stepper advancing a network by fixed steps on a dedicated worker pool.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Stepper {
    dt: f64,
    phase: Phase,
    num_steps: usize,
    #[derivative(Debug = "ignore")]
    pool: ThreadPool,
}

impl Stepper {
    /// Create a stepper with a step size `dt` (ms) and a pool of `num_threads` worker threads.
    pub fn new(dt: f64, num_threads: usize) -> Result<Self, CortexError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(CortexError::InvalidParameters(format!(
                "The step size must be positive, got {}",
                dt
            )));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| CortexError::ThreadPool(e.to_string()))?;
        Ok(Stepper {
            dt,
            phase: Phase::Idle,
            num_steps: 0,
            pool,
        })
    }

    /// Returns the step size (ms).
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the number of completed steps.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Returns the number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Start a new step.
    pub fn begin(&mut self) {
        assert_eq!(self.phase, Phase::Idle, "A step is already in progress");
        self.phase = Phase::StageEval(0);
    }

    /// Evaluate the pending stage for every neuron of the network.
    pub fn evaluate_stage(&mut self, network: &mut Network) {
        let stage = match self.phase {
            Phase::StageEval(stage) => stage,
            phase => panic!("No stage to evaluate in phase {:?}", phase),
        };
        let dt = self.dt;
        self.pool.install(|| network.evaluate_stage(stage, dt));
        self.phase = if stage + 1 < NUM_STAGES {
            Phase::StageEval(stage + 1)
        } else {
            Phase::Combine
        };
    }

    /// Combine the stages of every neuron of the network into their new accepted state.
    pub fn combine(&mut self, network: &mut Network) {
        assert_eq!(self.phase, Phase::Combine, "The stages are not all evaluated");
        self.pool.install(|| network.combine());
        self.phase = Phase::Idle;
        self.num_steps += 1;
    }

    /// Advance the network by one step.
    pub fn step(&mut self, network: &mut Network) {
        self.begin();
        for _ in 0..NUM_STAGES {
            self.evaluate_stage(network);
        }
        self.combine(network);
    }
}
