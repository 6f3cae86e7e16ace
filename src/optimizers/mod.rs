//! Weight optimizers for feedforward networks
//!
//! This module provides the Optimizer trait and the two training strategies that
//! drive a [`NeuralNetwork`]:
//!
//! - [`StochasticGradientDescent`]: gradient updates from backpropagation, with
//!   optional momentum and minibatches. Stops at a target cost or an iteration cap.
//! - [`EvolutionaryProgramming`]: self-adaptive Cauchy mutation with tournament
//!   selection. Stops when its fitness-evaluation budget is spent.
//!
//! Both optimizers hold the network by exclusive borrow for their lifetime and
//! only touch it through `get_weights`/`set_weights`, `cost`, and `backpropagate`.
//!
//! # Example
//!
//! ```ignore
//! use feedforward_optimizers::optimizers::{Optimizer, SgdConfig, StochasticGradientDescent};
//!
//! let mut sgd = StochasticGradientDescent::new(&mut network, SgdConfig::default())?;
//! let report = sgd.fit(&inputs, &expecteds)?;
//! println!("stopped after {} iterations: {:?}", report.steps, report.stop_reason);
//! ```

pub mod evolution;
pub mod sgd;

pub use evolution::{EvolutionConfig, EvolutionaryProgramming, Individual};
pub use sgd::{SgdConfig, StochasticGradientDescent};

use crate::error::Result;
use crate::network::NeuralNetwork;
use ndarray::Array1;

/// Why a training run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Cost fell to or below the requested minimum
    Converged,
    /// Iteration cap reached first
    IterationBudget,
    /// Fitness-evaluation budget spent
    EvaluationBudget,
}

/// Summary of a finished training run.
///
/// Hitting a budget is a normal outcome; inspect `final_cost` when the quality
/// of the result matters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Iterations (SGD) or fitness evaluations (evolution) consumed
    pub steps: usize,
    /// Cost of the weights left in the network
    pub final_cost: f64,
    /// Termination cause
    pub stop_reason: StopReason,
}

/// Core trait for network weight optimizers.
///
/// `fit` runs a full training call using the stopping criteria held in the
/// optimizer's configuration, so drivers can pick a strategy at runtime.
pub trait Optimizer {
    /// Train the borrowed network on paired inputs and expected outputs.
    fn fit(&mut self, inputs: &[Array1<f64>], expecteds: &[Array1<f64>])
        -> Result<TrainingReport>;

    /// The network being trained.
    fn network(&self) -> &NeuralNetwork;

    /// Short strategy name for logs.
    fn name(&self) -> &'static str;
}
