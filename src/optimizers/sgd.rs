//! Stochastic Gradient Descent (SGD) optimizer implementation
//!
//! Drives a borrowed [`NeuralNetwork`] with gradients from
//! [`NeuralNetwork::backpropagate`]. Each iteration samples one training pair
//! (or a minibatch drawn without replacement) and updates the weights:
//!
//! ```text
//! plain:     W = W - (η / b) * ΔW                 (per sampled pair)
//! momentum:  v = μ * v + Σ (η / b) * ΔW           (over the minibatch)
//!            W = W - v                             (once per iteration)
//! ```
//!
//! where η is the learning rate, μ the momentum coefficient and b the batch size.

use crate::error::{Error, Result};
use crate::network::{check_pairs, NeuralNetwork};
use crate::optimizers::{Optimizer, StopReason, TrainingReport};
use crate::utils::matrix::shapes;
use crate::utils::rng::seeded_rng;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};

/// Hyperparameters for [`StochasticGradientDescent`].
///
/// Every field has a default, so a JSON document only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SgdConfig {
    /// Step size η
    pub learning_rate: f64,
    /// Iteration cap for one `train` call
    pub max_iterations: usize,
    /// Velocity decay μ
    pub momentum: f64,
    /// Use the momentum update instead of plain per-pair updates
    pub use_momentum: bool,
    /// Target cost used by `fit`
    pub min_cost: f64,
    /// Minibatch size used by `fit` (values ≤ 1 mean single-pair updates)
    pub batch_size: usize,
    /// Seed for the pair sampler; `None` seeds from the clock
    pub seed: Option<u64>,
    /// Emit a progress event every this many iterations (0 disables it)
    pub log_interval: usize,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            max_iterations: 20_000,
            momentum: 0.9,
            use_momentum: true,
            min_cost: 1e-3,
            batch_size: 1,
            seed: None,
            log_interval: 1_000,
        }
    }
}

impl SgdConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidParameter(
                "learning_rate must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(Error::InvalidParameter(
                "momentum must be in range [0.0, 1.0)".to_string(),
            ));
        }
        if self.min_cost.is_nan() {
            return Err(Error::InvalidParameter(
                "min_cost must be a number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stochastic gradient descent with optional momentum and minibatches.
///
/// The velocity buffer is allocated on the first momentum update and persists
/// across `train` calls on the same instance; it is cleared only by
/// [`reset_velocity`](Self::reset_velocity) or by building a new optimizer.
///
/// # Example
///
/// ```
/// use feedforward_optimizers::network::NeuralNetwork;
/// use feedforward_optimizers::optimizers::{SgdConfig, StochasticGradientDescent};
/// use feedforward_optimizers::utils::ActivationFunction;
/// use ndarray::array;
///
/// let mut net = NeuralNetwork::new(&[2], 2, 1, ActivationFunction::Sigmoid).unwrap();
/// let config = SgdConfig { max_iterations: 10, seed: Some(3), ..SgdConfig::default() };
/// let mut sgd = StochasticGradientDescent::new(&mut net, config).unwrap();
/// let report = sgd
///     .train(&[array![0.0, 1.0]], &[array![1.0]], 1e-3, 1)
///     .unwrap();
/// assert!(report.steps <= 10);
/// ```
pub struct StochasticGradientDescent<'a> {
    network: &'a mut NeuralNetwork,
    config: SgdConfig,
    velocity: Option<Vec<Array2<f64>>>,
    rng: StdRng,
}

impl<'a> StochasticGradientDescent<'a> {
    /// Creates a new SGD optimizer bound to `network`.
    ///
    /// The sampler is seeded once here from `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for a non-positive learning rate,
    /// momentum outside `[0, 1)`, or a NaN `min_cost`.
    pub fn new(network: &'a mut NeuralNetwork, config: SgdConfig) -> Result<Self> {
        config.validate()?;
        let rng = seeded_rng(config.seed);
        Ok(Self {
            network,
            config,
            velocity: None,
            rng,
        })
    }

    /// Hyperparameters this optimizer was built with.
    pub fn config(&self) -> &SgdConfig {
        &self.config
    }

    /// Current step size η.
    pub fn learning_rate(&self) -> f64 {
        self.config.learning_rate
    }

    /// Current momentum velocity, if a momentum update has run.
    pub fn velocity(&self) -> Option<&[Array2<f64>]> {
        self.velocity.as_deref()
    }

    /// Drop the accumulated velocity.
    pub fn reset_velocity(&mut self) {
        self.velocity = None;
    }

    /// Train until `cost <= min_cost` or the iteration cap is reached.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Training inputs
    /// * `expecteds` - Expected outputs, paired with `inputs` by index
    /// * `min_cost` - Target cost; training stops once the cost is at or below it
    /// * `batch_size` - Pairs per iteration; values ≤ 1 sample a single pair
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchTooLarge`] before touching the weights if
    /// `batch_size` exceeds the number of pairs, plus any dataset or shape error
    /// from the network. Reaching the iteration cap is not an error.
    pub fn train(
        &mut self,
        inputs: &[Array1<f64>],
        expecteds: &[Array1<f64>],
        min_cost: f64,
        batch_size: usize,
    ) -> Result<TrainingReport> {
        check_pairs(inputs, expecteds)?;

        let dataset_size = inputs.len();
        if batch_size > 1 && batch_size > dataset_size {
            return Err(Error::BatchTooLarge {
                batch_size,
                dataset_size,
            });
        }
        let batch = batch_size.max(1);

        let mut cost = self.network.cost(inputs, expecteds)?;
        let mut iterations = 0;

        while cost > min_cost && iterations < self.config.max_iterations {
            let sampled = if batch == 1 {
                vec![self.rng.gen_range(0..dataset_size)]
            } else {
                index::sample(&mut self.rng, dataset_size, batch).into_vec()
            };

            if self.config.use_momentum {
                self.momentum_step(inputs, expecteds, &sampled, batch)?;
            } else {
                self.plain_step(inputs, expecteds, &sampled, batch)?;
            }

            iterations += 1;
            cost = self.network.cost(inputs, expecteds)?;

            if self.config.log_interval > 0 && iterations % self.config.log_interval == 0 {
                debug!(iteration = iterations, cost, "sgd progress");
            }
        }

        let stop_reason = if cost <= min_cost {
            StopReason::Converged
        } else {
            StopReason::IterationBudget
        };
        info!(iterations, cost, ?stop_reason, "sgd training finished");

        Ok(TrainingReport {
            steps: iterations,
            final_cost: cost,
            stop_reason,
        })
    }

    // Each sampled pair updates the weights immediately.
    fn plain_step(
        &mut self,
        inputs: &[Array1<f64>],
        expecteds: &[Array1<f64>],
        sampled: &[usize],
        batch: usize,
    ) -> Result<()> {
        let step = self.config.learning_rate / batch as f64;

        for &i in sampled {
            let gradients = self.network.backpropagate(&inputs[i], &expecteds[i])?;
            let mut weights = self.network.get_weights();
            for (w, g) in weights.iter_mut().zip(&gradients) {
                w.scaled_add(-step, g);
            }
            self.network.set_weights(weights)?;
        }
        Ok(())
    }

    // Gradients of the whole minibatch are taken at the same weights, folded
    // into the velocity, and applied once.
    fn momentum_step(
        &mut self,
        inputs: &[Array1<f64>],
        expecteds: &[Array1<f64>],
        sampled: &[usize],
        batch: usize,
    ) -> Result<()> {
        let step = self.config.learning_rate / batch as f64;
        let layer_shapes = shapes(self.network.weights());

        let mut accumulated: Vec<Array2<f64>> =
            layer_shapes.iter().map(|&dim| Array2::zeros(dim)).collect();
        for &i in sampled {
            let gradients = self.network.backpropagate(&inputs[i], &expecteds[i])?;
            for (acc, g) in accumulated.iter_mut().zip(&gradients) {
                acc.scaled_add(step, g);
            }
        }

        let momentum = self.config.momentum;
        let velocity = velocity_buffer(&mut self.velocity, &layer_shapes);
        for (v, acc) in velocity.iter_mut().zip(&accumulated) {
            *v *= momentum;
            *v += acc;
        }

        let mut weights = self.network.get_weights();
        for (w, v) in weights.iter_mut().zip(velocity.iter()) {
            *w -= v;
        }
        self.network.set_weights(weights)
    }
}

// Allocates (or re-allocates after a topology change) a zero velocity.
fn velocity_buffer<'v>(
    slot: &'v mut Option<Vec<Array2<f64>>>,
    layer_shapes: &[(usize, usize)],
) -> &'v mut Vec<Array2<f64>> {
    let stale = slot
        .as_ref()
        .map_or(true, |velocity| shapes(velocity) != layer_shapes);
    if stale {
        *slot = Some(layer_shapes.iter().map(|&dim| Array2::zeros(dim)).collect());
    }
    slot.get_or_insert_with(Vec::new)
}

impl Optimizer for StochasticGradientDescent<'_> {
    fn fit(
        &mut self,
        inputs: &[Array1<f64>],
        expecteds: &[Array1<f64>],
    ) -> Result<TrainingReport> {
        let (min_cost, batch_size) = (self.config.min_cost, self.config.batch_size);
        self.train(inputs, expecteds, min_cost, batch_size)
    }

    fn network(&self) -> &NeuralNetwork {
        &*self.network
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::activations::sigmoid;
    use crate::utils::ActivationFunction;
    use ndarray::array;

    fn single_unit() -> NeuralNetwork {
        NeuralNetwork::new(&[], 1, 1, ActivationFunction::Sigmoid).unwrap()
    }

    fn one_step(use_momentum: bool) -> SgdConfig {
        SgdConfig {
            learning_rate: 0.1,
            max_iterations: 1,
            use_momentum,
            seed: Some(5),
            ..SgdConfig::default()
        }
    }

    #[test]
    fn test_sgd_defaults() {
        let config = SgdConfig::default();
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.max_iterations, 20_000);
        assert_eq!(config.momentum, 0.9);
        assert!(config.use_momentum);
    }

    #[test]
    fn test_sgd_plain_update() {
        let mut net = single_unit();
        let mut sgd = StochasticGradientDescent::new(&mut net, one_step(false)).unwrap();

        let report = sgd.train(&[array![1.0]], &[array![1.0]], 0.0, 1).unwrap();
        assert_eq!(report.steps, 1);
        assert_eq!(report.stop_reason, StopReason::IterationBudget);

        // Zero weights give output 0.5, so ΔW = [-0.5, -0.5].
        let w = &sgd.network().weights()[0];
        assert!((w[[0, 0]] - 0.05).abs() < 1e-12);
        assert!((w[[0, 1]] - 0.05).abs() < 1e-12);
        assert!(sgd.velocity().is_none());
    }

    #[test]
    fn test_sgd_velocity_persists_across_calls() {
        let mut net = single_unit();
        let mut sgd = StochasticGradientDescent::new(&mut net, one_step(true)).unwrap();

        sgd.train(&[array![1.0]], &[array![1.0]], 0.0, 1).unwrap();
        let first = sgd.velocity().unwrap()[0][[0, 0]];
        assert!((first + 0.05).abs() < 1e-12);

        sgd.train(&[array![1.0]], &[array![1.0]], 0.0, 1).unwrap();
        let delta = sigmoid(0.1) - 1.0;
        let expected_velocity = 0.9 * -0.05 + 0.1 * delta;
        let v = sgd.velocity().unwrap()[0][[0, 0]];
        assert!((v - expected_velocity).abs() < 1e-12);

        let w = sgd.network().weights()[0][[0, 1]];
        assert!((w - (0.05 - expected_velocity)).abs() < 1e-12);
    }

    #[test]
    fn test_sgd_reset_velocity() {
        let mut net = single_unit();
        let mut sgd = StochasticGradientDescent::new(&mut net, one_step(true)).unwrap();
        sgd.train(&[array![1.0]], &[array![1.0]], 0.0, 1).unwrap();
        assert!(sgd.velocity().is_some());

        sgd.reset_velocity();
        assert!(sgd.velocity().is_none());
    }

    #[test]
    fn test_sgd_batch_too_large() {
        let mut net = single_unit();
        let mut sgd = StochasticGradientDescent::new(&mut net, SgdConfig::default()).unwrap();

        let result = sgd.train(&[array![1.0], array![0.0]], &[array![1.0], array![0.0]], 0.0, 3);
        assert!(matches!(
            result,
            Err(Error::BatchTooLarge {
                batch_size: 3,
                dataset_size: 2
            })
        ));
        assert!(sgd.network().weights()[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sgd_stops_when_already_converged() {
        let mut net = single_unit();
        let mut sgd = StochasticGradientDescent::new(&mut net, SgdConfig::default()).unwrap();

        let report = sgd.train(&[array![1.0]], &[array![1.0]], 10.0, 1).unwrap();
        assert_eq!(report.steps, 0);
        assert_eq!(report.stop_reason, StopReason::Converged);
    }

    #[test]
    fn test_sgd_full_batch_is_averaged() {
        let mut net = single_unit();
        let mut sgd = StochasticGradientDescent::new(&mut net, one_step(true)).unwrap();

        // Gradients for targets 1 and 0 cancel at zero weights.
        sgd.train(&[array![1.0], array![1.0]], &[array![1.0], array![0.0]], 0.0, 2)
            .unwrap();
        assert!(sgd.network().weights()[0].iter().all(|&v| v.abs() < 1e-12));
    }

    #[test]
    fn test_sgd_plain_batch_scales_each_pair() {
        let mut net = single_unit();
        let mut sgd = StochasticGradientDescent::new(&mut net, one_step(false)).unwrap();

        sgd.train(&[array![1.0], array![1.0]], &[array![1.0], array![1.0]], 0.0, 2)
            .unwrap();

        // First pair at zero weights: ΔW = [-0.5, -0.5], step 0.1 / 2.
        let after_first = 0.05 / 2.0;
        // Second pair sees the updated weights.
        let delta = sigmoid(2.0 * after_first) - 1.0;
        let expected = after_first - 0.05 * delta;
        for &w in sgd.network().weights()[0].iter() {
            assert!((w - expected).abs() < 1e-12, "weight {}", w);
        }
    }

    #[test]
    fn test_sgd_momentum_batch_sums_scaled_gradients() {
        let mut net = single_unit();
        let mut sgd = StochasticGradientDescent::new(&mut net, one_step(true)).unwrap();

        sgd.train(&[array![1.0], array![1.0]], &[array![1.0], array![1.0]], 0.0, 2)
            .unwrap();

        // v = 0.9 * 0 + 2 * (0.1 / 2) * -0.5, then W = -v.
        let expected_velocity = -0.05;
        for &v in sgd.velocity().unwrap()[0].iter() {
            assert!((v - expected_velocity).abs() < 1e-12, "velocity {}", v);
        }
        for &w in sgd.network().weights()[0].iter() {
            assert!((w + expected_velocity).abs() < 1e-12, "weight {}", w);
        }
    }

    #[test]
    fn test_sgd_rejects_invalid_config() {
        let bad = [
            SgdConfig {
                learning_rate: 0.0,
                ..SgdConfig::default()
            },
            SgdConfig {
                learning_rate: f64::NAN,
                ..SgdConfig::default()
            },
            SgdConfig {
                momentum: 1.0,
                ..SgdConfig::default()
            },
            SgdConfig {
                momentum: -0.1,
                ..SgdConfig::default()
            },
            SgdConfig {
                min_cost: f64::NAN,
                ..SgdConfig::default()
            },
        ];
        for config in bad {
            let mut net = single_unit();
            assert!(matches!(
                StochasticGradientDescent::new(&mut net, config),
                Err(Error::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_sgd_accessors_reflect_config() {
        let mut net = single_unit();
        let sgd = StochasticGradientDescent::new(&mut net, one_step(true)).unwrap();
        assert_eq!(sgd.learning_rate(), 0.1);
        assert_eq!(sgd.config().max_iterations, 1);
        assert!(sgd.config().use_momentum);
    }

    #[test]
    fn test_sgd_fit_uses_config() {
        let mut net = single_unit();
        let config = SgdConfig {
            max_iterations: 7,
            min_cost: 0.0,
            seed: Some(9),
            ..SgdConfig::default()
        };
        let mut sgd = StochasticGradientDescent::new(&mut net, config).unwrap();
        let report = sgd.fit(&[array![1.0]], &[array![1.0]]).unwrap();
        assert_eq!(report.steps, 7);
        assert_eq!(sgd.name(), "sgd");
    }
}
