//! Fully-connected feedforward network with bias folded into its weights
//!
//! The network is a plain owner of weight matrices. Optimizers borrow it
//! mutably, read the whole weight set, and replace it through
//! [`NeuralNetwork::set_weights`]; there is no partial in-place update channel.
//!
//! Layer `k` maps `units(k)` inputs to `units(k + 1)` outputs through a matrix of
//! shape `(units(k + 1), units(k) + 1)`. Column 0 holds the bias weights (see
//! [`crate::utils::matrix`]).

use crate::error::{Error, Result};
use crate::utils::matrix::{add_bias_unit, outer_product};
use crate::utils::ActivationFunction;
use ndarray::{s, Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::collections::VecDeque;

/// Default centre of the weight initialization distribution.
pub const DEFAULT_EPSILON: f64 = 0.12;

/// Feedforward network sharing one activation function across all layers.
///
/// # Example
///
/// ```
/// use feedforward_optimizers::network::NeuralNetwork;
/// use feedforward_optimizers::utils::ActivationFunction;
///
/// let net = NeuralNetwork::new(&[2], 2, 1, ActivationFunction::Sigmoid).unwrap();
/// assert_eq!(net.weights().len(), 2);
/// assert_eq!(net.weights()[0].dim(), (2, 3));
/// ```
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    input_size: usize,
    output_size: usize,
    weights: Vec<Array2<f64>>,
    activation: ActivationFunction,
}

impl NeuralNetwork {
    /// Create a network with zeroed weights.
    ///
    /// # Arguments
    ///
    /// * `hidden_sizes` - Widths of the hidden layers, in order (may be empty)
    /// * `input_size` - Number of input units
    /// * `output_size` - Number of output units
    /// * `activation` - Activation applied after every layer
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTopology`] if any width is zero.
    pub fn new(
        hidden_sizes: &[usize],
        input_size: usize,
        output_size: usize,
        activation: ActivationFunction,
    ) -> Result<Self> {
        let mut units = Vec::with_capacity(hidden_sizes.len() + 2);
        units.push(input_size);
        units.extend_from_slice(hidden_sizes);
        units.push(output_size);

        if let Some(position) = units.iter().position(|&width| width == 0) {
            return Err(Error::InvalidTopology(format!(
                "layer {} has zero units",
                position
            )));
        }

        let weights = units
            .windows(2)
            .map(|pair| Array2::zeros((pair[1], pair[0] + 1)))
            .collect();

        Ok(Self {
            input_size,
            output_size,
            weights,
            activation,
        })
    }

    /// Number of input units.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Number of output units.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Activation shared by every layer.
    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    /// Borrow the current weight matrices.
    pub fn weights(&self) -> &[Array2<f64>] {
        &self.weights
    }

    /// Copy of the current weight matrices.
    pub fn get_weights(&self) -> Vec<Array2<f64>> {
        self.weights.clone()
    }

    /// Replace the whole weight set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WeightCount`] or [`Error::WeightShape`] if the new set
    /// does not match the network topology; the current weights are kept.
    pub fn set_weights(&mut self, weights: Vec<Array2<f64>>) -> Result<()> {
        if weights.len() != self.weights.len() {
            return Err(Error::WeightCount {
                expected: self.weights.len(),
                actual: weights.len(),
            });
        }
        for (index, (current, new)) in self.weights.iter().zip(&weights).enumerate() {
            if current.dim() != new.dim() {
                return Err(Error::WeightShape {
                    index,
                    expected: current.dim(),
                    actual: new.dim(),
                });
            }
        }
        self.weights = weights;
        Ok(())
    }

    /// Total number of scalar weights, bias weights included.
    pub fn parameter_count(&self) -> usize {
        self.weights.iter().map(|w| w.len()).sum()
    }

    /// Fill every weight from `Normal(epsilon, 2 * epsilon)`.
    ///
    /// The distribution is centred on `epsilon`, not on zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `epsilon` is negative or not finite.
    pub fn initialize_random_weights<R: Rng + ?Sized>(
        &mut self,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<()> {
        if !(epsilon.is_finite() && epsilon >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "initialization epsilon {} must be finite and non-negative",
                epsilon
            )));
        }
        let normal = Normal::new(epsilon, 2.0 * epsilon).map_err(|e| {
            Error::InvalidParameter(format!("initialization epsilon {}: {}", epsilon, e))
        })?;

        for w in &mut self.weights {
            for value in w.iter_mut() {
                *value = normal.sample(rng);
            }
        }
        Ok(())
    }

    /// Forward inference.
    ///
    /// Computes `a' = activation(W · [1; a])` layer by layer and returns the
    /// activated output of the last layer. Does not mutate the network.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputShape`] if `input` does not match the input width.
    pub fn feed_forward(&self, input: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_input(input)?;

        let mut current = input.clone();
        for w in &self.weights {
            let z = w.dot(&add_bias_unit(&current));
            current = z.mapv(|v| self.activation.activation(v));
        }
        Ok(current)
    }

    /// Weight gradients for one training pair.
    ///
    /// The output error is `a_final - expected`, which is the exact gradient of
    /// the cross-entropy cost for sigmoid outputs. Hidden deltas are
    /// `(W[k+1]ᵀ · delta[k+1])[1..] ⊙ gradient(z[k])`, and each returned matrix is
    /// `delta[k] ⊗ a[k]` where `a[k]` is the bias-augmented input of layer `k`.
    /// The result has exactly one matrix per weight matrix, with matching shapes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputShape`] or [`Error::OutputShape`] on a length mismatch.
    pub fn backpropagate(
        &self,
        input: &Array1<f64>,
        expected: &Array1<f64>,
    ) -> Result<Vec<Array2<f64>>> {
        self.check_input(input)?;
        self.check_expected(expected)?;

        // Bias-augmented layer inputs and pre-activation layer outputs.
        let mut layer_inputs = Vec::with_capacity(self.weights.len());
        let mut pre_activations = Vec::with_capacity(self.weights.len());

        let mut current = input.clone();
        for w in &self.weights {
            let augmented = add_bias_unit(&current);
            let z = w.dot(&augmented);
            current = z.mapv(|v| self.activation.activation(v));
            layer_inputs.push(augmented);
            pre_activations.push(z);
        }

        let mut deltas = VecDeque::with_capacity(self.weights.len());
        deltas.push_front(&current - expected);

        for k in (1..self.weights.len()).rev() {
            let next = &deltas[0];
            let step_back = self.weights[k].t().dot(next);
            let slope = pre_activations[k - 1].mapv(|v| self.activation.gradient(v));
            let delta = &step_back.slice(s![1..]) * &slope;
            deltas.push_front(delta);
        }

        Ok(deltas
            .iter()
            .zip(&layer_inputs)
            .map(|(delta, a)| outer_product(delta, a))
            .collect())
    }

    /// Mean binary cross-entropy over paired inputs and expected outputs.
    ///
    /// `-(1/N) Σ Σ_i [y_i ln ŷ_i + (1 - y_i) ln(1 - ŷ_i)]`
    ///
    /// Outputs of exactly 0 or 1 make the logarithm singular and produce an
    /// infinite or NaN cost. This is not guarded; keep activations inside the
    /// open interval (0, 1).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetMismatch`], [`Error::EmptyDataset`], or any
    /// shape error from the forward pass.
    pub fn cost(&self, inputs: &[Array1<f64>], expecteds: &[Array1<f64>]) -> Result<f64> {
        check_pairs(inputs, expecteds)?;

        let mut total = 0.0;
        for (input, expected) in inputs.iter().zip(expecteds) {
            self.check_expected(expected)?;
            let predicted = self.feed_forward(input)?;
            total += predicted
                .iter()
                .zip(expected.iter())
                .map(|(&y_hat, &y)| y * y_hat.ln() + (1.0 - y) * (1.0 - y_hat).ln())
                .sum::<f64>();
        }

        Ok(-total / inputs.len() as f64)
    }

    fn check_input(&self, input: &Array1<f64>) -> Result<()> {
        if input.len() != self.input_size {
            return Err(Error::InputShape {
                expected: self.input_size,
                actual: input.len(),
            });
        }
        Ok(())
    }

    fn check_expected(&self, expected: &Array1<f64>) -> Result<()> {
        if expected.len() != self.output_size {
            return Err(Error::OutputShape {
                expected: self.output_size,
                actual: expected.len(),
            });
        }
        Ok(())
    }
}

/// Validate that inputs and expected outputs form a non-empty paired set.
pub(crate) fn check_pairs(inputs: &[Array1<f64>], expecteds: &[Array1<f64>]) -> Result<()> {
    if inputs.len() != expecteds.len() {
        return Err(Error::DatasetMismatch {
            inputs: inputs.len(),
            expecteds: expecteds.len(),
        });
    }
    if inputs.is_empty() {
        return Err(Error::EmptyDataset);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rng::seeded_rng;
    use ndarray::array;

    fn xor_network() -> NeuralNetwork {
        let mut net = NeuralNetwork::new(&[2], 2, 1, ActivationFunction::Sigmoid).unwrap();
        net.set_weights(vec![
            array![[-10.0, 20.0, 20.0], [30.0, -20.0, -20.0]],
            array![[-30.0, 20.0, 20.0]],
        ])
        .unwrap();
        net
    }

    #[test]
    fn test_network_shapes() {
        let net = NeuralNetwork::new(&[10, 5, 10], 5, 5, ActivationFunction::Sigmoid).unwrap();
        let shapes: Vec<_> = net.weights().iter().map(|w| w.dim()).collect();
        assert_eq!(shapes, vec![(10, 6), (5, 11), (10, 6), (5, 11)]);
        assert_eq!(net.parameter_count(), 60 + 55 + 60 + 55);
    }

    #[test]
    fn test_no_hidden_layers() {
        let net = NeuralNetwork::new(&[], 3, 2, ActivationFunction::Linear).unwrap();
        assert_eq!(net.weights().len(), 1);
        assert_eq!(net.weights()[0].dim(), (2, 4));
    }

    #[test]
    fn test_zero_width_rejected() {
        let result = NeuralNetwork::new(&[2, 0], 2, 1, ActivationFunction::Sigmoid);
        assert!(matches!(result, Err(Error::InvalidTopology(_))));
    }

    #[test]
    fn test_weights_start_at_zero() {
        let net = NeuralNetwork::new(&[3], 2, 1, ActivationFunction::Sigmoid).unwrap();
        assert!(net.weights().iter().all(|w| w.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_initialize_random_weights_changes_every_matrix() {
        let mut net = NeuralNetwork::new(&[3], 2, 1, ActivationFunction::Sigmoid).unwrap();
        let mut rng = seeded_rng(Some(42));
        net.initialize_random_weights(DEFAULT_EPSILON, &mut rng).unwrap();
        for w in net.weights() {
            assert!(w.iter().any(|&v| v != 0.0));
        }
    }

    #[test]
    fn test_initialize_random_weights_negative_epsilon() {
        let mut net = NeuralNetwork::new(&[3], 2, 1, ActivationFunction::Sigmoid).unwrap();
        let mut rng = seeded_rng(Some(1));
        let result = net.initialize_random_weights(-0.5, &mut rng);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        assert!(net.weights().iter().all(|w| w.iter().all(|&v| v == 0.0)));

        for epsilon in [f64::NAN, f64::INFINITY, -1e-9] {
            let result = net.initialize_random_weights(epsilon, &mut rng);
            assert!(matches!(result, Err(Error::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_feed_forward_xor() {
        let net = xor_network();
        let cases = [
            (array![0.0, 0.0], 0.0),
            (array![0.0, 1.0], 1.0),
            (array![1.0, 0.0], 1.0),
            (array![1.0, 1.0], 0.0),
        ];
        for (input, expected) in cases {
            let output = net.feed_forward(&input).unwrap();
            assert!((output[0] - expected).abs() < 0.01);
        }
    }

    #[test]
    fn test_feed_forward_wrong_input() {
        let net = xor_network();
        let result = net.feed_forward(&array![1.0, 0.0, 1.0]);
        assert!(matches!(
            result,
            Err(Error::InputShape {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_backpropagate_wrong_expected() {
        let net = xor_network();
        let result = net.backpropagate(&array![1.0, 0.0], &array![1.0, 0.0]);
        assert!(matches!(result, Err(Error::OutputShape { .. })));
    }

    #[test]
    fn test_set_weights_rejects_bad_shape() {
        let mut net = xor_network();
        let before = net.get_weights();
        let result = net.set_weights(vec![Array2::zeros((2, 3)), Array2::zeros((1, 2))]);
        assert!(matches!(result, Err(Error::WeightShape { index: 1, .. })));
        assert_eq!(net.get_weights(), before);
    }

    #[test]
    fn test_set_weights_rejects_bad_count() {
        let mut net = xor_network();
        let result = net.set_weights(vec![Array2::zeros((2, 3))]);
        assert!(matches!(
            result,
            Err(Error::WeightCount {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_cost_xor_is_small() {
        let net = xor_network();
        let inputs = vec![
            array![0.0, 0.0],
            array![0.0, 1.0],
            array![1.0, 0.0],
            array![1.0, 1.0],
        ];
        let expecteds = vec![array![0.0], array![1.0], array![1.0], array![0.0]];
        let cost = net.cost(&inputs, &expecteds).unwrap();
        assert!(cost >= 0.0 && cost < 0.01);
    }

    #[test]
    fn test_cost_mismatched_pairs() {
        let net = xor_network();
        let result = net.cost(&[array![0.0, 0.0]], &[]);
        assert!(matches!(result, Err(Error::DatasetMismatch { .. })));
        assert!(matches!(net.cost(&[], &[]), Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_cost_of_half_output() {
        // Zero weights give 0.5 everywhere, so the cost is ln 2.
        let net = NeuralNetwork::new(&[2], 2, 1, ActivationFunction::Sigmoid).unwrap();
        let cost = net.cost(&[array![1.0, 0.0]], &[array![1.0]]).unwrap();
        assert!((cost - std::f64::consts::LN_2).abs() < 1e-12);
    }
}
