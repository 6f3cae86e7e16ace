//! Activation functions for neural networks
//!
//! A network owns exactly one [`ActivationFunction`] and applies it after every
//! layer. The set of kinds is closed; new kinds are added as enum variants.
//! - Sigmoid (logistic, pairs with the cross-entropy cost)
//! - Linear (identity)

use serde::Deserialize;

/// Sigmoid activation function.
///
/// Returns the sigmoid of the input: 1 / (1 + exp(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Element-wise activation shared by every layer of a network.
///
/// Both operations are pure and total over finite inputs. `gradient` takes the
/// pre-activation value `z`, not the activated output, so it can be called
/// without a prior `activation` call on the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    /// Logistic function
    #[default]
    Sigmoid,
    /// Identity function
    Linear,
}

impl ActivationFunction {
    /// Apply the activation function
    pub fn activation(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::Linear => x,
        }
    }

    /// Derivative of the activation with respect to the pre-activation `x`
    pub fn gradient(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            ActivationFunction::Linear => 1.0,
        }
    }
}
