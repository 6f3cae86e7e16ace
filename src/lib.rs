//! Feedforward network weight training
//!
//! This library trains the weights of a fully-connected feedforward network with
//! one of two interchangeable optimizers: stochastic gradient descent over a
//! hand-derived backpropagation routine, or self-adaptive fast evolutionary
//! programming.
//!
//! # Modules
//!
//! - `network`: weight matrices with folded bias, forward pass, backpropagation, cost
//! - `optimizers`: Optimizer trait, SGD and evolutionary programming
//! - `utils`: activation functions, matrix helpers, random sources
//! - `config`: JSON training configuration
//! - `error`: crate error type

pub mod config;
pub mod error;
pub mod network;
pub mod optimizers;
pub mod utils;

pub use error::{Error, Result};
pub use network::NeuralNetwork;
pub use optimizers::{EvolutionaryProgramming, Optimizer, StochasticGradientDescent};
pub use utils::ActivationFunction;
