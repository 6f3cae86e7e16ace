//! Shared utilities for the network and optimizers
//!
//! This module provides activation functions, matrix helpers for the
//! bias-column layer convention, and random source construction.

pub mod activations;
pub mod matrix;
pub mod rng;

pub use activations::ActivationFunction;
