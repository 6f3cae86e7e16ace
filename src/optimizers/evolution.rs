//! Fast Evolutionary Programming for learning network weights
//!
//! A global optimizer that works well on multi-modal cost surfaces. Every
//! generation each individual produces one offspring by self-adaptive Cauchy
//! mutation, the doubled population is scored with the network's cost, and a
//! tournament trims it back to `population_size`:
//!
//! ```text
//! generate_population
//!   -> { spawn_offspring -> evaluate_fitness -> tournament_selection }*
//!   -> install best weights
//! ```
//!
//! Training ends only when the fitness-evaluation budget is spent.

use crate::error::{Error, Result};
use crate::network::{check_pairs, NeuralNetwork};
use crate::optimizers::{Optimizer, StopReason, TrainingReport};
use crate::utils::matrix::{element_count, shapes};
use crate::utils::rng::seeded_rng;
use ndarray::{Array1, Array2};
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use rand_distr::{Cauchy, Distribution, StandardNormal};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Hyperparameters for [`EvolutionaryProgramming`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Lower bound for every weight
    pub min_value: f64,
    /// Upper bound for every weight
    pub max_value: f64,
    /// Survivors kept after each tournament
    pub population_size: usize,
    /// Distinct opponents faced by each individual per tournament
    pub opponent_number: usize,
    /// Mutation strength given to every weight of a new individual
    pub initial_step_size: f64,
    /// Cauchy re-draws allowed before an out-of-bounds mutation is clamped
    pub max_mutation_attempts: usize,
    /// Evaluation budget used by `fit`
    pub max_fitness_evaluations: usize,
    /// Seed for all random draws; `None` seeds from the clock
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            min_value: -20.0,
            max_value: 20.0,
            population_size: 100,
            opponent_number: 10,
            initial_step_size: 3.0,
            max_mutation_attempts: 10_000,
            max_fitness_evaluations: 100_000,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.min_value.is_finite() && self.max_value.is_finite())
            || self.min_value >= self.max_value
        {
            return Err(Error::InvalidParameter(format!(
                "weight bounds [{}, {}] must be finite with min < max",
                self.min_value, self.max_value
            )));
        }
        if self.population_size == 0 {
            return Err(Error::InvalidParameter(
                "population_size must be greater than 0".to_string(),
            ));
        }
        if self.opponent_number == 0 {
            return Err(Error::InvalidParameter(
                "opponent_number must be greater than 0".to_string(),
            ));
        }
        if !(self.initial_step_size.is_finite() && self.initial_step_size > 0.0) {
            return Err(Error::InvalidParameter(
                "initial_step_size must be positive".to_string(),
            ));
        }
        if self.max_mutation_attempts == 0 {
            return Err(Error::InvalidParameter(
                "max_mutation_attempts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// One candidate solution: a full weight set plus one mutation strength per
/// weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// Candidate weight set, shaped like the network's
    pub weights: Vec<Array2<f64>>,
    /// Mutation strength for each weight, same shapes as `weights`
    pub step_sizes: Vec<Array2<f64>>,
    /// Cost of `weights`; `None` until evaluated (lower is better)
    pub fitness: Option<f64>,
    /// Tournament wins in the last selection round
    pub wins: usize,
}

impl Individual {
    fn random(
        layer_shapes: &[(usize, usize)],
        uniform: &Uniform<f64>,
        step_size: f64,
        rng: &mut StdRng,
    ) -> Self {
        let mut weights = Vec::with_capacity(layer_shapes.len());
        for &dim in layer_shapes {
            let mut w = Array2::zeros(dim);
            for value in w.iter_mut() {
                *value = uniform.sample(rng);
            }
            weights.push(w);
        }

        Self {
            weights,
            step_sizes: layer_shapes
                .iter()
                .map(|&dim| Array2::from_elem(dim, step_size))
                .collect(),
            fitness: None,
            wins: 0,
        }
    }

    // Unevaluated individuals rank last.
    fn fitness_or_worst(&self) -> f64 {
        self.fitness.unwrap_or(f64::INFINITY)
    }
}

/// Self-adaptive evolutionary programming over a borrowed network.
///
/// The population holds `population_size` individuals between generations and
/// `2 * population_size` between [`spawn_offspring`](Self::spawn_offspring) and
/// [`tournament_selection`](Self::tournament_selection).
pub struct EvolutionaryProgramming<'a> {
    network: &'a mut NeuralNetwork,
    config: EvolutionConfig,
    population: Vec<Individual>,
    fitness_evaluations: usize,
    generation: usize,
    dim: usize,
    cauchy: Cauchy<f64>,
    rng: StdRng,
}

impl<'a> EvolutionaryProgramming<'a> {
    /// Creates a new optimizer bound to `network`.
    ///
    /// The search dimension is the network's total weight count, fixed here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an invalid configuration.
    pub fn new(network: &'a mut NeuralNetwork, config: EvolutionConfig) -> Result<Self> {
        config.validate()?;
        let dim = element_count(network.weights());
        let cauchy = Cauchy::new(0.0, 1.0)
            .map_err(|e| Error::InvalidParameter(format!("cauchy distribution: {}", e)))?;
        let rng = seeded_rng(config.seed);

        Ok(Self {
            network,
            config,
            population: Vec::new(),
            fitness_evaluations: 0,
            generation: 0,
            dim,
            cauchy,
            rng,
        })
    }

    /// Hyperparameters this optimizer was built with.
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Number of scalar weights being optimized.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Fitness evaluations made since the current `train` call started.
    pub fn fitness_evaluations(&self) -> usize {
        self.fitness_evaluations
    }

    /// Completed generations in the current `train` call.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Current individuals, ordered by tournament wins after a selection round.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Replace the population with `population_size` random individuals.
    ///
    /// Weights are uniform in `[min_value, max_value]` and every step size is
    /// `initial_step_size`.
    pub fn generate_population(&mut self) {
        let layer_shapes = shapes(self.network.weights());
        let uniform = Uniform::new_inclusive(self.config.min_value, self.config.max_value);
        let step_size = self.config.initial_step_size;
        let rng = &mut self.rng;

        self.population = (0..self.config.population_size)
            .map(|_| Individual::random(&layer_shapes, &uniform, step_size, rng))
            .collect();
    }

    /// Append one mutated clone of every current individual.
    ///
    /// Each weight moves by `step * Cauchy(0, 1)`, re-drawn until it lands in
    /// bounds. Each step size is then scaled by
    /// `exp(τ' * N_shared + τ * N_element)` with `τ' = 1 / sqrt(2 * dim)` and
    /// `τ = 1 / sqrt(2 * sqrt(dim))`, where `N_shared` is drawn once per call.
    pub fn spawn_offspring(&mut self) {
        let dim = self.dim as f64;
        let global_rate = 1.0 / (2.0 * dim).sqrt();
        let local_rate = 1.0 / (2.0 * dim.sqrt()).sqrt();
        let step_random: f64 = self.rng.sample(StandardNormal);

        let parents = self.population.len();
        for i in 0..parents {
            let mut child = self.population[i].clone();
            child.fitness = None;
            child.wins = 0;

            for (w, s) in child.weights.iter_mut().zip(child.step_sizes.iter_mut()) {
                for (value, step) in w.iter_mut().zip(s.iter_mut()) {
                    *value = self.mutate_value(*value, *step);
                    let local: f64 = self.rng.sample(StandardNormal);
                    *step *= (global_rate * step_random + local_rate * local).exp();
                }
            }

            self.population.push(child);
        }
    }

    /// Score every individual with the network cost.
    ///
    /// Installs each weight set into the network in turn and counts one
    /// evaluation per individual. Returns the generation's minimum fitness.
    pub fn evaluate_fitness(
        &mut self,
        inputs: &[Array1<f64>],
        expecteds: &[Array1<f64>],
    ) -> Result<f64> {
        let mut min_fitness = f64::INFINITY;

        for individual in &mut self.population {
            self.network.set_weights(individual.weights.clone())?;
            let fitness = self.network.cost(inputs, expecteds)?;
            individual.fitness = Some(fitness);
            if fitness < min_fitness {
                min_fitness = fitness;
            }
            self.fitness_evaluations += 1;
        }

        Ok(min_fitness)
    }

    /// Rank by tournament wins and keep the best `population_size`.
    ///
    /// Every individual meets `opponent_number` distinct opponents (never
    /// itself) and scores a win when its fitness is no worse than theirs.
    pub fn tournament_selection(&mut self) {
        let len = self.population.len();
        if len == 0 {
            return;
        }
        let opponents = self.config.opponent_number.min(len - 1);
        let fitness: Vec<f64> = self
            .population
            .iter()
            .map(Individual::fitness_or_worst)
            .collect();

        for i in 0..len {
            let mut wins = 0;
            for j in index::sample(&mut self.rng, len - 1, opponents).iter() {
                let opponent = if j >= i { j + 1 } else { j };
                if fitness[i] <= fitness[opponent] {
                    wins += 1;
                }
            }
            self.population[i].wins = wins;
        }

        self.population.sort_by(|a, b| b.wins.cmp(&a.wins));
        self.population.truncate(self.config.population_size);
    }

    /// Evolve until `max_fitness_evaluations` is reached, then install the
    /// fittest survivor into the network.
    ///
    /// The evaluation counter restarts at zero on every call. The last
    /// generation may overshoot the budget by up to `2 * population_size - 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for a zero budget, plus any dataset
    /// or shape error from the network.
    pub fn train(
        &mut self,
        inputs: &[Array1<f64>],
        expecteds: &[Array1<f64>],
        max_fitness_evaluations: usize,
    ) -> Result<TrainingReport> {
        check_pairs(inputs, expecteds)?;
        if max_fitness_evaluations == 0 {
            return Err(Error::InvalidParameter(
                "max_fitness_evaluations must be greater than 0".to_string(),
            ));
        }

        self.fitness_evaluations = 0;
        self.generation = 0;
        self.generate_population();

        while self.fitness_evaluations < max_fitness_evaluations {
            self.spawn_offspring();
            let min_fitness = self.evaluate_fitness(inputs, expecteds)?;
            self.tournament_selection();
            self.generation += 1;
            debug!(
                generation = self.generation,
                evaluations = self.fitness_evaluations,
                min_fitness,
                "evolution generation"
            );
        }

        self.population
            .sort_by(|a, b| a.fitness_or_worst().total_cmp(&b.fitness_or_worst()));
        let best = self
            .population
            .first()
            .ok_or_else(|| Error::InvalidParameter("population is empty".to_string()))?;
        self.network.set_weights(best.weights.clone())?;
        let final_cost = match best.fitness {
            Some(fitness) => fitness,
            None => self.network.cost(inputs, expecteds)?,
        };

        info!(
            generations = self.generation,
            evaluations = self.fitness_evaluations,
            cost = final_cost,
            "evolution training finished"
        );

        Ok(TrainingReport {
            steps: self.fitness_evaluations,
            final_cost,
            stop_reason: StopReason::EvaluationBudget,
        })
    }

    // Cauchy re-draws until in bounds; clamps once the retry cap is hit.
    fn mutate_value(&mut self, value: f64, step: f64) -> f64 {
        let (min, max) = (self.config.min_value, self.config.max_value);

        for _ in 0..self.config.max_mutation_attempts {
            let candidate = value + step * self.cauchy.sample(&mut self.rng);
            if (min..=max).contains(&candidate) {
                return candidate;
            }
        }

        warn!(
            value,
            step,
            attempts = self.config.max_mutation_attempts,
            "mutation retry cap reached, clamping into bounds"
        );
        let candidate = value + step * self.cauchy.sample(&mut self.rng);
        if candidate.is_nan() {
            value
        } else {
            candidate.clamp(min, max)
        }
    }
}

impl Optimizer for EvolutionaryProgramming<'_> {
    fn fit(
        &mut self,
        inputs: &[Array1<f64>],
        expecteds: &[Array1<f64>],
    ) -> Result<TrainingReport> {
        let budget = self.config.max_fitness_evaluations;
        self.train(inputs, expecteds, budget)
    }

    fn network(&self) -> &NeuralNetwork {
        &*self.network
    }

    fn name(&self) -> &'static str {
        "evolutionary"
    }
}
