use feedforward_optimizers::config::{load_config, OptimizerConfig, TrainingConfig};
use feedforward_optimizers::optimizers::{
    EvolutionaryProgramming, Optimizer, SgdConfig, StochasticGradientDescent,
};
use feedforward_optimizers::utils::rng::seeded_rng;
use feedforward_optimizers::{NeuralNetwork, Result};
use ndarray::{array, Array1};
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// XOR learned by a 2-2-1 sigmoid network (educational example).
const NUM_INPUTS: usize = 2;
const NUM_OUTPUTS: usize = 1;
// Defaults used when no config file is given.
const LEARNING_RATE: f64 = 0.1;
const BATCH_SIZE: usize = 2;

// XOR dataset (binary inputs and expected outputs).
fn xor_dataset() -> (Vec<Array1<f64>>, Vec<Array1<f64>>) {
    let inputs = vec![
        array![0.0, 0.0],
        array![0.0, 1.0],
        array![1.0, 0.0],
        array![1.0, 1.0],
    ];
    let expecteds = vec![array![0.0], array![1.0], array![1.0], array![0.0]];
    (inputs, expecteds)
}

// Config from the first argument, or SGD defaults for XOR.
fn config_from_args(args: &[String]) -> Result<TrainingConfig> {
    match args.get(1) {
        Some(path) => load_config(path),
        None => Ok(TrainingConfig {
            optimizer: OptimizerConfig::Sgd(SgdConfig {
                learning_rate: LEARNING_RATE,
                batch_size: BATCH_SIZE,
                ..SgdConfig::default()
            }),
            ..TrainingConfig::default()
        }),
    }
}

// Randomized network sized for XOR.
fn build_network(config: &TrainingConfig) -> Result<NeuralNetwork> {
    let mut network = NeuralNetwork::new(
        &config.network.hidden_layers,
        NUM_INPUTS,
        NUM_OUTPUTS,
        config.network.activation,
    )?;
    let mut rng = seeded_rng(None);
    network.initialize_random_weights(config.network.init_epsilon, &mut rng)?;
    Ok(network)
}

fn build_optimizer<'a>(
    network: &'a mut NeuralNetwork,
    config: &TrainingConfig,
) -> Result<Box<dyn Optimizer + 'a>> {
    let optimizer: Box<dyn Optimizer + 'a> = match &config.optimizer {
        OptimizerConfig::Sgd(sgd) => {
            let sgd = StochasticGradientDescent::new(network, sgd.clone())?;
            info!(
                learning_rate = sgd.learning_rate(),
                batch_size = sgd.config().batch_size,
                "sgd configured"
            );
            Box::new(sgd)
        }
        OptimizerConfig::Evolutionary(evolution) => {
            let ep = EvolutionaryProgramming::new(network, evolution.clone())?;
            info!(
                population = ep.config().population_size,
                dim = ep.dim(),
                "evolution configured"
            );
            Box::new(ep)
        }
    };
    Ok(optimizer)
}

// Train, then print the truth table.
fn run(config: &TrainingConfig) -> Result<Vec<f64>> {
    let (inputs, expecteds) = xor_dataset();
    let mut network = build_network(config)?;
    let initial_cost = network.cost(&inputs, &expecteds)?;
    info!(cost = initial_cost, "before training");

    let mut optimizer = build_optimizer(&mut network, config)?;
    let report = optimizer.fit(&inputs, &expecteds)?;
    info!(
        optimizer = optimizer.name(),
        steps = report.steps,
        cost = report.final_cost,
        stop_reason = ?report.stop_reason,
        "after training"
    );

    let mut predictions = Vec::with_capacity(inputs.len());
    for (input, expected) in inputs.iter().zip(&expecteds) {
        let output = optimizer.network().feed_forward(input)?;
        println!(
            "Input: {:.1}, {:.1}, Expected Output: {:.1}, Predicted Output: {:.3}",
            input[0], input[1], expected[0], output[0]
        );
        predictions.push(output[0]);
    }
    Ok(predictions)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let result = config_from_args(&args).and_then(|config| run(&config));
    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
