#![cfg(test)]

use std::num::NonZeroUsize;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    arch::{Model, Sequential, activations::ActFn, loss::Mse},
    dataset::{Dataset, SplitRatios},
    initialization::ParamGen,
    optimization::GradientDescent,
    training::{
        ActFnSpec, LossFnSpec, ModelSpec, ModelTrainer, OptimizerSpec, TrainerBuilder, TrainerSpec,
    },
};

fn line(points: usize) -> Dataset {
    let data = (0..points)
        .flat_map(|i| {
            let x = i as f32 / points as f32;
            [x, 2. * x + 1.]
        })
        .collect();

    Dataset::new(data, 1, 1).unwrap()
}

fn spec(epochs: usize, learning_rate: f32, seed: u64) -> TrainerSpec {
    TrainerSpec {
        model: ModelSpec {
            input_size: 1,
            output_size: 1,
            hidden_size: NonZeroUsize::new(8).unwrap(),
            hidden_layers: 2,
            act_fn: ActFnSpec::Relu,
        },
        optimizer: OptimizerSpec::GradientDescent,
        learning_rate,
        loss: LossFnSpec::Mse,
        init: ParamGen::XavierUniform,
        epochs: NonZeroUsize::new(epochs).unwrap(),
        batch_size: None,
        shuffle: false,
        log_every: 100,
        seed: Some(seed),
    }
}

#[test]
fn test_ml_line_loss_decreases() {
    let split = line(200)
        .split(SplitRatios::default(), &mut StdRng::seed_from_u64(0))
        .unwrap();

    let spec = spec(500, 0.01, 1);
    let (mut trainer, mut params) = TrainerBuilder::new().build(&spec).unwrap();
    let history = trainer
        .run(&mut params, &split.train, &split.validation, spec.epochs)
        .unwrap();

    let train = history.train();
    assert_eq!(train.len(), 500);
    assert_eq!(history.validation().len(), 500);
    assert!(train[499] < train[0], "{} >= {}", train[499], train[0]);
    assert!(history.validation()[499] < history.validation()[0]);
}

#[test]
fn test_ml_same_seed_same_history() {
    let split = line(60)
        .split(SplitRatios::default(), &mut StdRng::seed_from_u64(5))
        .unwrap();

    let mut spec = spec(50, 0.05, 9);
    spec.batch_size = NonZeroUsize::new(8);
    spec.shuffle = true;

    let run = || {
        let (mut trainer, mut params) = TrainerBuilder::new().build(&spec).unwrap();
        let history = trainer
            .run(&mut params, &split.train, &split.validation, spec.epochs)
            .unwrap();
        (history, params)
    };

    let (a, params_a) = run();
    let (b, params_b) = run();

    assert_eq!(a, b);
    assert_eq!(params_a, params_b);
}

#[test]
fn test_ml_zero_learning_rate_keeps_the_curve_flat() {
    let split = line(40)
        .split(SplitRatios::default(), &mut StdRng::seed_from_u64(2))
        .unwrap();

    let spec = spec(20, 0.0, 3);
    let (mut trainer, mut params) = TrainerBuilder::new().build(&spec).unwrap();
    let initial = params.clone();
    let history = trainer
        .run(&mut params, &split.train, &split.validation, spec.epochs)
        .unwrap();

    assert_eq!(params, initial);
    assert!(history.train().iter().all(|&l| l == history.train()[0]));
}

#[test]
fn test_ml_and2_gate_convergence() {
    #[rustfmt::skip]
    let and2 = vec![
        0.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
        1.0, 0.0, 0.0,
        1.0, 1.0, 1.0,
    ];

    let dataset = Dataset::new(and2, 2, 1).unwrap();
    let model = Sequential::mlp(2, 3, 1, 1, Some(ActFn::sigmoid(1.))).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let mut params = ParamGen::Uniform {
        low: -1.0,
        high: 1.0,
    }
    .generate(model.layers(), &mut rng)
    .unwrap();

    let mut trainer = ModelTrainer::new(
        model.clone(),
        GradientDescent::new(0.5),
        Mse,
        None,
        false,
        0,
        rng,
    );

    let epochs = NonZeroUsize::new(3000).unwrap();
    let history = trainer
        .run(&mut params, &dataset, &dataset, epochs)
        .unwrap();

    let first = history.train()[0];
    let (last, _) = history.last().unwrap();
    assert!(last < first, "{last} >= {first}");

    let y_pred = model.forward(&params, dataset.x()).unwrap();
    let err = model.evaluate(&params, &Mse, dataset.x(), dataset.y()).unwrap();
    assert_eq!(y_pred.dim(), (4, 1));
    assert!(err < 0.1, "err: {err}");
}
