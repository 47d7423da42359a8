use std::num::NonZeroUsize;

use machine_learning::{
    MlErr,
    dataset::{Dataset, SplitRatios, StandardScaler},
    initialization::ParamGen,
    training::{ActFnSpec, LossFnSpec, ModelSpec, OptimizerSpec, TrainerBuilder, TrainerSpec},
};
use rand::{SeedableRng, rngs::StdRng};

fn quadratic(points: usize) -> Dataset {
    let data = (0..points)
        .flat_map(|i| {
            let x = -1. + 2. * i as f32 / points as f32;
            [x, x * x]
        })
        .collect();

    Dataset::new(data, 1, 1).unwrap()
}

fn spec(optimizer: OptimizerSpec, learning_rate: f32) -> TrainerSpec {
    TrainerSpec {
        model: ModelSpec {
            input_size: 1,
            output_size: 1,
            hidden_size: NonZeroUsize::new(16).unwrap(),
            hidden_layers: 1,
            act_fn: ActFnSpec::Tanh,
        },
        optimizer,
        learning_rate,
        loss: LossFnSpec::Mse,
        init: ParamGen::XavierUniform,
        epochs: NonZeroUsize::new(300).unwrap(),
        batch_size: NonZeroUsize::new(16),
        shuffle: true,
        log_every: 0,
        seed: Some(7),
    }
}

#[test]
fn scaled_training_pipeline_fits_a_parabola() {
    let mut rng = StdRng::seed_from_u64(3);
    let split = quadratic(120)
        .split(SplitRatios::default(), &mut rng)
        .unwrap();

    let x_scaler = StandardScaler::fit(split.train.x()).unwrap();
    let y_scaler = StandardScaler::fit(split.train.y()).unwrap();

    let scale = |ds: &Dataset| {
        let x = x_scaler.transform(ds.x()).unwrap();
        let y = y_scaler.transform(ds.y()).unwrap();
        Dataset::from_parts(x.view(), y.view()).unwrap()
    };

    let train = scale(&split.train);
    let validation = scale(&split.validation);
    let test = scale(&split.test);

    let spec = spec(OptimizerSpec::GradientDescent, 0.05);
    let (mut trainer, mut params) = TrainerBuilder::new().build(&spec).unwrap();
    let history = trainer
        .run(&mut params, &train, &validation, spec.epochs)
        .unwrap();

    assert_eq!(history.len(), 300);
    assert!(history.train().iter().all(|l| l.is_finite() && *l >= 0.));
    assert!(history.validation().iter().all(|l| l.is_finite() && *l >= 0.));

    let (last_train, _) = history.last().unwrap();
    assert!(last_train < history.train()[0]);

    let y_pred = trainer.predict(&params, test.x()).unwrap();
    let y_pred = y_scaler.inverse_transform(y_pred.view()).unwrap();
    assert_eq!(y_pred.dim(), split.test.y().dim());
    assert!(y_pred.iter().all(|y| y.is_finite()));
}

#[test]
fn every_optimizer_reduces_the_training_loss() {
    let mut rng = StdRng::seed_from_u64(1);
    let split = quadratic(80)
        .split(SplitRatios::default(), &mut rng)
        .unwrap();

    let optimizers = [
        (OptimizerSpec::GradientDescent, 0.05),
        (
            OptimizerSpec::GradientDescentWithMomentum { momentum: 0.9 },
            0.01,
        ),
        (
            OptimizerSpec::Adam {
                beta1: 0.9,
                beta2: 0.999,
                epsilon: 1e-8,
            },
            0.005,
        ),
    ];

    for (optimizer, lr) in optimizers {
        let spec = spec(optimizer, lr);
        let (mut trainer, mut params) = TrainerBuilder::new().build(&spec).unwrap();
        let history = trainer
            .run(&mut params, &split.train, &split.validation, spec.epochs)
            .unwrap();

        let (last, _) = history.last().unwrap();
        assert!(last < history.train()[0], "{optimizer:?}: {last}");
    }
}

#[test]
fn mismatched_partitions_are_rejected() {
    let spec = spec(OptimizerSpec::GradientDescent, 0.05);
    let (mut trainer, mut params) = TrainerBuilder::new().build(&spec).unwrap();

    let wide = Dataset::new(vec![0.0, 1.0, 2.0], 2, 1).unwrap();
    let err = trainer
        .run(&mut params, &wide, &quadratic(4), spec.epochs)
        .unwrap_err();

    assert_eq!(err, MlErr::size_mismatch("dataset features", 2, 1));
}
