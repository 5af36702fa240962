use ndarray::Array2;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info};

use super::{
  layers::Dense,
  loss::{LossFn, Mse},
  optimizer::{AnyOptimizer, Optimizer},
  sequential::Sequential,
  EpochLogs, History, TrainParams,
};
use crate::{Error, Result};

/// Receives the metrics of every finished epoch, in order.
pub trait TrainingObserver {
  fn on_epoch_end(&mut self, logs: &EpochLogs);
}

impl<F> TrainingObserver for F
where
  F: FnMut(&EpochLogs),
{
  fn on_epoch_end(&mut self, logs: &EpochLogs) {
    self(logs)
  }
}

/// Writes every epoch to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl TrainingObserver for LoggingObserver {
  fn on_epoch_end(&mut self, logs: &EpochLogs) {
    info!(
      "Epoch {:>3} loss: {:.6} mse: {:.6}",
      logs.epoch, logs.loss, logs.mse
    );
  }
}

/// Two stacked single unit dense layers with bias, initialized from `seed`.
pub fn create_model(seed: u64) -> Sequential {
  let mut model = Sequential::new(vec![Dense::new((1, 1)), Dense::new((1, 1))]);
  model.init_params(&mut StdRng::seed_from_u64(seed));
  model
}

/// Trains `model` for `params.epochs` epochs of shuffled mini-batches, calling `observer` at
/// the end of each one.
#[tracing::instrument(level = "debug", skip_all, fields(samples = inputs.len()))]
pub fn train_model<T: TrainingObserver>(
  model: &mut Sequential,
  inputs: &[f32],
  labels: &[f32],
  params: &TrainParams,
  observer: &mut T,
) -> Result<History> {
  let mut optimizer = AnyOptimizer::new(params.optimizer, model.size(), params.learning_rate);
  fit(model, inputs, labels, params, &mut optimizer, observer)
}

fn fit<O: Optimizer, T: TrainingObserver>(
  model: &mut Sequential,
  inputs: &[f32],
  labels: &[f32],
  params: &TrainParams,
  optimizer: &mut O,
  observer: &mut T,
) -> Result<History> {
  if inputs.len() != labels.len() {
    return Err(Error::ShapeMismatch {
      what: "inputs and labels",
      got: labels.len(),
      expected: inputs.len(),
    });
  }
  if inputs.is_empty() {
    return Err(Error::EmptyDataset("training set"));
  }
  if params.batch_size == 0 {
    return Err(Error::InvalidParams("the batch size must be positive".to_string()));
  }

  let mut rng = StdRng::seed_from_u64(params.seed);
  let loss_fn = Mse;
  let mut order: Vec<usize> = (0..inputs.len()).collect();
  let mut history = Vec::with_capacity(params.epochs);
  let start = std::time::Instant::now();

  for epoch in 0..params.epochs {
    if params.shuffle {
      order.shuffle(&mut rng);
    }

    let mut weighted_loss = 0.;
    for batch in order.chunks(params.batch_size) {
      let x = gather(inputs, batch)?;
      let y = gather(labels, batch)?;
      let loss = model.train_batch(x.view(), y.view(), &loss_fn, optimizer)?;
      weighted_loss += loss * batch.len() as f32;
    }

    let loss = weighted_loss / inputs.len() as f32;
    if !loss.is_finite() {
      return Err(Error::Diverged { epoch });
    }
    // The loss is the mse, so both are reported the same.
    let logs = EpochLogs {
      epoch,
      loss,
      mse: loss,
    };
    observer.on_epoch_end(&logs);
    history.push(logs);
  }

  info!(
    "Trained {} epochs in {:.2}s",
    params.epochs,
    start.elapsed().as_secs_f32()
  );
  debug!("Final params: {:?}", model.params());
  Ok(history)
}

/// Evaluates the loss of `model` over a whole dataset without updating it.
pub fn evaluate(model: &mut Sequential, inputs: &[f32], labels: &[f32]) -> Result<f32> {
  if inputs.len() != labels.len() {
    return Err(Error::ShapeMismatch {
      what: "inputs and labels",
      got: labels.len(),
      expected: inputs.len(),
    });
  }
  let x = super::sequential::column(inputs)?;
  let y = super::sequential::column(labels)?;
  let y_pred = model.forward(x.view())?;
  Ok(Mse.loss(y_pred.view(), y.view()))
}

fn gather(values: &[f32], indices: &[usize]) -> Result<Array2<f32>> {
  let picked: Vec<f32> = indices.iter().map(|&i| values[i]).collect();
  super::sequential::column(&picked)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::OptimizerKind;

  /// Keeps every gradient it gets and never moves the params, so each gradient only depends on
  /// which samples were in its batch.
  #[derive(Default)]
  struct Recorder {
    grads: Vec<Vec<f32>>,
  }

  impl Optimizer for Recorder {
    fn update_params(&mut self, grad: &[f32], _: &mut [f32]) -> Result<()> {
      self.grads.push(grad.to_vec());
      Ok(())
    }
  }

  fn sorted(mut grads: Vec<Vec<f32>>) -> Vec<Vec<f32>> {
    grads.sort_by(|a, b| a.partial_cmp(b).unwrap());
    grads
  }

  fn line(n: usize) -> (Vec<f32>, Vec<f32>) {
    let xs: Vec<f32> = (0..n).map(|i| i as f32 / (n - 1) as f32).collect();
    let ys = xs.iter().map(|x| 1. - 0.8 * x).collect();
    (xs, ys)
  }

  #[test]
  fn test_mismatched_lengths_fail_before_training() {
    let mut model = create_model(1);
    let before = model.params().to_vec();
    let mut calls = 0;
    let result = train_model(
      &mut model,
      &[0., 0.5, 1.],
      &[1., 0.],
      &TrainParams::default(),
      &mut |_: &EpochLogs| calls += 1,
    );
    assert!(matches!(
      result,
      Err(Error::ShapeMismatch { got: 2, expected: 3, .. })
    ));
    assert_eq!(calls, 0);
    assert_eq!(model.params(), &before[..]);
  }

  #[test]
  fn test_rejects_empty_and_zero_batch() {
    let mut model = create_model(1);
    let params = TrainParams::default();
    assert!(matches!(
      train_model(&mut model, &[], &[], &params, &mut LoggingObserver),
      Err(Error::EmptyDataset(_))
    ));

    let params = TrainParams {
      batch_size: 0,
      ..TrainParams::default()
    };
    assert!(matches!(
      train_model(&mut model, &[1.], &[1.], &params, &mut LoggingObserver),
      Err(Error::InvalidParams(_))
    ));
  }

  #[test]
  fn test_observer_sees_every_epoch() {
    let (xs, ys) = line(50);
    let mut model = create_model(3);
    let params = TrainParams {
      epochs: 7,
      ..TrainParams::default()
    };
    let mut seen = Vec::new();
    let history = train_model(&mut model, &xs, &ys, &params, &mut |logs: &EpochLogs| {
      seen.push(*logs)
    })
    .unwrap();

    assert_eq!(history.len(), 7);
    assert_eq!(seen, history);
    assert!(history.iter().enumerate().all(|(i, logs)| logs.epoch == i));
    assert!(history.iter().all(|logs| logs.loss == logs.mse));
  }

  #[test]
  fn test_adam_fits_a_line() {
    let _scope = crate::utils::init_logging_tests();
    let (xs, ys) = line(100);
    let mut model = create_model(42);
    let initial = evaluate(&mut model, &xs, &ys).unwrap();
    let params = TrainParams {
      learning_rate: Some(0.05),
      epochs: 100,
      ..TrainParams::default()
    };

    let history = train_model(&mut model, &xs, &ys, &params, &mut LoggingObserver).unwrap();
    let last = history.last().unwrap().loss;
    assert!(last < initial, "{} !< {}", last, initial);
    assert!(evaluate(&mut model, &xs, &ys).unwrap() < 1e-2);

    let ys_pred = model.predict(&[0., 1.]).unwrap();
    assert!((ys_pred[0] - 1.).abs() < 0.1, "{:?}", ys_pred);
    assert!((ys_pred[1] - 0.2).abs() < 0.1, "{:?}", ys_pred);
  }

  #[test]
  fn test_same_seed_same_history() {
    let (xs, ys) = line(40);
    let params = TrainParams {
      optimizer: OptimizerKind::Sgd,
      epochs: 5,
      ..TrainParams::default()
    };
    let mut a = create_model(9);
    let mut b = create_model(9);
    let ha = train_model(&mut a, &xs, &ys, &params, &mut LoggingObserver).unwrap();
    let hb = train_model(&mut b, &xs, &ys, &params, &mut LoggingObserver).unwrap();
    assert_eq!(ha, hb);
    assert_eq!(a.params(), b.params());
  }

  #[test]
  fn test_one_step_per_batch() {
    let (xs, ys) = line(33);
    let mut model = create_model(5);
    let params = TrainParams {
      epochs: 3,
      ..TrainParams::default()
    };
    let mut recorder = Recorder::default();
    fit(&mut model, &xs, &ys, &params, &mut recorder, &mut LoggingObserver).unwrap();
    // 33 samples in batches of 32 make two steps per epoch.
    assert_eq!(recorder.grads.len(), 6);

    let params = TrainParams {
      batch_size: 10,
      ..params
    };
    let mut recorder = Recorder::default();
    fit(&mut model, &xs, &ys, &params, &mut recorder, &mut LoggingObserver).unwrap();
    assert_eq!(recorder.grads.len(), 12);
  }

  #[test]
  fn test_reshuffles_every_epoch() {
    let (xs, ys) = line(33);
    let mut model = create_model(5);
    let params = TrainParams {
      batch_size: 1,
      epochs: 2,
      shuffle: false,
      ..TrainParams::default()
    };
    let mut in_order = Recorder::default();
    fit(&mut model, &xs, &ys, &params, &mut in_order, &mut LoggingObserver).unwrap();
    let (first, second) = in_order.grads.split_at(33);
    assert_eq!(first, second);

    let params = TrainParams {
      shuffle: true,
      ..params
    };
    let mut shuffled = Recorder::default();
    fit(&mut model, &xs, &ys, &params, &mut shuffled, &mut LoggingObserver).unwrap();
    let (epoch0, epoch1) = shuffled.grads.split_at(33);
    assert_ne!(epoch0, first);
    assert_ne!(epoch0, epoch1);
    // Every epoch still visits each sample exactly once.
    assert_eq!(sorted(epoch0.to_vec()), sorted(first.to_vec()));
    assert_eq!(sorted(epoch1.to_vec()), sorted(first.to_vec()));
  }

  #[test]
  fn test_shuffle_changes_history() {
    let (xs, ys) = line(33);
    let params = TrainParams {
      optimizer: OptimizerKind::Sgd,
      learning_rate: Some(0.05),
      batch_size: 4,
      epochs: 3,
      ..TrainParams::default()
    };
    let shuffled = train_model(&mut create_model(9), &xs, &ys, &params, &mut LoggingObserver).unwrap();
    let params = TrainParams {
      shuffle: false,
      ..params
    };
    let ordered = train_model(&mut create_model(9), &xs, &ys, &params, &mut LoggingObserver).unwrap();
    assert_ne!(shuffled, ordered);
  }

  #[test]
  fn test_epoch_loss_weights_batches_by_size() {
    let (xs, ys) = line(33);
    let mut model = create_model(5);
    let params = TrainParams {
      epochs: 1,
      shuffle: false,
      ..TrainParams::default()
    };
    let history = fit(
      &mut model,
      &xs,
      &ys,
      &params,
      &mut Recorder::default(),
      &mut LoggingObserver,
    )
    .unwrap();

    // The params never move, so each batch loss can be measured afterwards.
    let full = evaluate(&mut model, &xs[..32], &ys[..32]).unwrap();
    let short = evaluate(&mut model, &xs[32..], &ys[32..]).unwrap();
    let expected = (32. * full + short) / 33.;
    let loss = history[0].loss;
    assert!((loss - expected).abs() <= 1e-5 * expected.max(1.), "{} != {}", loss, expected);
  }
}
