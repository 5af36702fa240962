use super::OptimizerKind;
use crate::{Error, Result};

/// Defines the strategy for updating model parameters based on calculated gradients.
pub trait Optimizer {
  /// Updates `params` in place using `grad`.
  ///
  /// # Returns
  /// An error if there's a mismatch in the sizes of `grad` and `params`.
  fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()>;
}

fn check_sizes(grad: &[f32], params: &[f32]) -> Result<()> {
  if grad.len() != params.len() {
    return Err(Error::ShapeMismatch {
      what: "gradient and parameters",
      got: grad.len(),
      expected: params.len(),
    });
  }
  Ok(())
}

/// Plain gradient descent.
#[derive(Debug, Clone)]
pub struct Sgd {
  learning_rate: f32,
}

impl Sgd {
  pub const DEFAULT_LEARNING_RATE: f32 = 5e-3;

  pub fn new(learning_rate: f32) -> Self {
    Self { learning_rate }
  }
}

impl Optimizer for Sgd {
  fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
    check_sizes(grad, params)?;
    let lr = self.learning_rate;
    params.iter_mut().zip(grad).for_each(|(p, g)| *p -= lr * g);
    Ok(())
  }
}

#[derive(Debug, Clone)]
pub struct Adam {
  learning_rate: f32,
  beta1: f32,
  beta2: f32,
  beta1_t: f32,
  beta2_t: f32,
  v: Box<[f32]>,
  s: Box<[f32]>,
  epsilon: f32,
}

impl Adam {
  pub const DEFAULT_LEARNING_RATE: f32 = 1e-3;

  /// Creates a new `Adam` optimizer.
  ///
  /// # Arguments
  /// * `len` - The amount of parameters this instance should hold.
  /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
  /// * `beta1`, `beta2`, `epsilon` - Hyperparameters to the optimization algorithm.
  pub fn new(len: usize, learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
    Self {
      learning_rate,
      beta1,
      beta2,
      beta1_t: 1.,
      beta2_t: 1.,
      v: vec![0.; len].into_boxed_slice(),
      s: vec![0.; len].into_boxed_slice(),
      epsilon,
    }
  }

  /// `beta1 = 0.9`, `beta2 = 0.999`, `epsilon = 1e-7`. The epsilon is added to the square root
  /// of the bias corrected second moment.
  pub fn with_defaults(len: usize, learning_rate: f32) -> Self {
    Self::new(len, learning_rate, 0.9, 0.999, 1e-7)
  }
}

impl Optimizer for Adam {
  fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
    check_sizes(grad, params)?;
    check_sizes(grad, &self.v)?;

    let Self {
      learning_rate: lr,
      beta1: b1,
      beta2: b2,
      epsilon: eps,
      ..
    } = *self;

    self.beta1_t *= b1;
    self.beta2_t *= b2;

    let bc1 = 1. - self.beta1_t;
    let bc2 = 1. - self.beta2_t;

    params
      .iter_mut()
      .zip(grad)
      .zip(self.v.iter_mut())
      .zip(self.s.iter_mut())
      .for_each(|(((p, g), v), s)| {
        *v = b1 * *v + (1. - b1) * g;
        *s = b2 * *s + (1. - b2) * g.powi(2);
        let v_hat = *v / bc1;
        let s_hat = *s / bc2;
        *p -= lr * v_hat / (s_hat.sqrt() + eps);
      });

    Ok(())
  }
}

/// Either optimizer, picked at runtime from the training parameters.
#[derive(Debug, Clone)]
pub enum AnyOptimizer {
  Adam(Adam),
  Sgd(Sgd),
}

impl AnyOptimizer {
  pub fn new(kind: OptimizerKind, len: usize, learning_rate: Option<f32>) -> Self {
    match kind {
      OptimizerKind::Adam => AnyOptimizer::Adam(Adam::with_defaults(
        len,
        learning_rate.unwrap_or(Adam::DEFAULT_LEARNING_RATE),
      )),
      OptimizerKind::Sgd => {
        AnyOptimizer::Sgd(Sgd::new(learning_rate.unwrap_or(Sgd::DEFAULT_LEARNING_RATE)))
      }
    }
  }
}

impl Optimizer for AnyOptimizer {
  fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
    match self {
      AnyOptimizer::Adam(adam) => adam.update_params(grad, params),
      AnyOptimizer::Sgd(sgd) => sgd.update_params(grad, params),
    }
  }
}
