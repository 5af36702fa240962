use ndarray::{Array2, ArrayView2};

pub trait LossFn {
  fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;
  fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32>;
}

/// Mean squared error loss function.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl LossFn for Mse {
  fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
    (&y_pred - &y)
      .mapv(|x| x.powi(2))
      .mean()
      .unwrap_or_default()
  }

  fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
    (&y_pred - &y) * (2.0 / y_pred.len() as f32)
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  #[test]
  fn test_mse() {
    let y_pred = array![[1f32], [2.], [4.]];
    let y = array![[1f32], [0.], [1.]];
    assert!((Mse.loss(y_pred.view(), y.view()) - 13. / 3.).abs() < 1e-6);

    let d = Mse.loss_prime(y_pred.view(), y.view());
    let expected = [0f32, 4. / 3., 2.];
    for (got, want) in d.iter().zip(expected) {
      assert!((got - want).abs() < 1e-6, "{} != {}", got, want);
    }
  }
}
