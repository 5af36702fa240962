use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{layers::Dense, loss::LossFn, optimizer::Optimizer};
use crate::{Error, Result};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// The parameters of all layers live in one flat buffer, layer after layer, and so does the
/// gradient.
#[derive(Debug, Clone)]
pub struct Sequential {
  layers: Vec<Dense>,
  params: Vec<f32>,
  grad: Vec<f32>,
}

impl Sequential {
  /// Creates a new `Sequential` with every parameter set to zero.
  pub fn new<I>(layers: I) -> Self
  where
    I: IntoIterator<Item = Dense>,
  {
    let layers: Vec<Dense> = layers.into_iter().collect();
    let size: usize = layers.iter().map(Dense::size).sum();
    Self {
      layers,
      params: vec![0.; size],
      grad: vec![0.; size],
    }
  }

  pub fn init_params<R: Rng>(&mut self, rng: &mut R) {
    let mut offset = 0;
    for layer in &self.layers {
      let size = layer.size();
      layer.init_params(&mut self.params[offset..offset + size], rng);
      offset += size;
    }
  }

  /// The amount of parameters of the whole model.
  pub fn size(&self) -> usize {
    self.params.len()
  }

  pub fn params(&self) -> &[f32] {
    &self.params
  }

  #[cfg(test)]
  pub(crate) fn set_params(&mut self, params: &[f32]) -> Result<()> {
    if params.len() != self.params.len() {
      return Err(Error::ShapeMismatch {
        what: "model params",
        got: params.len(),
        expected: self.params.len(),
      });
    }
    self.params.copy_from_slice(params);
    Ok(())
  }

  /// Makes a forward pass through the network.
  pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
    let mut offset = 0;
    let mut a = x.to_owned();
    for layer in self.layers.iter_mut() {
      let size = layer.size();
      a = layer.forward(&self.params[offset..offset + size], a.view())?;
      offset += size;
    }
    Ok(a)
  }

  /// Forward pass over a column of single valued inputs.
  pub fn predict(&mut self, xs: &[f32]) -> Result<Vec<f32>> {
    let x = column(xs)?;
    let y = self.forward(x.view())?;
    Ok(y.iter().copied().collect())
  }

  /// One optimization step on a batch: forward, backward through every layer, update.
  ///
  /// # Returns
  /// The batch loss, measured before the update.
  pub fn train_batch<L, O>(
    &mut self,
    x: ArrayView2<f32>,
    y: ArrayView2<f32>,
    loss_fn: &L,
    optimizer: &mut O,
  ) -> Result<f32>
  where
    L: LossFn,
    O: Optimizer,
  {
    let y_pred = self.forward(x)?;
    if y_pred.dim() != y.dim() {
      return Err(Error::ShapeMismatch {
        what: "batch labels",
        got: y.len(),
        expected: y_pred.len(),
      });
    }
    let loss = loss_fn.loss(y_pred.view(), y);

    let mut d = loss_fn.loss_prime(y_pred.view(), y);
    let mut end = self.params.len();
    for layer in self.layers.iter_mut().rev() {
      let start = end - layer.size();
      d = layer.backward(&self.params[start..end], &mut self.grad[start..end], d.view())?;
      end = start;
    }

    optimizer.update_params(&self.grad, &mut self.params)?;
    Ok(loss)
  }
}

/// Shapes a slice as an `n × 1` matrix.
pub fn column(xs: &[f32]) -> Result<Array2<f32>> {
  Array2::from_shape_vec((xs.len(), 1), xs.to_vec()).map_err(|_| Error::ShapeMismatch {
    what: "column",
    got: xs.len(),
    expected: xs.len(),
  })
}

#[cfg(test)]
mod tests {
  use rand::{rngs::StdRng, SeedableRng};

  use super::*;
  use crate::model::{loss::Mse, optimizer::Sgd};

  fn two_layers() -> Sequential {
    Sequential::new(vec![Dense::new((1, 1)), Dense::new((1, 1))])
  }

  #[test]
  fn test_composition_of_affine_layers() {
    let mut model = two_layers();
    assert_eq!(model.size(), 4);
    // (2x + 1) * 3 - 1
    model.set_params(&[2., 1., 3., -1.]).unwrap();
    let ys = model.predict(&[0., 1., -2.]).unwrap();
    assert_eq!(ys, vec![2f32, 8., -10.]);
  }

  #[test]
  fn test_init_is_seeded() {
    let mut a = two_layers();
    let mut b = two_layers();
    a.init_params(&mut StdRng::seed_from_u64(7));
    b.init_params(&mut StdRng::seed_from_u64(7));
    assert_eq!(a.params(), b.params());
    assert_eq!(a.params()[1], 0.);
    assert_eq!(a.params()[3], 0.);
  }

  #[test]
  fn test_train_batch_lowers_loss() {
    let mut model = two_layers();
    model.set_params(&[0.5, 0., 0.5, 0.]).unwrap();
    let x = column(&[0., 0.25, 0.5, 0.75, 1.]).unwrap();
    let y = column(&[0., 0.25, 0.5, 0.75, 1.]).unwrap();
    let mut sgd = Sgd::new(0.1);

    let first = model.train_batch(x.view(), y.view(), &Mse, &mut sgd).unwrap();
    let mut last = first;
    for _ in 0..200 {
      last = model.train_batch(x.view(), y.view(), &Mse, &mut sgd).unwrap();
    }
    assert!(last < first / 10., "{} !< {}", last, first);
  }

  #[test]
  fn test_label_shape_mismatch() {
    let mut model = two_layers();
    let x = column(&[0., 1.]).unwrap();
    let y = column(&[0.]).unwrap();
    let mut sgd = Sgd::new(0.1);
    assert!(matches!(
      model.train_batch(x.view(), y.view(), &Mse, &mut sgd),
      Err(Error::ShapeMismatch { .. })
    ));
  }
}
