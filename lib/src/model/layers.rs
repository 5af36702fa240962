use ndarray::{prelude::*, ShapeError};
use rand::Rng;

use crate::{Error, Result};

/// A fully connected layer with bias and no activation, `z = x·W + b`.
///
/// The layer doesn't own its parameters, it reads them from (and writes its gradient to)
/// slices of the model's flat buffers. The first `dim.0 * dim.1` values are the weights in
/// row major order, the last `dim.1` are the biases.
#[derive(Debug, Clone)]
pub struct Dense {
  dim: (usize, usize),
  size: usize,

  // Forward metadata
  x: Array2<f32>,
}

impl Dense {
  /// Creates a layer going from `dim.0` inputs to `dim.1` outputs.
  pub fn new(dim: (usize, usize)) -> Self {
    Self {
      dim,
      size: (dim.0 + 1) * dim.1,
      x: Array2::zeros((0, dim.0)),
    }
  }

  /// The amount of parameters this layer has.
  pub fn size(&self) -> usize {
    self.size
  }

  /// Glorot uniform weights and zero biases.
  pub fn init_params<R: Rng>(&self, params: &mut [f32], rng: &mut R) {
    let (fan_in, fan_out) = self.dim;
    let limit = (6. / (fan_in + fan_out) as f32).sqrt();
    let w_size = self.size - fan_out;
    let (w, b) = params.split_at_mut(w_size);
    w.iter_mut().for_each(|w| *w = rng.gen_range(-limit..=limit));
    b.iter_mut().for_each(|b| *b = 0.);
  }

  /// Computes the layer's output, remembering `x` for the backward pass.
  pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
    let (w, b) = self.view_params(params)?;
    if x.ncols() != self.dim.0 {
      return Err(Error::ShapeMismatch {
        what: "dense layer input",
        got: x.ncols(),
        expected: self.dim.0,
      });
    }

    let z = x.dot(&w) + &b;
    self.x = x.to_owned();
    Ok(z)
  }

  /// Writes this layer's gradient given the delta `d` of its output and returns the delta of
  /// its input.
  pub fn backward(
    &mut self,
    params: &[f32],
    grad: &mut [f32],
    d: ArrayView2<f32>,
  ) -> Result<Array2<f32>> {
    let (w, _) = self.view_params(params)?;
    let (mut dw, mut db) = self.view_grad(grad)?;

    dw.assign(&self.x.t().dot(&d));
    db.assign(&d.sum_axis(Axis(0)));

    Ok(d.dot(&w.t()))
  }

  fn view_params<'a>(&self, params: &'a [f32]) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
    let w_size = self.size - self.dim.1;
    if params.len() != self.size {
      return Err(self.size_mismatch("dense layer params", params.len()));
    }
    let (w_raw, b_raw) = params.split_at(w_size);
    let weights = ArrayView2::from_shape(self.dim, w_raw).map_err(|e| self.shape_err(e))?;
    let biases = ArrayView1::from_shape(self.dim.1, b_raw).map_err(|e| self.shape_err(e))?;
    Ok((weights, biases))
  }

  fn view_grad<'a>(
    &self,
    grad: &'a mut [f32],
  ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
    let w_size = self.size - self.dim.1;
    if grad.len() != self.size {
      return Err(self.size_mismatch("dense layer grad", grad.len()));
    }
    let (dw_raw, db_raw) = grad.split_at_mut(w_size);
    let dw = ArrayViewMut2::from_shape(self.dim, dw_raw).map_err(|e| self.shape_err(e))?;
    let db = ArrayViewMut1::from_shape(self.dim.1, db_raw).map_err(|e| self.shape_err(e))?;
    Ok((dw, db))
  }

  fn size_mismatch(&self, what: &'static str, got: usize) -> Error {
    Error::ShapeMismatch {
      what,
      got,
      expected: self.size,
    }
  }

  fn shape_err(&self, _: ShapeError) -> Error {
    self.size_mismatch("dense layer view", 0)
  }
}
