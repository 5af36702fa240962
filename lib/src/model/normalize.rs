use serde::{Deserialize, Serialize};

use super::Car;
use crate::{Error, Result};

/// Min and max of a column, kept to map values into `[0, 1]` and back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
  pub min: f32,
  pub max: f32,
}

impl MinMax {
  /// Fails on an empty column and on a column where every value is the same.
  pub fn fit(column: &'static str, values: &[f32]) -> Result<Self> {
    if values.is_empty() {
      return Err(Error::EmptyDataset(column));
    }
    let (min, max) = values
      .iter()
      .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
        (min.min(v), max.max(v))
      });
    if max <= min {
      return Err(Error::DegenerateDataset { column, value: min });
    }
    Ok(Self { min, max })
  }

  pub fn range(&self) -> f32 {
    self.max - self.min
  }

  pub fn normalize(&self, x: f32) -> f32 {
    (x - self.min) / self.range()
  }

  pub fn denormalize(&self, x: f32) -> f32 {
    x * self.range() + self.min
  }

  pub fn normalize_all(&self, xs: &[f32]) -> Vec<f32> {
    xs.iter().map(|&x| self.normalize(x)).collect()
  }

  pub fn denormalize_all(&self, xs: &[f32]) -> Vec<f32> {
    xs.iter().map(|&x| self.denormalize(x)).collect()
  }
}

/// Per-column bounds of the training data, needed for as long as the model is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
  pub input: MinMax,
  pub label: MinMax,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedData {
  pub inputs: Vec<f32>,
  pub labels: Vec<f32>,
  pub normalization: Normalization,
}

pub fn normalize_columns(inputs: &[f32], labels: &[f32]) -> Result<NormalizedData> {
  if inputs.len() != labels.len() {
    return Err(Error::ShapeMismatch {
      what: "inputs and labels",
      got: labels.len(),
      expected: inputs.len(),
    });
  }
  let input = MinMax::fit("input", inputs)?;
  let label = MinMax::fit("label", labels)?;

  Ok(NormalizedData {
    inputs: input.normalize_all(inputs),
    labels: label.normalize_all(labels),
    normalization: Normalization { input, label },
  })
}

/// Horsepower is the model input, mpg the label.
pub fn normalize_cars(cars: &[Car]) -> Result<NormalizedData> {
  let (inputs, labels): (Vec<f32>, Vec<f32>) = cars.iter().map(|c| (c.horsepower, c.mpg)).unzip();
  normalize_columns(&inputs, &labels)
}
