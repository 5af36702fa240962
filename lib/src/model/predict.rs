use serde::{Deserialize, Serialize};

use super::{normalize::Normalization, sequential::Sequential, Car, Point, GRID_POINTS};
use crate::Result;

/// The two scatter series comparing the data with what the model learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
  pub series: [String; 2],
  pub x_label: String,
  pub y_label: String,
  pub original: Vec<Point>,
  pub predicted: Vec<Point>,
}

/// Receives the predictions once they are computed.
pub trait PredictionSink {
  fn render(&mut self, predictions: &Predictions) -> Result<()>;
}

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
  match n {
    0 => Vec::new(),
    1 => vec![start],
    _ => {
      let step = (end - start) / (n - 1) as f32;
      (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f32 })
        .collect()
    }
  }
}

/// Runs the model over a grid spanning the normalized input range and maps both the grid and
/// the predictions back to the original units.
pub fn test_model(
  model: &mut Sequential,
  cars: &[Car],
  normalization: &Normalization,
) -> Result<Predictions> {
  let xs = linspace(0., 1., GRID_POINTS);
  let preds = model.predict(&xs)?;

  let predicted = normalization
    .input
    .denormalize_all(&xs)
    .into_iter()
    .zip(normalization.label.denormalize_all(&preds))
    .map(|(x, y)| Point { x, y })
    .collect();
  let original = cars
    .iter()
    .map(|car| Point {
      x: car.horsepower,
      y: car.mpg,
    })
    .collect();

  Ok(Predictions {
    series: ["original".to_string(), "predicted".to_string()],
    x_label: "Horsepower".to_string(),
    y_label: "MPG".to_string(),
    original,
    predicted,
  })
}
