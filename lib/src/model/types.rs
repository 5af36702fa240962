use serde::{Deserialize, Serialize};

pub const DATA_URL: &str = "https://storage.googleapis.com/tfjs-tutorials/carsData.json";

/// Amount of evenly spaced inputs the trained model is evaluated on.
pub const GRID_POINTS: usize = 100;

/// A vehicle as found in the dataset. Every other field of the json object is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct CarRecord {
  #[serde(rename = "Horsepower", default)]
  pub horsepower: Option<f32>,
  #[serde(rename = "Miles_per_Gallon", default)]
  pub mpg: Option<f32>,
}

/// A record with both fields present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Car {
  pub horsepower: f32,
  pub mpg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
  pub x: f32,
  pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
  Adam,
  Sgd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainParams {
  pub optimizer: OptimizerKind,
  /// `None` picks the optimizer's own default.
  pub learning_rate: Option<f32>,
  pub batch_size: usize,
  pub epochs: usize,
  /// Reshuffle the samples before every epoch.
  pub shuffle: bool,
  /// Seeds both weight initialization and shuffling.
  pub seed: u64,
}

impl Default for TrainParams {
  fn default() -> Self {
    Self {
      optimizer: OptimizerKind::Adam,
      learning_rate: None,
      batch_size: 32,
      epochs: 50,
      shuffle: true,
      seed: 42,
    }
  }
}

/// Metrics reported at the end of an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochLogs {
  pub epoch: usize,
  pub loss: f32,
  pub mse: f32,
}

pub type History = Vec<EpochLogs>;
