use std::path::{Path, PathBuf};

use lib::model::{OptimizerKind, TrainParams};
use serde::Deserialize;

/// Settings shared by the config file and the command line.
/// Also defines the config file format (every field can be omitted).
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
  /// Log debug output
  pub verbose: Option<bool>,
  /// Url of the car dataset
  pub url: Option<String>,
  /// Local copy of the car dataset, used instead of the url
  pub data: Option<PathBuf>,
  pub epochs: Option<usize>,
  pub batch_size: Option<usize>,
  pub learning_rate: Option<f32>,
  pub optimizer: Option<OptimizerKind>,
  pub shuffle: Option<bool>,
  pub seed: Option<u64>,
  /// Where to write the json report
  pub output: Option<PathBuf>,
}

impl AppConfig {
  pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
  }

  // merge configs where the second overwrites the first
  pub fn merge(self, other: Self) -> Self {
    Self {
      verbose: other.verbose.or(self.verbose),
      url: other.url.or(self.url),
      data: other.data.or(self.data),
      epochs: other.epochs.or(self.epochs),
      batch_size: other.batch_size.or(self.batch_size),
      learning_rate: other.learning_rate.or(self.learning_rate),
      optimizer: other.optimizer.or(self.optimizer),
      shuffle: other.shuffle.or(self.shuffle),
      seed: other.seed.or(self.seed),
      output: other.output.or(self.output),
    }
  }

  pub fn train_params(&self) -> TrainParams {
    let defaults = TrainParams::default();
    TrainParams {
      optimizer: self.optimizer.unwrap_or(defaults.optimizer),
      learning_rate: self.learning_rate.or(defaults.learning_rate),
      batch_size: self.batch_size.unwrap_or(defaults.batch_size),
      epochs: self.epochs.unwrap_or(defaults.epochs),
      shuffle: self.shuffle.unwrap_or(defaults.shuffle),
      seed: self.seed.unwrap_or(defaults.seed),
    }
  }
}
