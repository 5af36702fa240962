use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
  dataset::{clean, fetch_cars, read_cars},
  normalize::{normalize_cars, Normalization},
  predict::{test_model, Predictions},
  training::{create_model, evaluate, train_model, TrainingObserver},
  CarRecord, History, TrainParams,
};
use crate::Result;

/// Where the car records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
  Url(String),
  File(PathBuf),
}

impl DataSource {
  pub async fn load(&self) -> Result<Vec<CarRecord>> {
    match self {
      DataSource::Url(url) => fetch_cars(url).await,
      DataSource::File(path) => read_cars(path).await,
    }
  }
}

/// Everything the pipeline produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
  pub samples: usize,
  pub normalization: Normalization,
  pub history: History,
  /// Loss of the trained model over the whole normalized dataset.
  pub loss: f32,
  pub predictions: Predictions,
}

/// Load, clean, normalize, train and test, in that order. The first failing stage ends the
/// run.
pub async fn run_pipeline<T: TrainingObserver>(
  source: &DataSource,
  params: &TrainParams,
  observer: &mut T,
) -> Result<Report> {
  let records = source.load().await?;
  let cars = clean(records)?;
  info!("Training on {} cars", cars.len());

  let data = normalize_cars(&cars)?;
  let mut model = create_model(params.seed);
  let history = train_model(&mut model, &data.inputs, &data.labels, params, observer)?;
  let loss = evaluate(&mut model, &data.inputs, &data.labels)?;
  info!("Loss over the whole dataset: {:.6}", loss);
  let predictions = test_model(&mut model, &cars, &data.normalization)?;

  Ok(Report {
    samples: cars.len(),
    normalization: data.normalization,
    history,
    loss,
    predictions,
  })
}
