use std::path::PathBuf;

use tracing::info;

use crate::{
  model::{run_pipeline, DataSource, LoggingObserver, PredictionSink, Predictions, Report, TrainParams},
  utils::serialize_to_file,
  Result,
};

/// Trains the horsepower to mpg regression and hands the results to the sinks.
pub struct Cars {
  source: DataSource,
  params: TrainParams,
  output: Option<PathBuf>,
}

impl Cars {
  pub fn new(source: DataSource, params: TrainParams, output: Option<PathBuf>) -> Self {
    Self {
      source,
      params,
      output,
    }
  }

  pub async fn run(self) -> Result<Report> {
    info!("Loading cars from {:?}", self.source);
    let report = run_pipeline(&self.source, &self.params, &mut LoggingObserver).await?;

    let mut summary = SummarySink;
    summary.render(&report.predictions)?;
    if let Some(path) = &self.output {
      serialize_to_file(path, &report)?;
      info!("Wrote report to {}", path.display());
    }
    Ok(report)
  }
}

/// Logs the ends of the predicted line next to the size of the original series.
struct SummarySink;

impl PredictionSink for SummarySink {
  fn render(&mut self, predictions: &Predictions) -> Result<()> {
    if let (Some(first), Some(last)) = (predictions.predicted.first(), predictions.predicted.last()) {
      info!(
        "{} original points, predicted {} goes {:.1} -> {:.1} as {} goes {:.0} -> {:.0}",
        predictions.original.len(),
        predictions.y_label,
        first.y,
        last.y,
        predictions.x_label,
        first.x,
        last.x,
      );
    }
    Ok(())
  }
}
