use std::path::Path;

use tracing::{debug, info};

use super::{Car, CarRecord};
use crate::{Error, Result};

/// Downloads the car records. Transport failures and non-success statuses are `Retrieval`
/// errors.
#[tracing::instrument]
pub async fn fetch_cars(url: &str) -> Result<Vec<CarRecord>> {
  let response = reqwest::get(url).await?.error_for_status()?;
  let body = response.text().await?;
  info!("Fetched {} bytes", body.len());
  parse_cars(&body)
}

pub async fn read_cars(path: &Path) -> Result<Vec<CarRecord>> {
  let content = tokio::fs::read_to_string(path).await?;
  parse_cars(&content)
}

pub fn parse_cars(content: &str) -> Result<Vec<CarRecord>> {
  let records: Vec<CarRecord> = serde_json::from_str(content)?;
  debug!("Parsed {} records", records.len());
  Ok(records)
}

/// Keeps the records that have both horsepower and mpg, in their original order.
pub fn filter_complete(records: Vec<CarRecord>) -> Vec<CarRecord> {
  let total = records.len();
  let kept: Vec<_> = records
    .into_iter()
    .filter(|car| car.horsepower.is_some() && car.mpg.is_some())
    .collect();
  debug!("Kept {} of {} records", kept.len(), total);
  kept
}

pub fn extract_samples(records: &[CarRecord]) -> Vec<Car> {
  records
    .iter()
    .filter_map(|car| match (car.horsepower, car.mpg) {
      (Some(horsepower), Some(mpg)) => Some(Car { horsepower, mpg }),
      _ => None,
    })
    .collect()
}

/// `filter_complete` followed by `extract_samples`. An empty result is an error, nothing
/// can be trained on it.
pub fn clean(records: Vec<CarRecord>) -> Result<Vec<Car>> {
  let cars = extract_samples(&filter_complete(records));
  if cars.is_empty() {
    return Err(Error::EmptyDataset("filtered car dataset"));
  }
  Ok(cars)
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  fn record(horsepower: Option<f32>, mpg: Option<f32>) -> CarRecord {
    CarRecord { horsepower, mpg }
  }

  #[test]
  fn test_parse_ignores_other_fields() {
    let body = r#"[
      {"Name": "chevrolet chevelle malibu", "Miles_per_Gallon": 18, "Cylinders": 8, "Horsepower": 130},
      {"Name": "citroen ds-21 pallas", "Miles_per_Gallon": null, "Horsepower": 115},
      {"Name": "ford mustang", "Miles_per_Gallon": 25}
    ]"#;
    let records = parse_cars(body).unwrap();
    assert_eq!(
      records,
      vec![
        record(Some(130.), Some(18.)),
        record(Some(115.), None),
        record(None, Some(25.)),
      ]
    );
  }

  #[test]
  fn test_parse_rejects_malformed_body() {
    assert!(matches!(parse_cars("<html>"), Err(Error::MalformedData(_))));
    assert!(matches!(parse_cars(r#"{"Horsepower": 1}"#), Err(Error::MalformedData(_))));
  }

  #[test]
  fn test_filter_drops_incomplete_records() {
    let records = vec![record(Some(130.), Some(18.)), record(None, Some(20.))];
    let cars = clean(records).unwrap();
    assert_eq!(cars, vec![Car { horsepower: 130., mpg: 18. }]);
  }

  #[test]
  fn test_clean_rejects_empty_result() {
    let records = vec![record(None, Some(20.)), record(Some(90.), None)];
    assert!(matches!(clean(records), Err(Error::EmptyDataset(_))));
  }

  #[tokio::test]
  async fn test_read_cars_reports_missing_file() {
    let path = Path::new("/definitely/not/here/cars.json");
    assert!(matches!(read_cars(path).await, Err(Error::Io(_))));
  }

  #[tokio::test]
  async fn test_fetch_refused_connection_is_retrieval_error() {
    let result = fetch_cars("http://127.0.0.1:1/carsData.json").await;
    assert!(matches!(result, Err(Error::Retrieval(_))));
  }

  fn any_record() -> impl Strategy<Value = CarRecord> {
    (
      prop::option::of(40f32..250f32),
      prop::option::of(5f32..50f32),
    )
      .prop_map(|(horsepower, mpg)| CarRecord { horsepower, mpg })
  }

  proptest! {
    #[test]
    fn test_filter_is_idempotent(records in prop::collection::vec(any_record(), 0..64)) {
      let once = filter_complete(records);
      let twice = filter_complete(once.clone());
      prop_assert_eq!(&once, &twice);
      prop_assert_eq!(extract_samples(&once).len(), once.len());
    }
  }
}
