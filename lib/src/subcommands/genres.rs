use tracing::info;

use crate::{
  genres::{rate, GenreWeights, Ranking, SurveyAnswers},
  Result,
};

/// Ranks the genres from the ratings typed by the user, one field per reference track.
pub struct Genres {
  fields: Vec<String>,
  weights: GenreWeights,
}

impl Genres {
  pub fn new(fields: Vec<String>) -> Self {
    Self {
      fields,
      weights: GenreWeights::default(),
    }
  }

  #[cfg(test)]
  fn with_weights(self, weights: GenreWeights) -> Self {
    Self { weights, ..self }
  }

  pub fn run(self) -> Result<Ranking> {
    let answers = SurveyAnswers::parse(&self.fields)?;
    let ranking = rate(&answers, &self.weights);
    info!("Ranking: {}", ranking);
    Ok(ranking)
  }
}
