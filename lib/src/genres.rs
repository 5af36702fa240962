use std::fmt;

use itertools::Itertools;
use ndarray::{Array1, Array2};
use tracing::debug;

use crate::{Error, Result};

pub const GENRES: [&str; 5] = ["rock", "trap", "rap", "reggaeton", "bachata"];

/// Reference tracks the user rates, in answer order.
pub const TRACKS: [&str; 8] = [
  "Duki", "NFT", "LilChip", "dragons", "Maluma", "bionica", "soda", "Arcangel",
];

/// Genre index of every track in `TRACKS`.
const TRACK_GENRES: [usize; 8] = [0, 0, 4, 2, 1, 2, 0, 3];

/// The user's ratings of the reference tracks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyAnswers {
  ratings: [f32; TRACKS.len()],
}

impl SurveyAnswers {
  /// Takes already numeric ratings, rejecting the non-finite ones.
  pub fn new(ratings: [f32; TRACKS.len()]) -> Result<Self> {
    if let Some(i) = ratings.iter().position(|r| !r.is_finite()) {
      return Err(Error::Parse {
        field: TRACKS[i].to_string(),
        input: ratings[i].to_string(),
      });
    }
    Ok(Self { ratings })
  }

  /// Parses one text field per track, as typed by the user.
  pub fn parse<S: AsRef<str>>(fields: &[S]) -> Result<Self> {
    if fields.len() != TRACKS.len() {
      return Err(Error::ShapeMismatch {
        what: "survey answers",
        got: fields.len(),
        expected: TRACKS.len(),
      });
    }

    let mut ratings = [0.; TRACKS.len()];
    for ((rating, field), track) in ratings.iter_mut().zip(fields).zip(TRACKS) {
      let input = field.as_ref();
      *rating = match input.trim().parse::<f32>() {
        Ok(value) if value.is_finite() => value,
        _ => {
          return Err(Error::Parse {
            field: track.to_string(),
            input: input.to_string(),
          })
        }
      };
    }
    Ok(Self { ratings })
  }

  pub fn ratings(&self) -> &[f32; TRACKS.len()] {
    &self.ratings
  }
}

/// 8×5 indicator matrix assigning each track to exactly one genre.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreWeights {
  matrix: Array2<f32>,
}

impl Default for GenreWeights {
  fn default() -> Self {
    let mut matrix = Array2::zeros((TRACKS.len(), GENRES.len()));
    for (row, &genre) in TRACK_GENRES.iter().enumerate() {
      matrix[[row, genre]] = 1.;
    }
    Self { matrix }
  }
}

impl GenreWeights {
  /// Builds a weight matrix from its rows. Every row must be one-hot.
  pub fn new(rows: [[f32; GENRES.len()]; TRACKS.len()]) -> Result<Self> {
    for (i, row) in rows.iter().enumerate() {
      let ones = row.iter().filter(|&&w| w == 1.).count();
      let zeros = row.iter().filter(|&&w| w == 0.).count();
      if ones != 1 || zeros != GENRES.len() - 1 {
        return Err(Error::InvalidWeights { row: i });
      }
    }

    let flat = rows.iter().flatten().copied().collect();
    let matrix = Array2::from_shape_vec((TRACKS.len(), GENRES.len()), flat).map_err(|_| {
      Error::ShapeMismatch {
        what: "genre weights",
        got: rows.len() * GENRES.len(),
        expected: TRACKS.len() * GENRES.len(),
      }
    })?;
    Ok(Self { matrix })
  }

  /// `score[j] = Σ_i answer[i] · weight[i][j]`.
  pub fn score(&self, answers: &SurveyAnswers) -> Array1<f32> {
    let answers = Array1::from_iter(answers.ratings.iter().copied());
    answers.dot(&self.matrix)
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenreScore {
  pub genre: &'static str,
  pub score: f32,
}

/// All genres by descending score, exact ties in genre order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
  pub entries: Vec<GenreScore>,
}

impl Ranking {
  pub fn genres(&self) -> Vec<&'static str> {
    self.entries.iter().map(|e| e.genre).collect()
  }
}

impl fmt::Display for Ranking {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.entries.iter().map(|e| e.genre).join(", "))
  }
}

/// Sorts the scores into a ranking. `sorted_by` is stable, so equal scores keep index order.
pub fn rank(scores: &Array1<f32>) -> Ranking {
  let entries = scores
    .iter()
    .zip(GENRES)
    .map(|(&score, genre)| GenreScore { genre, score })
    .sorted_by(|a, b| b.score.total_cmp(&a.score))
    .collect();
  Ranking { entries }
}

#[tracing::instrument(level = "debug", skip(weights))]
pub fn rate(answers: &SurveyAnswers, weights: &GenreWeights) -> Ranking {
  let scores = weights.score(answers);
  debug!("genre scores: {:?}", scores);
  rank(&scores)
}
