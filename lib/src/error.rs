use std::{
  error,
  fmt::{self, Display},
};

/// The result type used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Every way an operation of this crate can fail. All of them are terminal for the
/// operation that produced them.
#[derive(Debug)]
pub enum Error {
  /// A survey rating that is not a finite number.
  Parse { field: String, input: String },
  /// The dataset could not be retrieved from the network.
  Retrieval(String),
  /// The dataset body is not the expected json.
  MalformedData(serde_json::Error),
  /// A column has `max == min`, normalizing it would divide by zero.
  DegenerateDataset { column: &'static str, value: f32 },
  ShapeMismatch {
    what: &'static str,
    got: usize,
    expected: usize,
  },
  EmptyDataset(&'static str),
  /// A genre weight row that is not one-hot.
  InvalidWeights { row: usize },
  InvalidParams(String),
  /// Training produced a non-finite loss.
  Diverged { epoch: usize },
  Io(std::io::Error),
}

impl Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::Parse { field, input } => {
        write!(f, "The answer for {field} is not a number: {input:?}")
      }
      Error::Retrieval(msg) => write!(f, "Failed to retrieve the dataset: {msg}"),
      Error::MalformedData(err) => write!(f, "The dataset is malformed: {err}"),
      Error::DegenerateDataset { column, value } => write!(
        f,
        "Every {column} value equals {value}, the column can't be normalized"
      ),
      Error::ShapeMismatch {
        what,
        got,
        expected,
      } => write!(
        f,
        "There's a size mismatch in {what}, got {got} and expected {expected}"
      ),
      Error::EmptyDataset(what) => write!(f, "The {what} is empty"),
      Error::InvalidWeights { row } => {
        write!(f, "Row {row} of the genre weights is not one-hot")
      }
      Error::InvalidParams(msg) => write!(f, "Invalid training parameters: {msg}"),
      Error::Diverged { epoch } => {
        write!(f, "Training diverged at epoch {epoch}, the loss is not finite")
      }
      Error::Io(err) => write!(f, "{err}"),
    }
  }
}

impl error::Error for Error {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      Error::MalformedData(err) => Some(err),
      Error::Io(err) => Some(err),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for Error {
  fn from(err: reqwest::Error) -> Self {
    Error::Retrieval(err.to_string())
  }
}

impl From<serde_json::Error> for Error {
  fn from(err: serde_json::Error) -> Self {
    Error::MalformedData(err)
  }
}

impl From<std::io::Error> for Error {
  fn from(err: std::io::Error) -> Self {
    Error::Io(err)
  }
}
