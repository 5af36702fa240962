pub mod error;
pub mod genres;
pub mod model;
pub mod subcommands;
pub mod utils;

pub use error::{Error, Result};
