pub use cars::*;
pub use genres::*;

pub mod cars;
pub mod genres;
