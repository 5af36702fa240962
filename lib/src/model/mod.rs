pub mod dataset;
pub mod layers;
pub mod loss;
pub mod normalize;
pub mod optimizer;
pub mod pipeline;
pub mod predict;
pub mod sequential;
pub mod training;
pub mod types;

pub use dataset::*;
pub use normalize::*;
pub use pipeline::*;
pub use predict::*;
pub use sequential::Sequential;
pub use training::*;
pub use types::*;
