pub mod normalizer;
pub mod scorer;

pub use normalizer::*;
pub use scorer::*;
