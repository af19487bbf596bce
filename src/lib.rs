//! Gate assignment for airport stands: instance generation, the apron floor
//! preprocessing, the walking distance model and parameter sweeps.

pub mod error;
pub mod experiment;
pub mod generate;
pub mod instance;
pub mod preprocess;
pub mod resolution;
pub mod timegrid;
