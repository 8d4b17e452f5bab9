mod client;
mod replicate;
mod types;

pub use client::PredictionClient;
pub use replicate::ReplicateClient;
pub use types::{PredictionResult, PredictionStatus};
