use crate::domain::model::EnsembleOutput;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Instant;

/// Runs one or more food detectors over an image and returns their fused output.
#[async_trait]
pub trait EnsembleDetector: Send + Sync {
    async fn detect(&self, image_base64: &str, use_ensemble: bool) -> Result<EnsembleOutput>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub trait DetectionConfigProvider: Send + Sync {
    fn min_confidence(&self) -> f64;
    fn enable_gpt(&self) -> bool;
}
