pub mod barcode;
pub mod canonical;
pub mod clock;
pub mod fusion;
pub mod handoff;
pub mod nutrition;
pub mod portion;
pub mod portion_resolver;
pub mod ttl_store;

pub use crate::domain::model::{
    BarcodeKind, BarcodeNormalization, DetectedFood, DetectionSource, EffectiveNutrition,
    EnsembleOutput, Nutrient, NutrientProfile, ScalingBasis,
};
pub use crate::domain::ports::{Clock, DetectionConfigProvider, EnsembleDetector};
pub use crate::utils::error::Result;
