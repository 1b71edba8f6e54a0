pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command};

pub use crate::adapters::HttpEnsembleDetector;
pub use crate::config::CoachConfig;
pub use crate::core::barcode::normalize_barcode;
pub use crate::core::fusion::{DetectionFusionAdapter, FusionOptions};
pub use crate::core::handoff::DetectionHandoff;
pub use crate::core::nutrition::{compute_effective_nutrition, ScalingInput};
pub use crate::core::portion::estimate_portion_from_name;
pub use crate::core::portion_resolver::{resolve_portion, PortionHints, PortionInfo, PortionSource};
pub use crate::core::ttl_store::EphemeralStore;
pub use crate::utils::error::{NutriError, Result};
