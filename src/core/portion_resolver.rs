use crate::core::nutrition::infer_serving_grams;
use crate::core::portion::{lookup_portion, parse_serving_size};
use crate::domain::model::NutrientProfile;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const DEFAULT_FALLBACK_GRAMS: f64 = 30.0;

/// 份量的來源，依優先順序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortionSource {
    UserSet,
    OcrDeclared,
    DbDeclared,
    OcrInferredRatio,
    ModelEstimate,
    FallbackDefault,
}

impl PortionSource {
    /// 0..=2, higher is more reliable.
    pub fn confidence(self) -> u8 {
        match self {
            PortionSource::UserSet | PortionSource::DbDeclared => 2,
            PortionSource::OcrDeclared | PortionSource::OcrInferredRatio => 1,
            PortionSource::ModelEstimate | PortionSource::FallbackDefault => 0,
        }
    }

    pub fn is_estimated(self) -> bool {
        matches!(
            self,
            PortionSource::ModelEstimate | PortionSource::FallbackDefault
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortionInfo {
    pub grams: f64,
    pub is_estimated: bool,
    pub source: PortionSource,
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl PortionInfo {
    pub fn new(grams: f64, source: PortionSource) -> Self {
        Self {
            grams,
            is_estimated: source.is_estimated(),
            source,
            confidence: source.confidence(),
            display: None,
        }
    }
}

/// Everything known about an item when picking its serving weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortionHints {
    pub user_grams: Option<f64>,
    pub user_display: Option<String>,
    pub ocr_text: Option<String>,
    pub serving_size: Option<String>,
    pub per_100g: Option<NutrientProfile>,
    pub per_serving: Option<NutrientProfile>,
    pub product_name: Option<String>,
}

static PER_GRAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"per\s+(\d+(?:\.\d+)?)\s*g").expect("valid per-grams pattern"));

/// 依序嘗試各個來源，第一個得到正值者勝出
///
/// user_set → ocr_declared → db_declared → ocr_inferred_ratio → model_estimate → fallback_default
pub fn resolve_portion(hints: &PortionHints, default_grams: f64) -> PortionInfo {
    let info = user_portion(hints)
        .or_else(|| {
            hints
                .ocr_text
                .as_deref()
                .and_then(extract_declared_portion_from_ocr)
        })
        .or_else(|| {
            hints
                .serving_size
                .as_deref()
                .and_then(parse_serving_size)
                .map(|grams| PortionInfo::new(grams, PortionSource::DbDeclared))
        })
        .or_else(|| match (&hints.per_100g, &hints.per_serving) {
            (Some(per_100g), Some(per_serving)) => infer_serving_grams(per_100g, per_serving)
                .map(|grams| PortionInfo::new(f64::from(grams), PortionSource::OcrInferredRatio)),
            _ => None,
        })
        .or_else(|| {
            hints
                .product_name
                .as_deref()
                .and_then(lookup_portion)
                .map(|grams| PortionInfo::new(f64::from(grams), PortionSource::ModelEstimate))
        })
        .unwrap_or_else(|| PortionInfo::new(default_grams, PortionSource::FallbackDefault));

    tracing::debug!(
        "Resolved portion {}g from {:?} (confidence {})",
        info.grams,
        info.source,
        info.confidence
    );
    info
}

fn user_portion(hints: &PortionHints) -> Option<PortionInfo> {
    let grams = hints.user_grams.filter(|g| g.is_finite() && *g > 0.0)?;
    Some(PortionInfo {
        display: hints.user_display.clone(),
        ..PortionInfo::new(grams, PortionSource::UserSet)
    })
}

/// Finds a declared serving in label text.
///
/// Lines mentioning "serving size" or "portion size" are parsed as serving
/// strings; a "per 30g" style statement on any line also counts. The first
/// line that yields a positive weight wins.
pub fn extract_declared_portion_from_ocr(text: &str) -> Option<PortionInfo> {
    for line in text.lines() {
        let lower = line.trim().to_lowercase();

        if lower.contains("serving size") || lower.contains("portion size") {
            if let Some(grams) = parse_serving_size(&lower) {
                return Some(PortionInfo::new(grams, PortionSource::OcrDeclared));
            }
        }

        if let Some(grams) = PER_GRAMS
            .captures(&lower)
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .filter(|g| *g > 0.0)
        {
            return Some(PortionInfo::new(grams, PortionSource::OcrDeclared));
        }
    }

    None
}
