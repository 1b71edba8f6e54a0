use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 偵測結果的來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    Vision,
    Gpt,
    Fusion,
    Manual,
    Speech,
    Barcode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFood {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
    pub confidence: f64,
    pub source: DetectionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grams_estimate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
    Fat,
    Fiber,
    Sugar,
    Sodium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 7] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
        Nutrient::Fiber,
        Nutrient::Sugar,
        Nutrient::Sodium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Carbs => "carbs",
            Nutrient::Fat => "fat",
            Nutrient::Fiber => "fiber",
            Nutrient::Sugar => "sugar",
            Nutrient::Sodium => "sodium",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Nutrient {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Nutrient::ALL
            .into_iter()
            .find(|n| n.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown nutrient: {}", s))
    }
}

/// 每單位質量 (1g 或 100g) 的營養素數值，缺少的鍵視為 0
pub type NutrientProfile = BTreeMap<Nutrient, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalingBasis {
    #[serde(rename = "per-gram")]
    PerGram,
    #[serde(rename = "per-100g")]
    Per100g,
    #[serde(rename = "none")]
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveNutrition {
    #[serde(flatten)]
    pub nutrients: BTreeMap<Nutrient, u64>,
    pub serving_grams: u32,
    pub scaling_basis: ScalingBasis,
}

impl EffectiveNutrition {
    pub fn get(&self, nutrient: Nutrient) -> u64 {
        self.nutrients.get(&nutrient).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeKind {
    #[serde(rename = "EAN13")]
    Ean13,
    #[serde(rename = "UPC")]
    Upc,
    #[serde(rename = "EAN8")]
    Ean8,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeNormalization {
    pub normalized: String,
    pub kind: BarcodeKind,
}

/// Which detector(s) produced a fused entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionOrigin {
    Vision,
    Gpt,
    Both,
}

/// Detector wire form of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedItem {
    pub name: String,
    #[serde(default)]
    pub score: Option<f64>,
    pub origin: FusionOrigin,
    #[serde(default)]
    pub bbox: Option<RawBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortionItem {
    pub name: String,
    pub grams: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnsembleOutput {
    #[serde(default)]
    pub fused: Vec<FusedItem>,
    #[serde(default)]
    pub portions: Vec<PortionItem>,
}
