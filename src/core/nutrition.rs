use crate::domain::model::{EffectiveNutrition, Nutrient, NutrientProfile, ScalingBasis};
use crate::utils::error::{NutriError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingInput {
    #[serde(default)]
    pub base_per_gram: Option<NutrientProfile>,
    #[serde(default)]
    pub base_per_100: Option<NutrientProfile>,
    pub serving_g: f64,
}

/// 將每克或每 100g 的營養基準換算成指定份量
///
/// 份量最小為 1g 並四捨五入到整數。同時提供兩種基準時優先使用每克基準。
/// 沒有任何基準時回傳空的營養素表與 `ScalingBasis::None`，永不失敗。
pub fn compute_effective_nutrition(input: &ScalingInput) -> EffectiveNutrition {
    let serving_grams = clamp_serving_grams(input.serving_g);
    let grams = f64::from(serving_grams);

    let (nutrients, scaling_basis) = match (&input.base_per_gram, &input.base_per_100) {
        (Some(per_gram), _) if !per_gram.is_empty() => {
            (scale_profile(per_gram, grams), ScalingBasis::PerGram)
        }
        (_, Some(per_100)) if !per_100.is_empty() => {
            (scale_profile(per_100, grams / 100.0), ScalingBasis::Per100g)
        }
        _ => (BTreeMap::new(), ScalingBasis::None),
    };

    tracing::debug!(
        "Scaled nutrition to {}g using {:?} basis ({} nutrients)",
        serving_grams,
        scaling_basis,
        nutrients.len()
    );

    EffectiveNutrition {
        nutrients,
        serving_grams,
        scaling_basis,
    }
}

fn clamp_serving_grams(serving_g: f64) -> u32 {
    if !serving_g.is_finite() {
        return 1;
    }
    serving_g.max(1.0).min(f64::from(u32::MAX)).round() as u32
}

fn scale_profile(profile: &NutrientProfile, factor: f64) -> BTreeMap<Nutrient, u64> {
    profile
        .iter()
        .map(|(nutrient, value)| (*nutrient, round_non_negative(value * factor)))
        .collect()
}

// 負值或非有限值視為 0
fn round_non_negative(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Converts a per-serving label into a per-gram basis.
pub fn per_gram_from_serving(per_serving: &NutrientProfile, serving_grams: f64) -> NutrientProfile {
    if !serving_grams.is_finite() || serving_grams <= 0.0 {
        return NutrientProfile::new();
    }
    per_serving
        .iter()
        .filter(|(_, value)| value.is_finite() && **value >= 0.0)
        .map(|(nutrient, value)| (*nutrient, value / serving_grams))
        .collect()
}

/// Parses a JSON nutrient map such as `{"Calories": 2, "protein": 0.3}`.
///
/// Keys are matched case-insensitively; an unknown key is an input error.
pub fn parse_nutrient_profile(raw: &str) -> Result<NutrientProfile> {
    let entries: BTreeMap<String, f64> = serde_json::from_str(raw)?;

    entries
        .into_iter()
        .map(|(key, value)| -> Result<(Nutrient, f64)> {
            let nutrient = key.parse::<Nutrient>().map_err(|_| NutriError::InputError {
                message: format!(
                    "Unknown nutrient '{}', expected one of: {}",
                    key,
                    Nutrient::ALL
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })?;
            Ok((nutrient, value))
        })
        .collect()
}

const MIN_INFERRED_GRAMS: f64 = 5.0;
const MAX_INFERRED_GRAMS: f64 = 250.0;

/// Infers the serving weight from the ratio between per-serving and per-100g values.
///
/// Calories are used when both sides have them; otherwise the median ratio of
/// protein, carbs and fat. Results outside 5..=250g are rejected, accepted
/// values are rounded to the nearest 5g.
pub fn infer_serving_grams(per_100: &NutrientProfile, per_serving: &NutrientProfile) -> Option<u32> {
    let ratio_of = |nutrient: Nutrient| -> Option<f64> {
        let base = per_100.get(&nutrient).copied().filter(|v| *v > 0.0)?;
        let serving = per_serving.get(&nutrient).copied().filter(|v| *v > 0.0)?;
        Some(serving / base)
    };

    if let Some(grams) = ratio_of(Nutrient::Calories).and_then(plausible_grams) {
        return Some(grams);
    }

    let mut ratios: Vec<f64> = [Nutrient::Protein, Nutrient::Carbs, Nutrient::Fat]
        .into_iter()
        .filter_map(ratio_of)
        .collect();
    if ratios.is_empty() {
        return None;
    }
    ratios.sort_by(|a, b| a.total_cmp(b));
    plausible_grams(ratios[ratios.len() / 2])
}

fn plausible_grams(ratio: f64) -> Option<u32> {
    let grams = (ratio * 100.0).round();
    if !(MIN_INFERRED_GRAMS..=MAX_INFERRED_GRAMS).contains(&grams) {
        return None;
    }
    Some(((grams / 5.0).round() * 5.0) as u32)
}
