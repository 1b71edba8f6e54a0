use crate::core::canonical::canonicalize_name;
use crate::domain::model::{
    BoundingBox, DetectedFood, DetectionSource, EnsembleOutput, FusedItem, FusionOrigin,
    PortionItem, RawBox,
};
use crate::domain::ports::{DetectionConfigProvider, EnsembleDetector};
use crate::utils::error::Result;
use uuid::Uuid;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.35;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionOptions {
    pub min_conf: f64,
    pub enable_gpt: bool,
}

impl Default for FusionOptions {
    fn default() -> Self {
        Self {
            min_conf: DEFAULT_MIN_CONFIDENCE,
            enable_gpt: false,
        }
    }
}

impl FusionOptions {
    pub fn from_config<C: DetectionConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            min_conf: config.min_confidence(),
            enable_gpt: config.enable_gpt(),
        }
    }
}

/// 合併多個偵測器的結果成為一份候選清單
pub struct DetectionFusionAdapter<D: EnsembleDetector> {
    detector: D,
}

impl<D: EnsembleDetector> DetectionFusionAdapter<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// 偵測器的錯誤直接往上拋，這裡不重試
    pub async fn detect(&self, image_base64: &str, options: FusionOptions) -> Result<Vec<DetectedFood>> {
        tracing::debug!(
            "Running ensemble detection (use_ensemble={}, min_conf={:.2})",
            options.enable_gpt,
            options.min_conf
        );

        let output = self
            .detector
            .detect(image_base64, options.enable_gpt)
            .await?;

        let fused_count = output.fused.len();
        let foods = fuse(output, options.min_conf);

        tracing::info!(
            "Fusion kept {} of {} detected items",
            foods.len(),
            fused_count
        );
        Ok(foods)
    }
}

/// Joins fused entries to their portions and drops those below `min_conf`.
pub fn fuse(output: EnsembleOutput, min_conf: f64) -> Vec<DetectedFood> {
    let EnsembleOutput { fused, portions } = output;

    fused
        .into_iter()
        .map(|item| to_detected_food(item, &portions))
        .filter(|food| {
            let keep = food.confidence >= min_conf;
            if !keep {
                tracing::debug!(
                    "Dropping '{}' with confidence {:.2}",
                    food.name,
                    food.confidence
                );
            }
            keep
        })
        .collect()
}

fn to_detected_food(item: FusedItem, portions: &[PortionItem]) -> DetectedFood {
    let canonical = canonicalize_name(&item.name);

    // 每張圖通常不到 20 項，線性搜尋即可
    let grams_estimate = portions
        .iter()
        .find(|p| canonicalize_name(&p.name) == canonical)
        .map(|p| p.grams);

    DetectedFood {
        id: Uuid::new_v4().to_string(),
        name: item.name,
        canonical_name: Some(canonical),
        confidence: clamp_confidence(item.score),
        source: source_for(item.origin),
        bbox: item.bbox.map(to_bounding_box),
        grams_estimate,
    }
}

fn source_for(origin: FusionOrigin) -> DetectionSource {
    match origin {
        FusionOrigin::Both => DetectionSource::Fusion,
        FusionOrigin::Vision => DetectionSource::Vision,
        FusionOrigin::Gpt => DetectionSource::Gpt,
    }
}

fn to_bounding_box(raw: RawBox) -> BoundingBox {
    BoundingBox {
        x: raw.x,
        y: raw.y,
        w: raw.width,
        h: raw.height,
    }
}

// NaN 視同缺少分數
fn clamp_confidence(score: Option<f64>) -> f64 {
    let score = score.filter(|s| !s.is_nan()).unwrap_or(DEFAULT_CONFIDENCE);
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, score: Option<f64>, origin: FusionOrigin) -> FusedItem {
        FusedItem {
            name: name.to_string(),
            score,
            origin,
            bbox: None,
        }
    }

    #[test]
    fn test_confidence_is_clamped_and_defaulted() {
        assert_eq!(clamp_confidence(Some(1.7)), 1.0);
        assert_eq!(clamp_confidence(Some(-0.2)), 0.0);
        assert_eq!(clamp_confidence(None), 0.5);
        assert_eq!(clamp_confidence(Some(f64::NAN)), 0.5);
        assert_eq!(clamp_confidence(Some(0.42)), 0.42);
    }

    #[test]
    fn test_fuse_maps_origin_and_bbox() {
        let output = EnsembleOutput {
            fused: vec![FusedItem {
                bbox: Some(RawBox {
                    x: 1.0,
                    y: 2.0,
                    width: 30.0,
                    height: 40.0,
                }),
                ..item("salmon", Some(0.9), FusionOrigin::Both)
            }],
            portions: vec![],
        };

        let foods = fuse(output, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].source, DetectionSource::Fusion);
        assert_eq!(
            foods[0].bbox,
            Some(BoundingBox {
                x: 1.0,
                y: 2.0,
                w: 30.0,
                h: 40.0
            })
        );
        assert_eq!(foods[0].grams_estimate, None);
    }

    #[test]
    fn test_fuse_joins_first_matching_portion() {
        let output = EnsembleOutput {
            fused: vec![
                item("Salmon Fillet", Some(0.8), FusionOrigin::Gpt),
                item("rice", None, FusionOrigin::Vision),
            ],
            portions: vec![
                PortionItem {
                    name: "salmon".to_string(),
                    grams: 140.0,
                },
                PortionItem {
                    name: "salmon".to_string(),
                    grams: 999.0,
                },
                PortionItem {
                    name: "rice".to_string(),
                    grams: 180.0,
                },
            ],
        };

        let foods = fuse(output, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(foods[0].canonical_name.as_deref(), Some("salmon"));
        assert_eq!(foods[0].grams_estimate, Some(140.0));
        assert_eq!(foods[0].source, DetectionSource::Gpt);
        assert_eq!(foods[1].grams_estimate, Some(180.0));
        assert_eq!(foods[1].confidence, 0.5);
        assert_eq!(foods[1].source, DetectionSource::Vision);
    }

    #[test]
    fn test_fuse_filters_below_min_conf() {
        let output = EnsembleOutput {
            fused: vec![
                item("egg", Some(0.34), FusionOrigin::Vision),
                item("toast", Some(0.35), FusionOrigin::Vision),
                item("bacon", Some(1.4), FusionOrigin::Both),
            ],
            portions: vec![],
        };

        let foods = fuse(output, DEFAULT_MIN_CONFIDENCE);
        let names: Vec<&str> = foods.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["toast", "bacon"]);
        assert!(foods.iter().all(|f| (0.0..=1.0).contains(&f.confidence)));
    }

    struct FixedDetector(EnsembleOutput);

    #[async_trait::async_trait]
    impl EnsembleDetector for FixedDetector {
        async fn detect(&self, _image_base64: &str, _use_ensemble: bool) -> Result<EnsembleOutput> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_adapter_applies_custom_min_conf() {
        let adapter = DetectionFusionAdapter::new(FixedDetector(EnsembleOutput {
            fused: vec![
                item("steak", Some(0.6), FusionOrigin::Gpt),
                item("fries", Some(0.9), FusionOrigin::Vision),
            ],
            portions: vec![],
        }));

        let options = FusionOptions {
            min_conf: 0.8,
            enable_gpt: true,
        };
        let foods = tokio_test::block_on(adapter.detect("aGVsbG8=", options)).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "fries");
    }

    #[test]
    fn test_ids_are_unique() {
        let output = EnsembleOutput {
            fused: vec![
                item("egg", Some(0.9), FusionOrigin::Vision),
                item("egg", Some(0.9), FusionOrigin::Gpt),
            ],
            portions: vec![],
        };
        let foods = fuse(output, DEFAULT_MIN_CONFIDENCE);
        assert_ne!(foods[0].id, foods[1].id);
    }
}
