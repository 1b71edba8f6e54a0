use async_trait::async_trait;
use nutri_coach::core::clock::ManualClock;
use nutri_coach::core::ttl_store::DEFAULT_TTL;
use nutri_coach::domain::model::{DetectedFood, EnsembleOutput, FusedItem, FusionOrigin, PortionItem};
use nutri_coach::domain::ports::EnsembleDetector;
use nutri_coach::{
    CoachConfig, DetectionFusionAdapter, DetectionHandoff, EphemeralStore, FusionOptions,
    NutriError, Result,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct StaticDetector {
    output: EnsembleOutput,
    last_use_ensemble: AtomicBool,
}

impl StaticDetector {
    fn new(output: EnsembleOutput) -> Self {
        Self {
            output,
            last_use_ensemble: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EnsembleDetector for StaticDetector {
    async fn detect(&self, _image_base64: &str, use_ensemble: bool) -> Result<EnsembleOutput> {
        self.last_use_ensemble.store(use_ensemble, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

struct FailingDetector;

#[async_trait]
impl EnsembleDetector for FailingDetector {
    async fn detect(&self, _image_base64: &str, _use_ensemble: bool) -> Result<EnsembleOutput> {
        Err(NutriError::DetectorError {
            status: 500,
            message: "boom".to_string(),
        })
    }
}

fn fused(name: &str, score: f64, origin: FusionOrigin) -> FusedItem {
    FusedItem {
        name: name.to_string(),
        score: Some(score),
        origin,
        bbox: None,
    }
}

fn sample_output() -> EnsembleOutput {
    EnsembleOutput {
        fused: vec![
            fused("grilled chicken thigh", 0.8, FusionOrigin::Both),
            fused("plate", 0.99, FusionOrigin::Vision),
            fused("rice", 0.7, FusionOrigin::Gpt),
            fused("lemon", 0.1, FusionOrigin::Gpt),
        ],
        portions: vec![PortionItem {
            name: "rice".to_string(),
            grams: 200.0,
        }],
    }
}

#[tokio::test]
async fn test_scan_and_take() {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(EphemeralStore::with_clock(DEFAULT_TTL, clock.clone()));
    let adapter = DetectionFusionAdapter::new(StaticDetector::new(sample_output()));
    let handoff = DetectionHandoff::new(
        adapter,
        store.clone(),
        FusionOptions {
            min_conf: 0.35,
            enable_gpt: true,
        },
    );

    let id = handoff.scan("aGVsbG8=").await.unwrap();
    assert_eq!(store.len(), 1);

    let foods = handoff.take(&id).unwrap();
    let names: Vec<&str> = foods.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["grilled chicken thigh", "rice"]);
    // 偵測器沒有份量時由名稱估計
    assert_eq!(foods[0].grams_estimate, Some(140.0));
    assert_eq!(foods[1].grams_estimate, Some(200.0));

    // take 之後就不存在了
    assert!(handoff.take(&id).is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_enable_gpt_is_forwarded() {
    let store: Arc<EphemeralStore<Vec<DetectedFood>>> = Arc::new(EphemeralStore::default());
    let adapter = DetectionFusionAdapter::new(StaticDetector::new(sample_output()));
    let handoff = DetectionHandoff::new(
        adapter,
        store,
        FusionOptions {
            enable_gpt: true,
            ..FusionOptions::default()
        },
    );

    handoff.scan("aGVsbG8=").await.unwrap();
    let detector = handoff.adapter().detector();
    assert!(detector.last_use_ensemble.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_expired_handoff_is_gone() {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(EphemeralStore::with_clock(DEFAULT_TTL, clock.clone()));
    let adapter = DetectionFusionAdapter::new(StaticDetector::new(sample_output()));
    let handoff = DetectionHandoff::new(adapter, store, FusionOptions::default());

    let id = handoff.scan("aGVsbG8=").await.unwrap();
    clock.advance(DEFAULT_TTL + Duration::from_secs(1));

    assert!(handoff.take(&id).is_none());
}

#[tokio::test]
async fn test_scan_propagates_detector_error() {
    let store: Arc<EphemeralStore<Vec<DetectedFood>>> = Arc::new(EphemeralStore::default());
    let handoff = DetectionHandoff::new(
        DetectionFusionAdapter::new(FailingDetector),
        store.clone(),
        FusionOptions::default(),
    );

    let result = handoff.scan("aGVsbG8=").await;
    assert!(matches!(result, Err(NutriError::DetectorError { status: 500, .. })));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_canonical_min_score_from_config() {
    let config = CoachConfig::from_toml_str("[canonical]\nmin_score = 0.62\n").unwrap();
    let output = EnsembleOutput {
        fused: vec![
            fused("salmon fillet", 0.7, FusionOrigin::Vision),
            fused("steamed broccoli", 0.4, FusionOrigin::Gpt),
            fused("cake", 0.5, FusionOrigin::Gpt),
            fused("grilled salmon", 0.9, FusionOrigin::Both),
            fused("ketchup", 0.95, FusionOrigin::Vision),
        ],
        portions: vec![],
    };
    let store: Arc<EphemeralStore<Vec<DetectedFood>>> = Arc::new(EphemeralStore::default());
    let handoff = DetectionHandoff::new(
        DetectionFusionAdapter::new(StaticDetector::new(output)),
        store,
        FusionOptions::default(),
    )
    .with_min_score(config.canonical_min_score());

    let id = handoff.scan("aGVsbG8=").await.unwrap();
    let foods = handoff.take(&id).unwrap();

    let names: Vec<&str> = foods.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["grilled salmon", "steamed broccoli"]);
    assert_eq!(foods[0].canonical_name.as_deref(), Some("salmon"));
    assert_eq!(foods[0].grams_estimate, Some(150.0));
}

#[tokio::test]
async fn test_store_ttl_from_config() {
    let config = CoachConfig::from_toml_str("[store]\nttl_seconds = 10\n").unwrap();
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(EphemeralStore::with_clock(config.store_ttl(), clock.clone()));
    let handoff = DetectionHandoff::new(
        DetectionFusionAdapter::new(StaticDetector::new(sample_output())),
        store,
        FusionOptions::default(),
    );

    let first = handoff.scan("aGVsbG8=").await.unwrap();
    let second = handoff.scan("aGVsbG8=").await.unwrap();

    clock.advance(Duration::from_secs(10));
    assert!(handoff.take(&first).is_some());

    clock.advance(Duration::from_secs(1));
    assert!(handoff.take(&second).is_none());
}
