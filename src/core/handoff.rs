use crate::core::canonical::{canonicalize_name, is_non_food, process_candidates, Candidate};
use crate::core::clock::SystemClock;
use crate::core::fusion::{DetectionFusionAdapter, FusionOptions};
use crate::core::portion::estimate_portion_from_name;
use crate::core::ttl_store::EphemeralStore;
use crate::domain::model::DetectedFood;
use crate::domain::ports::{Clock, EnsembleDetector};
use crate::utils::error::Result;
use std::sync::Arc;

/// 偵測完成後把結果暫存起來，交給確認畫面以 id 取回
pub struct DetectionHandoff<D: EnsembleDetector, C: Clock = SystemClock> {
    adapter: DetectionFusionAdapter<D>,
    store: Arc<EphemeralStore<Vec<DetectedFood>, C>>,
    options: FusionOptions,
    min_score: Option<f64>,
}

impl<D: EnsembleDetector, C: Clock> DetectionHandoff<D, C> {
    pub fn new(
        adapter: DetectionFusionAdapter<D>,
        store: Arc<EphemeralStore<Vec<DetectedFood>, C>>,
        options: FusionOptions,
    ) -> Self {
        Self {
            adapter,
            store,
            options,
            min_score: None,
        }
    }

    /// 啟用正規化名稱的去重與分數門檻 (蔬菜不受門檻限制)
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn adapter(&self) -> &DetectionFusionAdapter<D> {
        &self.adapter
    }

    pub fn store(&self) -> &Arc<EphemeralStore<Vec<DetectedFood>, C>> {
        &self.store
    }

    pub async fn scan(&self, image_base64: &str) -> Result<String> {
        tracing::info!("Starting meal scan...");

        let detected = self.adapter.detect(image_base64, self.options).await?;
        tracing::debug!("Detected {} candidates", detected.len());

        let detected = match self.min_score {
            Some(min_score) => select_canonical(detected, min_score),
            None => detected,
        };
        let foods = prepare_for_review(detected);
        let count = foods.len();
        let id = self.store.put(foods);

        tracing::info!("Stored {} items for review under {}", count, id);
        Ok(id)
    }

    /// 取回後即刪除
    pub fn take(&self, id: &str) -> Option<Vec<DetectedFood>> {
        let foods = self.store.get(id);
        self.store.del(id);
        foods
    }
}

/// Keeps one food per canonical name, then applies the score threshold.
///
/// Vegetables pass regardless of score. Survivors keep their first-seen order.
pub fn select_canonical(foods: Vec<DetectedFood>, min_score: f64) -> Vec<DetectedFood> {
    let key = |food: &DetectedFood| {
        canonicalize_name(food.canonical_name.as_deref().unwrap_or(&food.name))
    };

    let candidates = foods
        .iter()
        .map(|food| Candidate::new(key(food), food.confidence))
        .collect();
    let kept = process_candidates(candidates, min_score);

    let mut pool: Vec<Option<DetectedFood>> = foods.into_iter().map(Some).collect();
    kept.into_iter()
        .filter_map(|candidate| {
            pool.iter_mut()
                .find(|slot| {
                    slot.as_ref().is_some_and(|food| {
                        key(food) == candidate.name && food.confidence == candidate.score
                    })
                })
                .and_then(Option::take)
        })
        .collect()
}

/// Drops tableware and fills in missing portion estimates from the food name.
pub fn prepare_for_review(foods: Vec<DetectedFood>) -> Vec<DetectedFood> {
    foods
        .into_iter()
        .filter(|food| {
            let name = food.canonical_name.as_deref().unwrap_or(&food.name);
            let rejected = is_non_food(name);
            if rejected {
                tracing::debug!("Rejected non-food item '{}'", name);
            }
            !rejected
        })
        .map(|mut food| {
            if food.grams_estimate.is_none() {
                let name = food.canonical_name.as_deref().unwrap_or(&food.name);
                food.grams_estimate = Some(f64::from(estimate_portion_from_name(name)));
            }
            food
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DetectionSource;

    fn food(name: &str, grams: Option<f64>) -> DetectedFood {
        DetectedFood {
            id: name.to_string(),
            name: name.to_string(),
            canonical_name: Some(name.to_lowercase()),
            confidence: 0.9,
            source: DetectionSource::Vision,
            bbox: None,
            grams_estimate: grams,
        }
    }

    #[test]
    fn test_prepare_for_review() {
        let result = prepare_for_review(vec![
            food("Plate", None),
            food("chicken breast", None),
            food("rice", Some(210.0)),
        ]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].grams_estimate, Some(140.0));
        assert_eq!(result[1].grams_estimate, Some(210.0));
    }

    #[test]
    fn test_select_canonical() {
        let mut low_salmon = food("salmon", None);
        low_salmon.confidence = 0.7;
        let mut broccoli = food("broccoli", None);
        broccoli.confidence = 0.2;
        let mut cake = food("cake", None);
        cake.confidence = 0.5;
        let mut best_salmon = food("Grilled Salmon", None);
        best_salmon.canonical_name = Some("salmon".to_string());
        best_salmon.confidence = 0.95;

        let result = select_canonical(vec![low_salmon, broccoli, cake, best_salmon], 0.62);
        let names: Vec<&str> = result.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Grilled Salmon", "broccoli"]);
    }
}
