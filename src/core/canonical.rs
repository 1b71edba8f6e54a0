use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

pub const DEFAULT_MIN_SCORE: f64 = 0.62;

static SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("salmon cooked walmart", "salmon"),
        ("salmon fillet", "salmon"),
        ("atlantic salmon", "salmon"),
        ("grilled salmon", "salmon"),
        ("smoked salmon", "salmon"),
        ("chicken breast fillet", "chicken breast"),
        ("grilled chicken breast", "chicken breast"),
        ("boneless skinless chicken breast", "chicken breast"),
        ("broccoli florets", "broccoli"),
        ("steamed broccoli", "broccoli"),
        ("asparagus spears", "asparagus"),
        ("baby carrots", "carrot"),
        ("carrots", "carrot"),
        ("cherry tomatoes", "tomato"),
        ("tomatoes", "tomato"),
        ("string beans", "green beans"),
        ("romaine lettuce", "lettuce"),
        ("baby spinach", "spinach"),
        ("lemon wedge", "lemon"),
        ("lemon slice", "lemon"),
        ("white rice", "rice"),
        ("steamed rice", "rice"),
        ("cooked rice", "rice"),
        ("sunny side up egg", "egg"),
        ("fried egg", "egg"),
        ("hard boiled egg", "egg"),
    ])
});

static VEGETABLES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "asparagus",
        "bell pepper",
        "broccoli",
        "brussels sprouts",
        "cabbage",
        "carrot",
        "cauliflower",
        "celery",
        "cucumber",
        "green beans",
        "kale",
        "lettuce",
        "onion",
        "peas",
        "spinach",
        "tomato",
        "zucchini",
    ])
});

static NON_FOOD: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "plate",
        "dish",
        "bowl",
        "table",
        "tableware",
        "cutlery",
        "fork",
        "knife",
        "spoon",
        "cup",
        "glass",
        "syrup",
        "curd",
        "ketchup",
        "bar",
        "cookie",
        "snack",
        "container",
        "wrapper",
        "package",
    ])
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub score: f64,
}

impl Candidate {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// 小寫、去除頭尾空白並合併連續空白後，套用同義詞表
pub fn canonicalize_name(name: &str) -> String {
    let normalized = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    match SYNONYMS.get(normalized.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => normalized,
    }
}

pub fn is_vegetable(canonical: &str) -> bool {
    VEGETABLES.contains(canonical)
}

pub fn is_non_food(name: &str) -> bool {
    NON_FOOD.contains(name.trim().to_lowercase().as_str())
}

/// Collapses candidates sharing a canonical key, keeping the highest score.
///
/// Only a strictly greater score replaces the kept entry, so ties keep the
/// first one seen. Output follows first-seen order of each key. The losing
/// duplicates are dropped without trace.
pub fn dedupe_by_canonical(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let key = canonicalize_name(&candidate.name);
        match index_by_key.get(&key) {
            Some(&idx) => {
                if candidate.score > kept[idx].score {
                    tracing::debug!(
                        "Dedupe '{}': {:.2} replaces {:.2}",
                        key,
                        candidate.score,
                        kept[idx].score
                    );
                    kept[idx] = candidate;
                } else {
                    tracing::debug!("Dedupe '{}': dropped score {:.2}", key, candidate.score);
                }
            }
            None => {
                index_by_key.insert(key, kept.len());
                kept.push(candidate);
            }
        }
    }

    kept
}

/// Vegetables always pass; everything else needs `score >= min_score`.
pub fn filter_candidates(candidates: Vec<Candidate>, min_score: f64) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| is_vegetable(&canonicalize_name(&c.name)) || c.score >= min_score)
        .collect()
}

/// 正規化名稱、去除重複並過濾低分候選
pub fn process_candidates(candidates: Vec<Candidate>, min_score: f64) -> Vec<Candidate> {
    let input_len = candidates.len();
    let canonical: Vec<Candidate> = candidates
        .into_iter()
        .map(|c| Candidate {
            name: canonicalize_name(&c.name),
            score: c.score,
        })
        .collect();

    let result = filter_candidates(dedupe_by_canonical(canonical), min_score);
    tracing::debug!("Canonicalized {} candidates into {}", input_len, result.len());
    result
}
