use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

pub const DEFAULT_PORTION_GRAMS: u32 = 100;

static PORTION_TABLE: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    HashMap::from([
        ("chicken breast", 140),
        ("chicken thigh", 120),
        ("salmon", 150),
        ("tuna", 120),
        ("steak", 200),
        ("ground beef", 115),
        ("pork chop", 170),
        ("egg", 50),
        ("eggs", 100),
        ("tofu", 120),
        ("rice", 150),
        ("brown rice", 150),
        ("quinoa", 140),
        ("pasta", 140),
        ("bread", 30),
        ("toast", 30),
        ("oatmeal", 240),
        ("potato", 170),
        ("sweet potato", 130),
        ("broccoli", 85),
        ("asparagus", 90),
        ("spinach", 30),
        ("salad", 85),
        ("carrot", 60),
        ("green beans", 100),
        ("avocado", 100),
        ("apple", 180),
        ("banana", 120),
        ("orange", 130),
        ("strawberries", 150),
        ("blueberries", 150),
        ("yogurt", 170),
        ("milk", 240),
        ("cheese", 30),
        ("almonds", 28),
        ("peanut butter", 32),
        ("olive oil", 14),
        ("butter", 14),
    ])
});

// 依優先順序排列，先符合者勝出
static CATEGORY_PATTERNS: LazyLock<Vec<(Regex, u32)>> = LazyLock::new(|| {
    [
        (r"salmon|tuna|cod|tilapia|trout|halibut|fish|shrimp|prawn", 150),
        (r"chicken|turkey|poultry", 140),
        (r"beef|steak|pork|lamb|veal|bacon|sausage", 170),
        (r"lettuce|spinach|kale|greens|salad|arugula|broccoli|asparagus|green bean|zucchini", 85),
        (r"rice|pasta|noodle|quinoa|bread|oats|oatmeal|couscous|tortilla", 150),
        (r"sauce|dressing|gravy|ketchup|mayo|salsa|dip", 30),
        (r"apple|banana|orange|berr|grape|mango|pear|peach|melon|pineapple", 120),
        (r"cheese|cheddar|mozzarella|parmesan|feta", 30),
        (r"nut|almond|peanut|cashew|walnut|pecan|pistachio", 28),
    ]
    .into_iter()
    .map(|(pattern, grams)| (Regex::new(pattern).expect("valid category pattern"), grams))
    .collect()
});

/// 由食物名稱估計一份的克數
///
/// 先查精確名稱表，再依類別正規表達式比對，都不符合時回傳 100g。
pub fn estimate_portion_from_name(name: &str) -> u32 {
    lookup_portion(name).unwrap_or_else(|| {
        tracing::debug!("No portion match for '{}', using {}g", name.trim(), DEFAULT_PORTION_GRAMS);
        DEFAULT_PORTION_GRAMS
    })
}

/// Same lookup as [`estimate_portion_from_name`] without the 100g fallback.
pub fn lookup_portion(name: &str) -> Option<u32> {
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }

    if let Some(grams) = PORTION_TABLE.get(key.as_str()) {
        tracing::debug!("Portion table hit for '{}': {}g", key, grams);
        return Some(*grams);
    }

    CATEGORY_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&key))
        .map(|(pattern, grams)| {
            tracing::debug!(
                "Portion category /{}/ matched '{}': {}g",
                pattern.as_str(),
                key,
                grams
            );
            *grams
        })
}

static GRAM_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:g|grams?|ml)\b").expect("valid gram pattern")
});

static OUNCE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:oz|ounces?)\b").expect("valid ounce pattern")
});

const GRAMS_PER_OUNCE: f64 = 28.35;

// 子字串比對，先符合者勝出，順序不可任意調整 ("candy bar" 含有 "can")
const UNIT_GRAMS: [(&str, f64); 12] = [
    ("bar", 40.0),
    ("piece", 25.0),
    ("cookie", 30.0),
    ("cracker", 10.0),
    ("cup", 240.0),
    ("bottle", 500.0),
    ("can", 355.0),
    ("serving", 30.0),
    ("portion", 30.0),
    ("pack", 25.0),
    ("sachet", 15.0),
    ("slice", 30.0),
];

static UNIT_QUANTITIES: LazyLock<Vec<(&'static str, Regex, f64)>> = LazyLock::new(|| {
    UNIT_GRAMS
        .into_iter()
        .map(|(unit, grams)| {
            let re = Regex::new(&format!(r"(\d+(?:\.\d+)?)\s*{}", unit)).expect("valid unit pattern");
            (unit, re, grams)
        })
        .collect()
});

/// Parses a label serving string such as `"30g"`, `"1 serving (28 g)"` or `"2 cookies"`.
pub fn parse_serving_size(text: &str) -> Option<f64> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if let Some(caps) = GRAM_AMOUNT.captures(&lower) {
        return caps[1].parse::<f64>().ok().filter(|g| *g > 0.0);
    }

    if let Some(caps) = OUNCE_AMOUNT.captures(&lower) {
        return caps[1]
            .parse::<f64>()
            .ok()
            .map(|oz| oz * GRAMS_PER_OUNCE)
            .filter(|g| *g > 0.0);
    }

    for (unit, quantity_re, grams) in UNIT_QUANTITIES.iter() {
        if !lower.contains(unit) {
            continue;
        }
        let quantity = quantity_re
            .captures(&lower)
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .unwrap_or(1.0);
        return Some(quantity * grams).filter(|g| *g > 0.0);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup_is_case_insensitive() {
        assert_eq!(estimate_portion_from_name("Chicken Breast"), 140);
        assert_eq!(estimate_portion_from_name("  BANANA "), 120);
    }

    #[test]
    fn test_category_fallback() {
        assert_eq!(estimate_portion_from_name("grilled chicken thigh"), 140);
        assert_eq!(estimate_portion_from_name("Smoked Salmon Fillet"), 150);
        assert_eq!(estimate_portion_from_name("beef stew"), 170);
        assert_eq!(estimate_portion_from_name("caesar salad"), 85);
        assert_eq!(estimate_portion_from_name("fried rice"), 150);
        assert_eq!(estimate_portion_from_name("hot sauce"), 30);
        assert_eq!(estimate_portion_from_name("mixed berries"), 120);
        assert_eq!(estimate_portion_from_name("goat cheese"), 30);
        assert_eq!(estimate_portion_from_name("roasted cashews"), 28);
    }

    #[test]
    fn test_category_priority_order() {
        // fish 先於 poultry
        assert_eq!(estimate_portion_from_name("tuna and turkey wrap"), 150);
        // grains 先於 sauces
        assert_eq!(estimate_portion_from_name("pasta sauce"), 150);
    }

    #[test]
    fn test_unknown_food_falls_back() {
        assert_eq!(estimate_portion_from_name("unknown food xyz"), 100);
        assert_eq!(estimate_portion_from_name(""), 100);
    }

    #[test]
    fn test_parse_serving_size() {
        assert_eq!(parse_serving_size("30g"), Some(30.0));
        assert_eq!(parse_serving_size("1 serving (28 g)"), Some(28.0));
        assert_eq!(parse_serving_size("250 ml"), Some(250.0));
        assert_eq!(parse_serving_size("2 cookies"), Some(60.0));
        assert_eq!(parse_serving_size("1 cup"), Some(240.0));
        assert_eq!(parse_serving_size("bar"), Some(40.0));
        let oz = parse_serving_size("2 oz").unwrap();
        assert!((oz - 56.7).abs() < 1e-9);
        assert_eq!(parse_serving_size(""), None);
        assert_eq!(parse_serving_size("a handful"), None);
    }

    #[test]
    fn test_unit_match_order() {
        // "candy" 含有 "can"，必須先比對到 bar
        assert_eq!(parse_serving_size("1 candy bar"), Some(40.0));
        assert_eq!(parse_serving_size("2 pieces"), Some(50.0));
        assert_eq!(parse_serving_size("1 can"), Some(355.0));
        assert_eq!(parse_serving_size("3 crackers"), Some(30.0));
        assert_eq!(parse_serving_size("1 slice"), Some(30.0));
    }

    #[test]
    fn test_every_category_pattern_compiles() {
        assert_eq!(CATEGORY_PATTERNS.len(), 9);
        assert_eq!(UNIT_QUANTITIES.len(), UNIT_GRAMS.len());
    }

    #[test]
    fn test_lookup_portion_has_no_fallback() {
        assert_eq!(lookup_portion("Chicken Breast"), Some(140));
        assert_eq!(lookup_portion("mixed berries"), Some(120));
        assert_eq!(lookup_portion("unknown food xyz"), None);
        assert_eq!(lookup_portion("   "), None);
    }
}
