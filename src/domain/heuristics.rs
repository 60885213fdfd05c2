//! Heuristic inference: derives a breakdown from item metadata alone.
//!
//! - Base price: first category whose keyword appears in title + description.
//! - Age factor: bracket on `reference_year - year`.
//! - Condition factor: exact (case-insensitive) vocabulary lookup.
//! - Brand factor: premium list, then discount list, by substring.
//! - Accessory value: per accessory, first matching rule or a nominal value.

use time::OffsetDateTime;
use tracing::debug;

use super::breakdown::compute_value;
use super::confidence;
use super::entities::{Breakdown, ItemMetadata, Valuation, YearInput};
use super::pricing::PricingTables;
use crate::util::rounding::round2;

/// Deterministic, side-effect free valuation engine.
#[derive(Clone, Debug)]
pub struct HeuristicEngine {
    tables: PricingTables,
    reference_year: i32,
}

impl Default for HeuristicEngine {
    fn default() -> Self {
        Self::new(PricingTables::default())
    }
}

impl HeuristicEngine {
    /// Engine that measures item age against the current calendar year.
    pub fn new(tables: PricingTables) -> Self {
        Self::with_reference_year(tables, OffsetDateTime::now_utc().year())
    }

    pub fn with_reference_year(tables: PricingTables, reference_year: i32) -> Self {
        Self {
            tables: tables.normalized(),
            reference_year,
        }
    }

    /// Maps metadata to a breakdown whose fields are already rounded, so the
    /// calculator reproduces the same value from the returned breakdown.
    pub fn infer(&self, metadata: &ItemMetadata) -> Breakdown {
        let breakdown = Breakdown {
            base_price: round2(self.base_price(
                metadata.title.as_deref(),
                metadata.description.as_deref(),
            )),
            age_factor: round2(self.age_factor(metadata.year.as_ref())),
            condition_factor: round2(self.condition_factor(metadata.condition.as_deref())),
            brand_factor: round2(self.brand_factor(metadata.brand.as_deref())),
            accessory_value: round2(self.accessory_value(metadata.accessories.as_deref())),
        };
        debug!(?breakdown, "inferred breakdown");
        breakdown
    }

    /// Full local valuation: inference, calculation, confidence and text.
    pub fn valuate(&self, metadata: &ItemMetadata) -> Valuation {
        let breakdown = self.infer(metadata);
        let value = round2(compute_value(&breakdown).value);
        let title = metadata.title.as_deref().unwrap_or("Item");

        Valuation {
            value,
            confidence: confidence::score(metadata),
            breakdown,
            explanation: format!(
                "{title} estimated at ${value}. Base ${} adjusted by age({}), condition({}), brand({}), accessories +${}.",
                breakdown.base_price,
                breakdown.age_factor,
                breakdown.condition_factor,
                breakdown.brand_factor,
                breakdown.accessory_value,
            ),
        }
    }

    pub fn base_price(&self, title: Option<&str>, description: Option<&str>) -> f64 {
        let text = format!("{} {}", title.unwrap_or(""), description.unwrap_or("")).to_lowercase();
        self.tables
            .categories
            .iter()
            .find(|rule| rule.keywords.iter().any(|keyword| text.contains(keyword.as_str())))
            .map(|rule| rule.base_price)
            .unwrap_or(self.tables.default_base_price)
    }

    pub fn age_factor(&self, year: Option<&YearInput>) -> f64 {
        let Some(year) = year.and_then(YearInput::numeric) else {
            return self.tables.unknown_age_factor;
        };
        let age = f64::from(self.reference_year) - year;
        self.tables
            .age_brackets
            .iter()
            .find(|bracket| age <= bracket.max_age_years)
            .map(|bracket| bracket.factor)
            .unwrap_or(self.tables.oldest_age_factor)
    }

    pub fn condition_factor(&self, condition: Option<&str>) -> f64 {
        let Some(condition) = condition else {
            return self.tables.unknown_condition_factor;
        };
        let condition = condition.to_lowercase();
        self.tables
            .conditions
            .iter()
            .find(|rule| rule.labels.iter().any(|label| *label == condition))
            .map(|rule| rule.factor)
            .unwrap_or(self.tables.unknown_condition_factor)
    }

    pub fn brand_factor(&self, brand: Option<&str>) -> f64 {
        let brands = &self.tables.brands;
        let Some(brand) = brand else {
            return brands.neutral_factor;
        };
        let brand = brand.to_lowercase();
        if brands.premium.iter().any(|entry| brand.contains(entry.as_str())) {
            brands.premium_factor
        } else if brands.discount.iter().any(|entry| brand.contains(entry.as_str())) {
            brands.discount_factor
        } else {
            brands.neutral_factor
        }
    }

    pub fn accessory_value(&self, accessories: Option<&[String]>) -> f64 {
        let Some(accessories) = accessories else {
            return 0.0;
        };
        let total: f64 = accessories
            .iter()
            .map(|accessory| {
                let accessory = accessory.to_lowercase();
                self.tables
                    .accessories
                    .iter()
                    .find(|rule| {
                        rule.keywords
                            .iter()
                            .any(|keyword| accessory.contains(keyword.as_str()))
                    })
                    .map(|rule| rule.value)
                    .unwrap_or(self.tables.unmatched_accessory_value)
            })
            .sum();
        round2(total)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::pricing::{CategoryRule, PricingTables};

    const YEAR: i32 = 2026;

    fn engine() -> HeuristicEngine {
        HeuristicEngine::with_reference_year(PricingTables::default(), YEAR)
    }

    fn metadata(raw: serde_json::Value) -> ItemMetadata {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn textbook_in_good_condition_from_last_year() {
        let engine = engine();
        let item = metadata(json!({
            "title": "Calculus textbook",
            "condition": "good",
            "year": YEAR - 1
        }));
        let breakdown = engine.infer(&item);
        assert_eq!(
            breakdown,
            Breakdown {
                base_price: 100.0,
                age_factor: 0.95,
                condition_factor: 0.85,
                brand_factor: 1.0,
                accessory_value: 0.0,
            }
        );
        assert_eq!(engine.valuate(&item).value, 80.75);
    }

    #[test]
    fn empty_metadata_uses_every_default() {
        let engine = engine();
        let valuation = engine.valuate(&ItemMetadata::default());
        assert_eq!(
            valuation.breakdown,
            Breakdown {
                base_price: 50.0,
                age_factor: 0.8,
                condition_factor: 0.8,
                brand_factor: 1.0,
                accessory_value: 0.0,
            }
        );
        assert_eq!(valuation.value, 32.0);
        assert_eq!(valuation.confidence, 0.7);
        assert!(valuation.explanation.starts_with("Item estimated at $32."));
    }

    #[test]
    fn first_category_in_table_order_wins() {
        let engine = engine();
        // "phone" (row 2) beats "laptop" (row 4) regardless of position in text
        assert_eq!(engine.base_price(Some("Laptop and phone bundle"), None), 350.0);
        assert_eq!(engine.base_price(None, Some("phone case")), 350.0);
        assert_eq!(engine.base_price(Some("Physics notes"), Some("phone")), 100.0);
        assert_eq!(engine.base_price(Some("Garden hose"), None), 50.0);
    }

    #[test]
    fn keyword_match_spans_title_and_description() {
        let engine = engine();
        assert_eq!(engine.base_price(Some("Old"), Some("Graphing CALCULATOR")), 80.0);
    }

    #[test]
    fn age_brackets_are_inclusive_upper_bounds() {
        let engine = engine();
        let factor = |year: f64| engine.age_factor(Some(&YearInput::Numeric(year)));
        assert_eq!(factor(2026.0), 0.95);
        assert_eq!(factor(2025.0), 0.95);
        assert_eq!(factor(2024.0), 0.85);
        assert_eq!(factor(2023.0), 0.85);
        assert_eq!(factor(2020.0), 0.70);
        assert_eq!(factor(2019.0), 0.5);
        assert_eq!(factor(2030.0), 0.95);
        assert_eq!(engine.age_factor(Some(&YearInput::Unparsed("n/a".into()))), 0.8);
        assert_eq!(engine.age_factor(None), 0.8);
    }

    #[test]
    fn condition_vocabulary_is_exact_and_case_insensitive() {
        let engine = engine();
        assert_eq!(engine.condition_factor(Some("NEW")), 1.0);
        assert_eq!(engine.condition_factor(Some("Like New")), 0.95);
        assert_eq!(engine.condition_factor(Some("excellent")), 0.95);
        assert_eq!(engine.condition_factor(Some("good")), 0.85);
        assert_eq!(engine.condition_factor(Some("fair")), 0.70);
        assert_eq!(engine.condition_factor(Some("For Parts")), 0.40);
        assert_eq!(engine.condition_factor(Some("pretty good")), 0.8);
        assert_eq!(engine.condition_factor(None), 0.8);
    }

    #[test]
    fn brand_tiers() {
        let engine = engine();
        assert_eq!(engine.brand_factor(Some("Apple Inc.")), 1.1);
        assert_eq!(engine.brand_factor(Some("Samsung")), 1.1);
        assert_eq!(engine.brand_factor(Some("Generic")), 0.9);
        assert_eq!(engine.brand_factor(Some("no-brand store")), 0.9);
        assert_eq!(engine.brand_factor(Some("Trek")), 1.0);
        assert_eq!(engine.brand_factor(None), 1.0);
    }

    #[test]
    fn accessories_follow_priority_order() {
        let engine = engine();
        let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            engine.accessory_value(Some(list(&["Charger", "Lock", "Unknown Gadget"]).as_slice())),
            30.0
        );
        // "charger case" matches charger before case
        assert_eq!(engine.accessory_value(Some(list(&["Charger case"]).as_slice())), 10.0);
        assert_eq!(
            engine.accessory_value(Some(list(&["User Guide", "Bike rack"]).as_slice())),
            25.0
        );
        assert_eq!(engine.accessory_value(Some(&[] as &[String])), 0.0);
        assert_eq!(engine.accessory_value(None), 0.0);
    }

    #[test]
    fn non_array_accessories_contribute_nothing() {
        let engine = engine();
        let item = metadata(json!({"title": "Bike", "accessories": "lock"}));
        assert_eq!(engine.infer(&item).accessory_value, 0.0);
    }

    #[test]
    fn structured_accessory_entries_count_as_unmatched() {
        let engine = engine();
        let item = metadata(json!({"title": "Phone", "accessories": [{"x": "case"}]}));
        assert_eq!(engine.infer(&item).accessory_value, 5.0);
    }

    #[test]
    fn boolean_title_is_kept_as_text() {
        let engine = engine();
        let valuation = engine.valuate(&metadata(json!({"title": true})));
        // brand, year and description missing; title present
        assert_eq!(valuation.confidence, 0.8);
        assert!(valuation.explanation.starts_with("true estimated at $"));
    }

    #[test]
    fn breakdown_round_trips_through_calculator() {
        let engine = engine();
        let items = [
            json!({}),
            json!({"title": "iPhone 12", "brand": "Apple", "year": 2023, "condition": "Like New",
                   "accessories": ["charger", "case"]}),
            json!({"title": "Hybrid commuter", "description": "bike with rack", "year": "2015",
                   "condition": "fair", "brand": "generic", "accessories": ["rack", "lock", "bell"]}),
            json!({"description": "Desk chair", "year": "unknown", "condition": "poor"}),
        ];
        for raw in items {
            let item = metadata(raw.clone());
            let valuation = engine.valuate(&item);
            assert_eq!(compute_value(&engine.infer(&item)).value, valuation.value, "input {raw}");
        }
    }

    #[test]
    fn inference_is_idempotent() {
        let engine = engine();
        let item = metadata(json!({"title": "MacBook Air", "brand": "Apple", "year": 2021}));
        assert_eq!(engine.valuate(&item), engine.valuate(&item));
    }

    #[test]
    fn injected_tables_replace_builtin_rules() {
        let tables = PricingTables {
            categories: vec![CategoryRule {
                keywords: vec!["Kayak".into()],
                base_price: 900.0,
            }],
            default_base_price: 10.0,
            ..PricingTables::default()
        };
        let engine = HeuristicEngine::with_reference_year(tables, YEAR);
        assert_eq!(engine.base_price(Some("sea kayak"), None), 900.0);
        assert_eq!(engine.base_price(Some("textbook"), None), 10.0);
    }
}
