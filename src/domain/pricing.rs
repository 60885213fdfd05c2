//! Lookup tables that drive the heuristic engine.
//!
//! Tables are plain data: the engine receives them at construction, so a
//! deployment can ship its own JSON file and tests can swap in tiny tables
//! without touching inference logic. Order is significant everywhere a rule
//! list is scanned; the first matching rule wins.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRule {
    pub keywords: Vec<String>,
    pub base_price: f64,
}

/// Applies to items whose age in years is at most `max_age_years`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBracket {
    pub max_age_years: f64,
    pub factor: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub labels: Vec<String>,
    pub factor: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandTiers {
    pub premium: Vec<String>,
    pub discount: Vec<String>,
    pub premium_factor: f64,
    pub discount_factor: f64,
    pub neutral_factor: f64,
}

impl Default for BrandTiers {
    fn default() -> Self {
        Self {
            premium: words(&["apple", "nike", "sony", "dell", "lenovo", "samsung"]),
            discount: words(&["no-brand", "generic"]),
            premium_factor: 1.1,
            discount_factor: 0.9,
            neutral_factor: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessoryRule {
    pub keywords: Vec<String>,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingTables {
    pub categories: Vec<CategoryRule>,
    pub default_base_price: f64,
    pub age_brackets: Vec<AgeBracket>,
    /// Factor for items older than every bracket.
    pub oldest_age_factor: f64,
    pub unknown_age_factor: f64,
    pub conditions: Vec<ConditionRule>,
    pub unknown_condition_factor: f64,
    pub brands: BrandTiers,
    pub accessories: Vec<AccessoryRule>,
    pub unmatched_accessory_value: f64,
}

impl Default for PricingTables {
    fn default() -> Self {
        Self {
            categories: vec![
                category(&["textbook", "algorithms", "calculus", "physics", "chemistry"], 100.0),
                category(&["phone", "iphone", "samsung", "pixel", "smartphone"], 350.0),
                category(&["bike", "bicycle", "commuter", "hybrid"], 400.0),
                category(&["laptop", "macbook", "notebook"], 700.0),
                category(&["calculator", "ti-84", "graphing"], 80.0),
                category(&["desk", "chair", "furniture"], 150.0),
                category(&["clothes", "jacket", "coat", "sneakers"], 60.0),
            ],
            default_base_price: 50.0,
            age_brackets: vec![
                AgeBracket {
                    max_age_years: 1.0,
                    factor: 0.95,
                },
                AgeBracket {
                    max_age_years: 3.0,
                    factor: 0.85,
                },
                AgeBracket {
                    max_age_years: 6.0,
                    factor: 0.70,
                },
            ],
            oldest_age_factor: 0.5,
            unknown_age_factor: 0.8,
            conditions: vec![
                condition(&["new"], 1.0),
                condition(&["like new", "excellent"], 0.95),
                condition(&["good"], 0.85),
                condition(&["fair"], 0.70),
                condition(&["poor", "for parts"], 0.40),
            ],
            unknown_condition_factor: 0.8,
            brands: BrandTiers::default(),
            accessories: vec![
                accessory(&["charger"], 10.0),
                accessory(&["manual", "guide"], 5.0),
                accessory(&["lock"], 15.0),
                accessory(&["case"], 12.0),
                accessory(&["rack"], 20.0),
            ],
            unmatched_accessory_value: 5.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TablesError {
    #[error("{table} rule #{index} has no usable keyword")]
    EmptyKeywords { table: &'static str, index: usize },
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidNumber { field: String, value: f64 },
    #[error("age brackets must be listed in ascending order of max age")]
    UnorderedAgeBrackets,
    #[error("brand '{premium}' (premium) overlaps '{discount}' (discount)")]
    OverlappingBrands { premium: String, discount: String },
}

impl PricingTables {
    /// Lower-cases every keyword, label and brand so matching can compare
    /// against lower-cased input directly.
    pub fn normalized(mut self) -> Self {
        let lower = |list: &mut Vec<String>| {
            for entry in list.iter_mut() {
                *entry = entry.to_lowercase();
            }
        };
        self.categories.iter_mut().for_each(|rule| lower(&mut rule.keywords));
        self.conditions.iter_mut().for_each(|rule| lower(&mut rule.labels));
        self.accessories.iter_mut().for_each(|rule| lower(&mut rule.keywords));
        lower(&mut self.brands.premium);
        lower(&mut self.brands.discount);
        self
    }

    pub fn validate(&self) -> Result<(), TablesError> {
        for (index, rule) in self.categories.iter().enumerate() {
            require_keywords("categories", index, &rule.keywords)?;
            require_amount(format!("categories[{index}].basePrice"), rule.base_price)?;
        }
        for (index, rule) in self.conditions.iter().enumerate() {
            require_keywords("conditions", index, &rule.labels)?;
            require_amount(format!("conditions[{index}].factor"), rule.factor)?;
        }
        for (index, rule) in self.accessories.iter().enumerate() {
            require_keywords("accessories", index, &rule.keywords)?;
            require_amount(format!("accessories[{index}].value"), rule.value)?;
        }

        let mut previous_max = f64::NEG_INFINITY;
        for (index, bracket) in self.age_brackets.iter().enumerate() {
            require_amount(format!("ageBrackets[{index}].factor"), bracket.factor)?;
            if !bracket.max_age_years.is_finite() || bracket.max_age_years <= previous_max {
                return Err(TablesError::UnorderedAgeBrackets);
            }
            previous_max = bracket.max_age_years;
        }

        for (field, value) in [
            ("defaultBasePrice", self.default_base_price),
            ("oldestAgeFactor", self.oldest_age_factor),
            ("unknownAgeFactor", self.unknown_age_factor),
            ("unknownConditionFactor", self.unknown_condition_factor),
            ("brands.premiumFactor", self.brands.premium_factor),
            ("brands.discountFactor", self.brands.discount_factor),
            ("brands.neutralFactor", self.brands.neutral_factor),
            ("unmatchedAccessoryValue", self.unmatched_accessory_value),
        ] {
            require_amount(field.to_string(), value)?;
        }

        // A brand string containing both a premium and a discount entry would
        // be ambiguous, so neither list may contain an entry of the other.
        for premium in &self.brands.premium {
            for discount in &self.brands.discount {
                let (p, d) = (premium.to_lowercase(), discount.to_lowercase());
                if p.contains(&d) || d.contains(&p) {
                    return Err(TablesError::OverlappingBrands {
                        premium: premium.clone(),
                        discount: discount.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn require_keywords(
    table: &'static str,
    index: usize,
    keywords: &[String],
) -> Result<(), TablesError> {
    if keywords.is_empty() || keywords.iter().any(|keyword| keyword.trim().is_empty()) {
        return Err(TablesError::EmptyKeywords { table, index });
    }
    Ok(())
}

fn require_amount(field: String, value: f64) -> Result<(), TablesError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TablesError::InvalidNumber { field, value })
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|word| word.to_string()).collect()
}

fn category(keywords: &[&str], base_price: f64) -> CategoryRule {
    CategoryRule {
        keywords: words(keywords),
        base_price,
    }
}

fn condition(labels: &[&str], factor: f64) -> ConditionRule {
    ConditionRule {
        labels: words(labels),
        factor,
    }
}

fn accessory(keywords: &[&str], value: f64) -> AccessoryRule {
    AccessoryRule {
        keywords: words(keywords),
        value,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builtin_tables_are_valid() {
        assert_eq!(PricingTables::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_overrides_only_given_keys() {
        let tables: PricingTables = serde_json::from_value(json!({
            "defaultBasePrice": 25,
            "brands": { "premium": ["Patagonia"] }
        }))
        .unwrap();
        assert_eq!(tables.default_base_price, 25.0);
        assert_eq!(tables.brands.premium, vec!["Patagonia".to_string()]);
        assert_eq!(tables.brands.discount, BrandTiers::default().discount);
        assert_eq!(tables.categories, PricingTables::default().categories);
    }

    #[test]
    fn normalized_lowercases_every_matchable_entry() {
        let mut tables = PricingTables::default();
        tables.categories[0].keywords.push("LEGO".into());
        tables.brands.premium.push("Patagonia".into());
        let tables = tables.normalized();
        assert!(tables.categories[0].keywords.contains(&"lego".to_string()));
        assert!(tables.brands.premium.contains(&"patagonia".to_string()));
    }

    #[test]
    fn rejects_overlapping_brand_lists() {
        let mut tables = PricingTables::default();
        tables.brands.discount.push("Apple Generic".into());
        assert!(matches!(
            tables.validate(),
            Err(TablesError::OverlappingBrands { .. })
        ));
    }

    #[test]
    fn rejects_blank_keywords_and_bad_numbers() {
        let mut tables = PricingTables::default();
        tables.accessories[1].keywords.push("  ".into());
        assert_eq!(
            tables.validate(),
            Err(TablesError::EmptyKeywords { table: "accessories", index: 1 })
        );

        let mut tables = PricingTables::default();
        tables.categories[2].base_price = -1.0;
        assert!(matches!(tables.validate(), Err(TablesError::InvalidNumber { .. })));
    }

    #[test]
    fn rejects_unordered_age_brackets() {
        let mut tables = PricingTables::default();
        tables.age_brackets.swap(0, 2);
        assert_eq!(tables.validate(), Err(TablesError::UnorderedAgeBrackets));
    }
}
