//! Breakdown calculator: turns the five factors into a monetary value.

use serde::{Deserialize, Serialize};

use super::entities::Breakdown;
use crate::util::rounding::round2;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntermediateSteps {
    /// `basePrice * ageFactor`
    pub step1: f64,
    /// `step1 * conditionFactor`
    pub step2: f64,
    /// `step2 * brandFactor`
    pub step3: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueComputation {
    pub value: f64,
    pub intermediate_steps: IntermediateSteps,
}

/// Computes `round2(basePrice * ageFactor * conditionFactor * brandFactor + accessoryValue)`.
///
/// The multiplication order is fixed so results are reproducible to the cent.
/// Non-finite or zero fields are replaced by their identity default first.
pub fn compute_value(breakdown: &Breakdown) -> ValueComputation {
    let identity = Breakdown::default();
    let base_price = usable(breakdown.base_price, identity.base_price);
    let age_factor = usable(breakdown.age_factor, identity.age_factor);
    let condition_factor = usable(breakdown.condition_factor, identity.condition_factor);
    let brand_factor = usable(breakdown.brand_factor, identity.brand_factor);
    let accessory_value = usable(breakdown.accessory_value, identity.accessory_value);

    let step1 = base_price * age_factor;
    let step2 = step1 * condition_factor;
    let step3 = step2 * brand_factor;
    let value = round2(step3 + accessory_value);

    ValueComputation {
        value,
        intermediate_steps: IntermediateSteps {
            step1: round2(step1),
            step2: round2(step2),
            step3: round2(step3),
        },
    }
}

fn usable(field: f64, default: f64) -> f64 {
    if field.is_finite() && field != 0.0 {
        field
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn multiplies_in_order_then_adds_accessories() {
        let computation = compute_value(&Breakdown {
            base_price: 100.0,
            age_factor: 0.95,
            condition_factor: 0.85,
            brand_factor: 1.0,
            accessory_value: 0.0,
        });
        assert_eq!(computation.value, 80.75);
        assert_eq!(computation.intermediate_steps.step1, 95.0);
        assert_eq!(computation.intermediate_steps.step2, 80.75);
        assert_eq!(computation.intermediate_steps.step3, 80.75);
    }

    #[test]
    fn degenerates_to_accessory_value_without_base_price() {
        let computation = compute_value(&Breakdown {
            base_price: 0.0,
            accessory_value: 27.0,
            ..Breakdown::default()
        });
        assert_eq!(computation.value, 27.0);
    }

    #[test]
    fn missing_fields_never_fail() {
        for raw in [
            json!({}),
            json!({"basePrice": 120}),
            json!({"ageFactor": 0.5, "accessoryValue": "7"}),
            json!({"basePrice": "abc", "conditionFactor": null, "brandFactor": {}}),
            json!(null),
        ] {
            let computation = compute_value(&Breakdown::from_json(&raw));
            assert!(computation.value.is_finite(), "input {raw}");
        }
        assert_eq!(compute_value(&Breakdown::from_json(&json!({"basePrice": 120}))).value, 120.0);
    }

    #[test]
    fn non_finite_fields_use_identity() {
        let computation = compute_value(&Breakdown {
            base_price: 50.0,
            age_factor: f64::NAN,
            condition_factor: f64::INFINITY,
            brand_factor: 0.0,
            accessory_value: f64::NEG_INFINITY,
        });
        assert_eq!(computation.value, 50.0);
    }
}
