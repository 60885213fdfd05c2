use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::util::coerce::number_or;

/// Item description supplied by a caller who wants a valuation.
///
/// Deserialization never fails on a wrong-typed field: unusable values are
/// read as absent so that every inference rule can fall back to its default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    #[serde(default, deserialize_with = "truthy_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "truthy_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "lenient_year", skip_serializing_if = "Option::is_none")]
    pub year: Option<YearInput>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Option::is_none")]
    pub accessories: Option<Vec<String>>,
    /// Only consumed by the collaborator prompt.
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub product_link: Option<String>,
}

impl ItemMetadata {
    /// `true` when at least one of title or description is usable.
    pub fn has_text(&self) -> bool {
        self.title.is_some() || self.description.is_some()
    }
}

/// A supplied `year` field. Present-but-garbled years still count as supplied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearInput {
    Numeric(f64),
    Unparsed(String),
}

impl YearInput {
    pub fn numeric(&self) -> Option<f64> {
        match self {
            YearInput::Numeric(year) => Some(*year),
            YearInput::Unparsed(_) => None,
        }
    }
}

/// The five-factor decomposition of an item's value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Breakdown {
    pub base_price: f64,
    pub age_factor: f64,
    pub condition_factor: f64,
    pub brand_factor: f64,
    pub accessory_value: f64,
}

impl Default for Breakdown {
    /// Identity breakdown: contributes nothing and scales nothing.
    fn default() -> Self {
        Self {
            base_price: 0.0,
            age_factor: 1.0,
            condition_factor: 1.0,
            brand_factor: 1.0,
            accessory_value: 0.0,
        }
    }
}

impl Breakdown {
    /// Reads an untrusted breakdown object field by field, substituting the
    /// identity default for anything missing or unusable.
    pub fn from_json(value: &Value) -> Self {
        let identity = Self::default();
        Self {
            base_price: number_or(value.get("basePrice"), identity.base_price),
            age_factor: number_or(value.get("ageFactor"), identity.age_factor),
            condition_factor: number_or(value.get("conditionFactor"), identity.condition_factor),
            brand_factor: number_or(value.get("brandFactor"), identity.brand_factor),
            accessory_value: number_or(value.get("accessoryValue"), identity.accessory_value),
        }
    }
}

/// Final answer of the valuation path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub value: f64,
    pub confidence: f64,
    pub breakdown: Breakdown,
    pub explanation: String,
}

/// One side of a proposed trade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferSide {
    pub value: f64,
}

/// Two sides of a trade plus the cash the proposer adds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeProposal {
    pub offer: OfferSide,
    pub request: OfferSide,
    pub proposer_cash: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessResult {
    /// Ratio capped to `[0, 1]`.
    pub fairness_score: f64,
    /// Cash needed on top of the offered item to match the request.
    pub suggested_cash: f64,
    /// Uncapped ratio; above 1 means the proposer overpays.
    pub fairness_ratio: f64,
}

/// Fairness result in the shape returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessReport {
    pub fairness_score: f64,
    pub suggested_cash: f64,
    pub fairness_ratio: f64,
    pub explanation: String,
    pub offer_val: f64,
    pub request_val: f64,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) if !text.is_empty() => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Free text fields: any truthy value counts as present and is rendered as text.
fn truthy_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .filter(is_truthy)
        .map(display_text))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::Number(number) => number.as_f64() != Some(0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) | Value::Bool(true) => true,
    }
}

/// Renders a JSON value the way string concatenation would in a script:
/// arrays join their entries with commas, objects become an opaque marker.
fn display_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Array(entries) => entries
            .into_iter()
            .map(|entry| match entry {
                Value::Null => String::new(),
                other => display_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
        other => other.to_string(),
    }
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<YearInput>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(year_from_value))
}

fn year_from_value(value: Value) -> Option<YearInput> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(number) => number
            .as_f64()
            .filter(|year| *year != 0.0)
            .map(YearInput::Numeric),
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => match text.trim().parse::<f64>() {
            Ok(year) if year.is_finite() => Some(YearInput::Numeric(year)),
            _ => Some(YearInput::Unparsed(text)),
        },
        other => Some(YearInput::Unparsed(other.to_string())),
    }
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(entries)) => Some(entries.into_iter().map(display_text).collect()),
        _ => None,
    })
}
