//! Order schema coercion: untyped JSON value → [`OrderRecord`].
//!
//! Types are checked strictly: a quantity of `"2"` or `2.5` is rejected, not
//! rounded or parsed. The one coercion is `status`, which the model usually
//! writes as a word because the example order it is shown does so.

use crate::error::RecognizeError;
use crate::output::{LineItem, OrderRecord};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct RawOrder {
    customer_name: String,
    order_date: String,
    items: Vec<LineItem>,
    #[serde(deserialize_with = "deserialize_status")]
    status: i64,
}

/// Map a textual status to its numeric code.
///
/// | word | code |
/// |------|------|
/// | pending | 0 |
/// | completed | 1 |
/// | processing | 2 |
/// | shipped | 3 |
/// | cancelled / canceled | 4 |
///
/// Numeric strings such as `"1"` are parsed as-is.
pub fn status_code(word: &str) -> Option<i64> {
    let word = word.trim();
    if let Ok(n) = word.parse::<i64>() {
        return Some(n);
    }
    match word.to_ascii_lowercase().as_str() {
        "pending" => Some(0),
        "completed" => Some(1),
        "processing" => Some(2),
        "shipped" => Some(3),
        "cancelled" | "canceled" => Some(4),
        _ => None,
    }
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("status must be an integer, got {n}"))),
        Value::String(s) => {
            status_code(&s).ok_or_else(|| de::Error::custom(format!("unknown status {s:?}")))
        }
        other => Err(de::Error::custom(format!(
            "status must be an integer or a status word, got {other}"
        ))),
    }
}

/// Validate and convert a normalised model reply into an [`OrderRecord`].
pub fn parse_order(value: Value) -> Result<OrderRecord, RecognizeError> {
    if !value.is_object() {
        return Err(RecognizeError::SchemaValidation {
            detail: format!("expected a JSON object, got {}", kind(&value)),
        });
    }

    let raw: RawOrder =
        serde_json::from_value(value).map_err(|e| RecognizeError::SchemaValidation {
            detail: e.to_string(),
        })?;

    for (i, item) in raw.items.iter().enumerate() {
        if !(0.0..=1.0).contains(&item.match_score) {
            return Err(RecognizeError::SchemaValidation {
                detail: format!(
                    "items[{i}].match_score must be within [0, 1], got {}",
                    item.match_score
                ),
            });
        }
    }

    Ok(OrderRecord {
        customer_name: raw.customer_name,
        order_date: raw.order_date,
        items: raw.items,
        status: raw.status,
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
