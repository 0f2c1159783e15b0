//! Schema checks for incoming item and category bodies.
//!
//! Rules run in a fixed order (`name`, `category`, `quantity`, then unknown keys) and
//! the first violation is reported on its own.

use crate::errors::{AppError, AppResult};
use crate::models::ItemPayload;
use serde_json::{Map, Value};

pub const MIN_NAME_LENGTH: usize = 3;

/// Largest integer a JSON client can represent exactly.
const MAX_SAFE_QUANTITY: f64 = 9_007_199_254_740_991.0;

/// Keys the client may send that carry no meaning for the record body.
const IGNORED_KEYS: &[&str] = &["_id"];

const ITEM_KEYS: &[&str] = &["name", "category", "quantity"];

/// An item body that passed every rule. Only this module can build one, so the
/// service layer never sees unchecked input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedItem(ItemPayload);

impl ValidatedItem {
    pub fn payload(&self) -> &ItemPayload {
        &self.0
    }

    pub fn into_payload(self) -> ItemPayload {
        self.0
    }
}

pub fn validate_item(body: &Value) -> AppResult<ValidatedItem> {
    let object = as_object(body)?;

    let name = required_string(object, "name")?;
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(invalid(format!(
            "\"name\" length must be at least {MIN_NAME_LENGTH} characters long"
        )));
    }
    let category = required_string(object, "category")?;
    let quantity = required_quantity(object)?;
    reject_unknown_keys(object, ITEM_KEYS)?;

    Ok(ValidatedItem(ItemPayload {
        name: name.to_string(),
        quantity,
        category: category.to_string(),
    }))
}

/// Returns the trimmed category name from a `{ "category": ... }` body.
pub fn validate_category(body: &Value) -> AppResult<String> {
    let object = as_object(body)?;
    let name = required_string(object, "category")?;
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(invalid("\"category\" is not allowed to be empty"));
    }
    reject_unknown_keys(object, &["category"])?;
    Ok(trimmed.to_string())
}

fn as_object(body: &Value) -> AppResult<&Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| invalid("\"value\" must be of type object"))
}

fn required_string<'a>(object: &'a Map<String, Value>, key: &str) -> AppResult<&'a str> {
    match object.get(key) {
        None => Err(invalid(format!("\"{key}\" is required"))),
        Some(Value::String(value)) if value.is_empty() => {
            Err(invalid(format!("\"{key}\" is not allowed to be empty")))
        }
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(_) => Err(invalid(format!("\"{key}\" must be a string"))),
    }
}

fn required_quantity(object: &Map<String, Value>) -> AppResult<u64> {
    let raw = match object.get("quantity") {
        None => return Err(invalid("\"quantity\" is required")),
        Some(Value::Number(number)) => {
            if let Some(whole) = number.as_u64() {
                return check_safe(whole as f64).map(|_| whole);
            }
            number.as_f64()
        }
        // Form inputs post numbers as text.
        Some(Value::String(text)) => text.trim().parse::<f64>().ok().filter(|value| value.is_finite()),
        Some(_) => None,
    };

    let Some(value) = raw else {
        return Err(invalid("\"quantity\" must be a number"));
    };
    if value.fract() != 0.0 {
        return Err(invalid("\"quantity\" must be an integer"));
    }
    if value < 0.0 {
        return Err(invalid("\"quantity\" must be greater than or equal to 0"));
    }
    check_safe(value)?;
    Ok(value as u64)
}

fn check_safe(value: f64) -> AppResult<()> {
    if value > MAX_SAFE_QUANTITY {
        return Err(invalid("\"quantity\" must be a safe number"));
    }
    Ok(())
}

fn reject_unknown_keys(object: &Map<String, Value>, allowed: &[&str]) -> AppResult<()> {
    match object
        .keys()
        .find(|key| !allowed.contains(&key.as_str()) && !IGNORED_KEYS.contains(&key.as_str()))
    {
        Some(key) => Err(invalid(format!("\"{key}\" is not allowed"))),
        None => Ok(()),
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}

#[cfg(test)]
mod tests {
    use super::{validate_category, validate_item};
    use crate::errors::AppError;
    use serde_json::json;

    fn message(body: serde_json::Value) -> String {
        match validate_item(&body) {
            Err(AppError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_complete_item_and_numeric_string_quantity() {
        let item = validate_item(&json!({ "name": "Widget", "category": "Tools", "quantity": "5" }))
            .expect("valid item");
        assert_eq!(item.payload().quantity, 5);
        assert_eq!(item.payload().name, "Widget");

        let item = validate_item(&json!({ "name": "Widget", "category": "Tools", "quantity": 0 }))
            .expect("zero is allowed");
        assert_eq!(item.into_payload().quantity, 0);
    }

    #[test]
    fn short_name_is_rejected() {
        assert_eq!(
            message(json!({ "name": "ab", "category": "Tools", "quantity": 1 })),
            "\"name\" length must be at least 3 characters long"
        );
        assert_eq!(
            message(json!({ "name": "", "category": "Tools", "quantity": 1 })),
            "\"name\" is not allowed to be empty"
        );
    }

    #[test]
    fn quantity_must_be_a_non_negative_whole_number() {
        assert_eq!(
            message(json!({ "name": "Widget", "category": "Tools", "quantity": -1 })),
            "\"quantity\" must be greater than or equal to 0"
        );
        assert_eq!(
            message(json!({ "name": "Widget", "category": "Tools", "quantity": 2.5 })),
            "\"quantity\" must be an integer"
        );
        assert_eq!(
            message(json!({ "name": "Widget", "category": "Tools", "quantity": "lots" })),
            "\"quantity\" must be a number"
        );
        assert_eq!(
            message(json!({ "name": "Widget", "category": "Tools", "quantity": "" })),
            "\"quantity\" must be a number"
        );
    }

    #[test]
    fn first_violation_wins() {
        assert_eq!(
            message(json!({ "name": "ab", "quantity": -1 })),
            "\"name\" length must be at least 3 characters long"
        );
        assert_eq!(message(json!({ "name": "Widget", "quantity": 1 })), "\"category\" is required");
        assert_eq!(message(json!([1, 2])), "\"value\" must be of type object");
    }

    #[test]
    fn unknown_keys_are_rejected_but_id_is_ignored() {
        assert!(validate_item(&json!({
            "_id": "abc",
            "name": "Widget",
            "category": "Tools",
            "quantity": 1
        }))
        .is_ok());
        assert_eq!(
            message(json!({ "name": "Widget", "category": "Tools", "quantity": 1, "price": 3 })),
            "\"price\" is not allowed"
        );
    }

    #[test]
    fn category_body_requires_a_name() {
        assert_eq!(validate_category(&json!({ "category": " Tools " })).expect("valid"), "Tools");
        assert!(matches!(
            validate_category(&json!({ "category": "   " })),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(validate_category(&json!({})), Err(AppError::Validation(_))));
    }
}
