use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::chat_message::describe_value;

/// Extracts model identifiers from a `GET /models` response.
///
/// The response has the shape `{"object": "list", "data": [{"id": ...}, ...]}`.
/// Identifiers are returned in listing order.
///
/// # Errors
///
/// Returns [`Error::InvalidModelList`] when `data` is missing or not an
/// array, or when any entry lacks a non-empty string `id`.
pub fn model_ids_from_value(response: &Value) -> Result<Vec<String>> {
    let data = response
        .get("data")
        .ok_or_else(|| Error::invalid_model_list("response has no data field"))?;
    let entries = data.as_array().ok_or_else(|| {
        Error::invalid_model_list(format!("expected an array, found {}", describe_value(data)))
    })?;
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
            Some(other) => Err(Error::invalid_model_list(format!(
                "entry {index} has a {} id",
                describe_value(other)
            ))),
            None => Err(Error::invalid_model_list(format!("entry {index} has no id"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_in_listing_order() {
        let response = json!({
            "object": "list",
            "data": [
                {"id": "llama-3.3-70b-versatile", "object": "model", "owned_by": "Meta"},
                {"id": "gemma2-9b-it", "object": "model", "owned_by": "Google"}
            ]
        });
        assert_eq!(
            model_ids_from_value(&response).unwrap(),
            vec!["llama-3.3-70b-versatile", "gemma2-9b-it"]
        );
    }

    #[test]
    fn rejects_malformed_listings() {
        for response in [
            json!({}),
            json!({"data": "nope"}),
            json!({"data": [{"id": 7}]}),
            json!({"data": [{"id": ""}]}),
            json!({"data": [{"name": "x"}]}),
        ] {
            assert!(
                matches!(
                    model_ids_from_value(&response),
                    Err(Error::InvalidModelList { .. })
                ),
                "{response}"
            );
        }
    }
}
