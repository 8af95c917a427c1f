//! The set of selectable models and the current selection.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::observability::VALIDATION_ERRORS;
use crate::types::chat_message::describe_value;

/// Model selected before the provider has been asked for its list.
pub const DEFAULT_MODEL: &str = "llama2-70b-4096";

/// Available model identifiers plus the selected one.
///
/// The selection is always a member of the available list, and the list is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRegistry {
    available: Vec<String>,
    selected: usize,
}

impl ModelRegistry {
    /// Creates a registry holding only `model`, which is selected.
    ///
    /// A blank `model` falls back to [`DEFAULT_MODEL`].
    pub fn new(model: &str) -> Self {
        let model = model.trim();
        let model = if model.is_empty() { DEFAULT_MODEL } else { model };
        Self {
            available: vec![model.to_string()],
            selected: 0,
        }
    }

    /// Replaces the available models.
    ///
    /// Order is preserved and later duplicates are dropped. The current
    /// selection survives when it is still listed; otherwise the first model
    /// becomes selected. An empty list leaves the registry unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidModelList`] when any identifier is blank. The
    /// registry is unchanged on error.
    pub fn update_models(&mut self, models: Vec<String>) -> Result<()> {
        if models.is_empty() {
            tracing::warn!("received an empty model list; keeping the current models");
            return Ok(());
        }
        if let Some(position) = models.iter().position(|m| m.trim().is_empty()) {
            VALIDATION_ERRORS.click();
            return Err(Error::invalid_model_list(format!(
                "model identifier at position {position} is empty"
            )));
        }
        let mut available: Vec<String> = Vec::with_capacity(models.len());
        for model in models {
            if !available.contains(&model) {
                available.push(model);
            }
        }
        let current = self.selected();
        self.selected = match available.iter().position(|m| m == current) {
            Some(index) => index,
            None => {
                tracing::info!(
                    previous = %current,
                    selected = %available[0],
                    "selected model no longer available"
                );
                0
            }
        };
        self.available = available;
        Ok(())
    }

    /// Replaces the available models from an untyped payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidModelList`] unless `models` is an array of
    /// non-empty strings.
    pub fn update_models_value(&mut self, models: &Value) -> Result<()> {
        let Some(items) = models.as_array() else {
            VALIDATION_ERRORS.click();
            return Err(Error::invalid_model_list(format!(
                "expected an array, found {}",
                describe_value(models)
            )));
        };
        let models = items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::invalid_model_list(format!(
                        "model identifier at position {position} is a {}",
                        describe_value(item)
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()
            .inspect_err(|_| VALIDATION_ERRORS.click())?;
        self.update_models(models)
    }

    /// Selects `model`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotAvailable`] when `model` is not available.
    /// The selection is unchanged on error.
    pub fn set_selected_model(&mut self, model: &str) -> Result<()> {
        match self.available.iter().position(|m| m == model) {
            Some(index) => {
                self.selected = index;
                tracing::debug!(model, "selected model");
                Ok(())
            }
            None => {
                VALIDATION_ERRORS.click();
                Err(Error::model_not_available(model))
            }
        }
    }

    /// Selects a model named by an untyped payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidModelType`] when `model` is not a string, and
    /// otherwise behaves like [`ModelRegistry::set_selected_model`].
    pub fn set_selected_model_value(&mut self, model: &Value) -> Result<()> {
        match model.as_str() {
            Some(model) => self.set_selected_model(model),
            None => {
                VALIDATION_ERRORS.click();
                Err(Error::invalid_model_type(describe_value(model)))
            }
        }
    }

    /// The available model identifiers, in listing order.
    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// The selected model identifier.
    pub fn selected(&self) -> &str {
        &self.available[self.selected]
    }

    /// Position of the selected model within [`ModelRegistry::available`].
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Returns true when `model` is available.
    pub fn contains(&self, model: &str) -> bool {
        self.available.iter().any(|m| m == model)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn models(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn starts_with_default_model() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.available(), &[DEFAULT_MODEL.to_string()]);
        assert_eq!(registry.selected(), DEFAULT_MODEL);
        assert_eq!(ModelRegistry::new("  ").selected(), DEFAULT_MODEL);
    }

    #[test]
    fn update_keeps_selection_when_listed() {
        let mut registry = ModelRegistry::new("b");
        registry.update_models(models(&["a", "b", "c"])).unwrap();
        assert_eq!(registry.selected(), "b");
        assert_eq!(registry.selected_index(), 1);
    }

    #[test]
    fn update_resets_selection_when_missing() {
        let mut registry = ModelRegistry::new("a");
        registry.update_models(models(&["x", "y"])).unwrap();
        assert_eq!(registry.available(), &models(&["x", "y"])[..]);
        assert_eq!(registry.selected(), "x");
    }

    #[test]
    fn update_drops_duplicates_in_order() {
        let mut registry = ModelRegistry::default();
        registry
            .update_models(models(&["m2", "m1", "m2", "m3", "m1"]))
            .unwrap();
        assert_eq!(registry.available(), &models(&["m2", "m1", "m3"])[..]);
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let mut registry = ModelRegistry::new("a");
        registry.update_models(models(&["a", "b"])).unwrap();
        let before = registry.clone();
        registry.update_models(Vec::new()).unwrap();
        assert_eq!(registry, before);
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        let mut registry = ModelRegistry::new("a");
        let before = registry.clone();
        let err = registry.update_models(models(&["b", ""])).unwrap_err();
        assert!(matches!(err, Error::InvalidModelList { .. }));
        assert_eq!(registry, before);
    }

    #[test]
    fn untyped_updates() {
        let mut registry = ModelRegistry::default();
        for value in [json!("a"), json!({"data": []}), json!(["a", 3]), json!([null])] {
            let err = registry.update_models_value(&value).unwrap_err();
            assert!(matches!(err, Error::InvalidModelList { .. }), "{value}");
        }
        assert_eq!(registry.selected(), DEFAULT_MODEL);
        registry.update_models_value(&json!(["p", "q"])).unwrap();
        assert_eq!(registry.available(), &models(&["p", "q"])[..]);
    }

    #[test]
    fn selection_must_be_available() {
        let mut registry = ModelRegistry::new("a");
        registry.update_models(models(&["a", "b"])).unwrap();
        registry.set_selected_model("b").unwrap();
        assert_eq!(registry.selected(), "b");

        let err = registry.set_selected_model("z").unwrap_err();
        assert!(matches!(&err, Error::ModelNotAvailable { model } if model == "z"));
        assert_eq!(err.to_string(), "Model z not in available models");
        assert_eq!(registry.selected(), "b");
        assert!(registry.contains("a"));
        assert!(!registry.contains("z"));
    }

    #[test]
    fn untyped_selection() {
        let mut registry = ModelRegistry::new("a");
        registry.update_models(models(&["a", "b"])).unwrap();
        let err = registry.set_selected_model_value(&json!(7)).unwrap_err();
        assert!(matches!(err, Error::InvalidModelType { .. }));
        assert_eq!(registry.selected(), "a");
        registry.set_selected_model_value(&json!("b")).unwrap();
        assert_eq!(registry.selected(), "b");
    }
}
