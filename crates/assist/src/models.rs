//! Registry of chat model endpoints.
//!
//! API keys are obfuscated on disk (XOR with a fixed key, then base64). This
//! only keeps keys from being readable at a glance in the JSON file; it is
//! not encryption.
use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

const OBFUSCATION_KEY: &[u8] = b"shaderchat_secure_key_2026";

#[derive(Debug, thiserror::Error)]
pub enum ModelStoreError {
    #[error("model name must not be empty")]
    EmptyName,
    #[error("model '{0}' is missing an address")]
    MissingAddress(String),
    #[error("a model named '{0}' already exists")]
    Duplicate(String),
    #[error("no model with id '{0}'")]
    UnknownId(String),
    #[error("no model named '{0}'")]
    UnknownName(String),
    #[error("failed to access model store: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode model store: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub id: String,
    pub name: String,
    pub address: String,
    pub model: String,
    pub api_key: String,
}

impl ModelConfig {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            address: address.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Key with everything but the last four characters masked.
    pub fn masked_key(&self) -> String {
        let visible: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let hidden = self.api_key.chars().count().saturating_sub(4);
        format!("{}{}", "*".repeat(hidden), visible)
    }
}

fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    format!("{:016x}", rng.gen::<u64>())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredModel {
    id: String,
    name: String,
    address: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredModels {
    #[serde(default)]
    models: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelStore {
    models: Vec<ModelConfig>,
    selected: Option<String>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store, treating a missing file as empty. Malformed entries
    /// are skipped rather than failing the whole file. Without a valid stored
    /// selection the first model is selected.
    pub fn load(path: &Path) -> Result<Self, ModelStoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelStoreError> {
        let stored: StoredModels = serde_json::from_str(raw)?;
        let mut models = Vec::with_capacity(stored.models.len());
        for entry in stored.models {
            match serde_json::from_value::<StoredModel>(entry) {
                Ok(model) => {
                    let api_key = reveal(&model.api_key).unwrap_or_else(|| {
                        warn!(model = %model.name, "could not decode stored API key");
                        String::new()
                    });
                    models.push(ModelConfig {
                        id: model.id,
                        name: model.name,
                        address: model.address,
                        model: model.model,
                        api_key,
                    });
                }
                Err(err) => warn!(error = %err, "skipping malformed model entry"),
            }
        }
        let selected = stored
            .selected
            .filter(|name| models.iter().any(|model| &model.name == name))
            .or_else(|| models.first().map(|model| model.name.clone()));
        Ok(Self { models, selected })
    }

    pub fn to_json(&self) -> Result<String, ModelStoreError> {
        let models = self
            .models
            .iter()
            .map(|model| {
                serde_json::to_value(StoredModel {
                    id: model.id.clone(),
                    name: model.name.clone(),
                    address: model.address.clone(),
                    model: model.model.clone(),
                    api_key: obfuscate(&model.api_key),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let stored = StoredModels {
            models,
            selected: self.selected.clone(),
        };
        Ok(serde_json::to_string_pretty(&stored)?)
    }

    pub fn persist(&self, path: &Path) -> Result<(), ModelStoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    pub fn get(&self, id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|model| model.id == id)
    }

    /// Adds a model and makes it the selected one.
    pub fn add(&mut self, model: ModelConfig) -> Result<&ModelConfig, ModelStoreError> {
        validate(&model)?;
        if self.models.iter().any(|existing| existing.name == model.name) {
            return Err(ModelStoreError::Duplicate(model.name));
        }
        self.selected = Some(model.name.clone());
        self.models.push(model);
        Ok(&self.models[self.models.len() - 1])
    }

    /// Replaces the model with the same id. Renaming the selected model keeps
    /// it selected.
    pub fn update(&mut self, model: ModelConfig) -> Result<(), ModelStoreError> {
        validate(&model)?;
        if self
            .models
            .iter()
            .any(|existing| existing.name == model.name && existing.id != model.id)
        {
            return Err(ModelStoreError::Duplicate(model.name));
        }
        let slot = self
            .models
            .iter_mut()
            .find(|existing| existing.id == model.id)
            .ok_or_else(|| ModelStoreError::UnknownId(model.id.clone()))?;
        if self.selected.as_deref() == Some(slot.name.as_str()) {
            self.selected = Some(model.name.clone());
        }
        *slot = model;
        Ok(())
    }

    /// Removes a model by id. If it was selected, the first remaining model
    /// becomes selected (or nothing, when the store is now empty).
    pub fn remove(&mut self, id: &str) -> Result<ModelConfig, ModelStoreError> {
        let index = self
            .models
            .iter()
            .position(|model| model.id == id)
            .ok_or_else(|| ModelStoreError::UnknownId(id.to_string()))?;
        let removed = self.models.remove(index);
        if self.selected.as_deref() == Some(removed.name.as_str()) {
            self.selected = self.models.first().map(|model| model.name.clone());
        }
        Ok(removed)
    }

    pub fn select(&mut self, name: &str) -> Result<(), ModelStoreError> {
        if !self.models.iter().any(|model| model.name == name) {
            return Err(ModelStoreError::UnknownName(name.to_string()));
        }
        self.selected = Some(name.to_string());
        Ok(())
    }

    pub fn selected(&self) -> Option<&ModelConfig> {
        let name = self.selected.as_deref()?;
        self.models.iter().find(|model| model.name == name)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|model| model.name == name)
    }
}

fn validate(model: &ModelConfig) -> Result<(), ModelStoreError> {
    if model.name.trim().is_empty() {
        return Err(ModelStoreError::EmptyName);
    }
    if model.address.trim().is_empty() {
        return Err(ModelStoreError::MissingAddress(model.name.clone()));
    }
    Ok(())
}

fn xor(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .zip(OBFUSCATION_KEY.iter().cycle())
        .map(|(byte, key)| byte ^ key)
        .collect()
}

pub fn obfuscate(plain: &str) -> String {
    STANDARD.encode(xor(plain.as_bytes()))
}

pub fn reveal(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(xor(&bytes)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn model(name: &str) -> ModelConfig {
        ModelConfig::new(name, "https://api.example.com", "gpt-4o-mini", "sk-secret-1234")
    }

    #[test]
    fn adding_selects_the_new_model() {
        let mut store = ModelStore::new();
        store.add(model("first")).unwrap();
        store.add(model("second")).unwrap();
        assert_eq!(store.selected().map(|m| m.name.as_str()), Some("second"));
    }

    #[test]
    fn rejects_duplicate_and_blank_names() {
        let mut store = ModelStore::new();
        store.add(model("first")).unwrap();
        assert!(matches!(
            store.add(model("first")),
            Err(ModelStoreError::Duplicate(_))
        ));
        assert!(matches!(
            store.add(model("  ")),
            Err(ModelStoreError::EmptyName)
        ));
    }

    #[test]
    fn removing_selected_model_falls_back_to_first() {
        let mut store = ModelStore::new();
        let a = store.add(model("a")).unwrap().id.clone();
        store.add(model("b")).unwrap();
        let c = store.add(model("c")).unwrap().id.clone();

        store.remove(&c).unwrap();
        assert_eq!(store.selected().map(|m| m.name.as_str()), Some("a"));

        store.remove(&a).unwrap();
        assert_eq!(store.selected().map(|m| m.name.as_str()), Some("b"));
    }

    #[test]
    fn removing_last_model_clears_selection() {
        let mut store = ModelStore::new();
        let id = store.add(model("only")).unwrap().id.clone();
        store.remove(&id).unwrap();
        assert!(store.selected().is_none());
        assert!(matches!(
            store.remove(&id),
            Err(ModelStoreError::UnknownId(_))
        ));
    }

    #[test]
    fn removing_unselected_model_keeps_selection() {
        let mut store = ModelStore::new();
        let a = store.add(model("a")).unwrap().id.clone();
        store.add(model("b")).unwrap();
        store.remove(&a).unwrap();
        assert_eq!(store.selected().map(|m| m.name.as_str()), Some("b"));
    }

    #[test]
    fn renaming_selected_model_keeps_it_selected() {
        let mut store = ModelStore::new();
        let mut renamed = store.add(model("old")).unwrap().clone();
        renamed.name = "new".into();
        store.update(renamed).unwrap();
        assert_eq!(store.selected().map(|m| m.name.as_str()), Some("new"));
    }

    #[test]
    fn select_requires_known_name() {
        let mut store = ModelStore::new();
        store.add(model("a")).unwrap();
        store.add(model("b")).unwrap();
        store.select("a").unwrap();
        assert_eq!(store.selected().map(|m| m.name.as_str()), Some("a"));
        assert!(matches!(
            store.select("zzz"),
            Err(ModelStoreError::UnknownName(_))
        ));
    }

    #[test]
    fn keys_are_obfuscated_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models.json");
        let mut store = ModelStore::new();
        store.add(model("remote")).unwrap();
        store.persist(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("sk-secret-1234"));

        let loaded = ModelStore::load(&path).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.models().is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let good = obfuscate("key");
        let raw = format!(
            r#"{{"models":[
                {{"id":"1","name":"ok","address":"http://localhost:8080","model":"m","apiKey":"{good}"}},
                {{"id":"2","name":"no-address"}},
                {{"id":"3","name":"bad-key","address":"http://x","model":"m","apiKey":"%%%"}}
            ],"selected":"no-address"}}"#
        );
        let store = ModelStore::from_json(&raw).unwrap();
        let names: Vec<_> = store.models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["ok", "bad-key"]);
        assert_eq!(store.models()[0].api_key, "key");
        assert_eq!(store.models()[1].api_key, "");
        assert_eq!(store.selected().map(|m| m.name.as_str()), Some("ok"));
    }

    #[test]
    fn loading_without_selection_picks_first_model() {
        let mut store = ModelStore::new();
        store.add(model("a")).unwrap();
        store.add(model("b")).unwrap();
        let raw = store.to_json().unwrap().replace(r#""selected": "b""#, r#""selected": null"#);
        let loaded = ModelStore::from_json(&raw).unwrap();
        assert_eq!(loaded.selected().map(|m| m.name.as_str()), Some("a"));

        let empty = ModelStore::from_json(r#"{"models":[]}"#).unwrap();
        assert!(empty.selected().is_none());
    }

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(model("m").masked_key(), "**********1234");
        let mut short = model("m");
        short.api_key = "ab".into();
        assert_eq!(short.masked_key(), "ab");
    }
}
