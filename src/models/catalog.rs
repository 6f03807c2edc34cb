//! Model catalog cache
//!
//! Holds the last model list fetched from the backend. The whole list is
//! replaced on every refresh; entries are never patched in place.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity and static metadata for a model known to the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    #[serde(alias = "name")]
    pub id: String,
    pub display_name: String,
    pub size_mb: u64,
    pub downloaded: bool,
}

impl ModelDescriptor {
    pub fn new(id: &str, display_name: &str, size_mb: u64, downloaded: bool) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            size_mb,
            downloaded,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, ModelDescriptor>,
    /// Number of successful refreshes, used to tell "never fetched" from "empty"
    generation: u64,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached list wholesale
    pub fn replace(&mut self, models: Vec<ModelDescriptor>) {
        let mut next = HashMap::with_capacity(models.len());
        for model in models {
            if next.contains_key(&model.id) {
                log::warn!("[ModelCatalog] Duplicate model id '{}' in catalog, keeping last", model.id);
            }
            next.insert(model.id.clone(), model);
        }
        self.models = next;
        self.generation += 1;

        log::debug!(
            "[ModelCatalog] Catalog refreshed: {} models, {} downloaded",
            self.models.len(),
            self.models.values().filter(|m| m.downloaded).count()
        );
    }

    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.get(model_id)
    }

    /// Display name for a model id, if the catalog knows it
    pub fn display_name(&self, model_id: &str) -> Option<&str> {
        self.models.get(model_id).map(|m| m.display_name.as_str())
    }

    /// Display name, falling back to the raw id for unknown models
    pub fn display_name_or_id<'a>(&'a self, model_id: &'a str) -> &'a str {
        self.display_name(model_id).unwrap_or(model_id)
    }

    /// Check if any models are downloaded (no cloning)
    pub fn has_downloaded_models(&self) -> bool {
        self.models.values().any(|m| m.downloaded)
    }

    pub fn is_downloaded(&self, model_id: &str) -> bool {
        self.models.get(model_id).map(|m| m.downloaded).unwrap_or(false)
    }

    /// Ids of downloaded models, smallest first
    pub fn downloaded_model_ids(&self) -> Vec<String> {
        self.models_by_size()
            .into_iter()
            .filter(|m| m.downloaded)
            .map(|m| m.id.clone())
            .collect()
    }

    /// Models ordered by size (smallest to largest), ties broken by id
    pub fn models_by_size(&self) -> Vec<&ModelDescriptor> {
        let mut models: Vec<&ModelDescriptor> = self.models.values().collect();
        models.sort_by(|a, b| a.size_mb.cmp(&b.size_mb).then_with(|| a.id.cmp(&b.id)));
        models
    }
}
