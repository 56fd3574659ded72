//! Layer descriptors and the layer catalog.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stable identifier of a logical layer (e.g. "urban").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerKey(pub String);

impl LayerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A logical layer and the remote feature type that backs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Unique layer key
    pub key: LayerKey,

    /// Feature type name on the remote service (TYPENAME)
    #[serde(alias = "typename")]
    pub type_name: String,

    /// Display color as a CSS hex string
    #[serde(default = "default_color")]
    pub color: String,

    /// Human-readable label
    #[serde(default)]
    pub label: String,
}

fn default_color() -> String {
    "#3b82f6".to_string()
}

impl LayerDescriptor {
    pub fn new(key: &str, type_name: &str, color: &str, label: &str) -> Self {
        Self {
            key: LayerKey::new(key),
            type_name: type_name.to_string(),
            color: color.to_string(),
            label: label.to_string(),
        }
    }
}

/// Ordered set of layer descriptors with unique keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerCatalog {
    layers: Vec<LayerDescriptor>,
}

#[derive(Deserialize)]
struct CatalogFile {
    layers: Vec<LayerDescriptor>,
}

impl LayerCatalog {
    /// Build a catalog, rejecting duplicate keys.
    pub fn new(layers: Vec<LayerDescriptor>) -> Result<Self, CatalogError> {
        for (i, layer) in layers.iter().enumerate() {
            if layer.key.as_str().is_empty() {
                return Err(CatalogError::EmptyKey(i));
            }
            if layers[..i].iter().any(|l| l.key == layer.key) {
                return Err(CatalogError::DuplicateKey(layer.key.to_string()));
            }
        }
        Ok(Self { layers })
    }

    /// Parse a YAML document of the form `layers: [{key, type_name, color, label}]`.
    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        Self::new(file.layers)
    }

    /// Load a catalog from a YAML file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_yaml(&content)?;
        tracing::info!(
            path = %path.display(),
            layers = catalog.len(),
            "Loaded layer catalog"
        );
        Ok(catalog)
    }

    pub fn get(&self, key: &LayerKey) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| &l.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &LayerKey> {
        self.layers.iter().map(|l| &l.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerCatalog {
    /// The VWorld land-use layers the viewer ships with.
    fn default() -> Self {
        Self {
            layers: vec![
                LayerDescriptor::new("urban", "lt_c_uq121", "#3b82f6", "용도지역/지구 (도시계획)"),
                LayerDescriptor::new("greenbelt", "lt_c_ud801", "#ef4444", "개발제한구역(그린벨트)"),
                LayerDescriptor::new("landscape", "lt_c_uq121", "#f97316", "경관지구"),
                LayerDescriptor::new("admin", "lt_c_adsigg", "#eab308", "행정경계"),
                LayerDescriptor::new("roads", "lt_l_moctlink", "#93c5fd", "도로망/교통링크"),
                LayerDescriptor::new("slope", "lt_c_up401", "#22c55e", "급경사지역"),
            ],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate layer key: {0}")]
    DuplicateKey(String),

    #[error("Layer at index {0} has an empty key")]
    EmptyKey(usize),

    #[error("Failed to read layer catalog: {0}")]
    Io(String),

    #[error("Failed to parse layer catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}
