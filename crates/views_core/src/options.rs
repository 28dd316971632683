//! Engine options with field-by-field defaults.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{CoreError, Result};
use crate::views::ViewDirectories;

/// Document type emitted before the rendered markup.
pub const DEFAULT_DOC_TYPE: &str = "<!DOCTYPE html>";

/// Transform option key restricting the transform to the view directories.
pub const SCOPE_KEY: &str = "only";

/// Opaque configuration handed to the source-transform tool.
///
/// Always a JSON object. The engine only touches the [`SCOPE_KEY`] entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformConfig(Map<String, Value>);

impl TransformConfig {
    /// Create a transform config from an object map.
    pub fn new(entries: Map<String, Value>) -> Self {
        Self(entries)
    }

    /// Create a transform config from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self(entries)),
            other => Err(CoreError::InvalidOptions(format!(
                "transform config must be an object, got {other}"
            ))),
        }
    }

    /// Look up a top-level entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level entry, replacing any previous value.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Overlay `self` on top of `base`, key by key.
    pub fn merged_over(self, base: &TransformConfig) -> Self {
        let mut merged = base.0.clone();
        merged.extend(self.0);
        Self(merged)
    }

    /// Copy of this config restricted to the given view directories.
    pub fn scoped_to(&self, views: &ViewDirectories) -> Self {
        let only = views
            .iter()
            .map(|dir| Value::String(dir.to_string_lossy().into_owned()))
            .collect();
        self.clone().with(SCOPE_KEY, Value::Array(only))
    }

    /// Copy of this config without the directory scope, for per-file calls.
    pub fn unscoped(&self) -> Self {
        let mut entries = self.0.clone();
        entries.remove(SCOPE_KEY);
        Self(entries)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Serialize config to JSON string (pure transformation).
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

impl Default for TransformConfig {
    // JSX plus modern syntax lowered for the embedded runtime.
    fn default() -> Self {
        Self::new(Map::new()).with(
            "presets",
            json!(["react", ["env", { "targets": { "node": "current" } }]]),
        )
    }
}

/// Fully resolved engine options. Immutable once an engine is built.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    /// Prefix written before every rendered document.
    pub doc_type: String,
    /// Whether templates go through the source transform before loading.
    pub transform_templates: bool,
    /// Configuration for the source transform.
    pub transform: TransformConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            transform_templates: true,
            transform: TransformConfig::default(),
        }
    }
}

impl EngineOptions {
    /// Fill every missing field of `partial` from the defaults.
    ///
    /// Transform settings are merged by top-level key: an explicit
    /// `transform` object first, then any unrecognized top-level options.
    pub fn from_partial(partial: PartialEngineOptions) -> Self {
        let defaults = Self::default();

        let mut transform = defaults.transform;
        if let Some(explicit) = partial.transform {
            transform = explicit.merged_over(&transform);
        }
        if !partial.extra.is_empty() {
            transform = TransformConfig::new(partial.extra).merged_over(&transform);
        }

        Self {
            doc_type: partial.doc_type.unwrap_or(defaults.doc_type),
            transform_templates: partial
                .transform_templates
                .unwrap_or(defaults.transform_templates),
            transform,
        }
    }

    /// Parse options as the host passes them (camelCase JSON object).
    pub fn from_json(value: Value) -> Result<Self> {
        let partial: PartialEngineOptions = serde_json::from_value(value)
            .map_err(|e| CoreError::InvalidOptions(e.to_string()))?;
        Ok(Self::from_partial(partial))
    }
}

impl From<PartialEngineOptions> for EngineOptions {
    fn from(partial: PartialEngineOptions) -> Self {
        Self::from_partial(partial)
    }
}

/// Options as supplied by the caller. Every field may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialEngineOptions {
    #[serde(default, alias = "doctype", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    #[serde(
        default,
        alias = "transformViews",
        skip_serializing_if = "Option::is_none"
    )]
    pub transform_templates: Option<bool>,

    #[serde(
        default,
        alias = "transformConfig",
        alias = "babel",
        skip_serializing_if = "Option::is_none"
    )]
    pub transform: Option<TransformConfig>,

    /// Unrecognized top-level keys, forwarded to the transform config.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialEngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn transform_templates(mut self, enabled: bool) -> Self {
        self.transform_templates = Some(enabled);
        self
    }

    pub fn transform(mut self, config: TransformConfig) -> Self {
        self.transform = Some(config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.doc_type, "<!DOCTYPE html>");
        assert!(options.transform_templates);
        let presets = options.transform.get("presets").unwrap();
        assert_eq!(presets[0], "react");
        assert_eq!(presets[1][0], "env");
        assert_eq!(presets[1][1]["targets"]["node"], "current");
    }

    #[test]
    fn test_partial_keeps_unspecified_defaults() {
        let options = EngineOptions::from_partial(PartialEngineOptions::new().doc_type(""));
        assert_eq!(options.doc_type, "");
        assert!(options.transform_templates);
        assert_eq!(options.transform, TransformConfig::default());
    }

    #[test]
    fn test_transform_disabled_keeps_doc_type() {
        let options =
            EngineOptions::from_partial(PartialEngineOptions::new().transform_templates(false));
        assert_eq!(options.doc_type, DEFAULT_DOC_TYPE);
        assert!(!options.transform_templates);
    }

    #[test]
    fn test_transform_merged_by_key() {
        let custom = TransformConfig::new(Map::new()).with("comments", json!(false));
        let options = EngineOptions::from_partial(PartialEngineOptions::new().transform(custom));
        assert_eq!(options.transform.get("comments"), Some(&json!(false)));
        assert!(options.transform.get("presets").is_some());
    }

    #[test]
    fn test_from_json_accepts_legacy_names() {
        let options = EngineOptions::from_json(json!({
            "doctype": "<!doctype html>",
            "transformViews": false,
            "babel": { "presets": ["react"] }
        }))
        .unwrap();
        assert_eq!(options.doc_type, "<!doctype html>");
        assert!(!options.transform_templates);
        assert_eq!(options.transform.get("presets"), Some(&json!(["react"])));
    }

    #[test]
    fn test_from_json_forwards_unknown_keys_to_transform() {
        let options = EngineOptions::from_json(json!({
            "docType": "<!doctype html>",
            "plugins": ["some-plugin"]
        }))
        .unwrap();
        assert_eq!(options.transform.get("plugins"), Some(&json!(["some-plugin"])));
        assert!(options.transform.get("presets").is_some());
    }

    #[test]
    fn test_from_json_rejects_wrong_types() {
        let result = EngineOptions::from_json(json!({ "transformTemplates": "yes" }));
        assert!(matches!(result, Err(CoreError::InvalidOptions(_))));
    }

    #[test]
    fn test_transform_config_from_value_requires_object() {
        assert!(TransformConfig::from_value(json!({})).is_ok());
        assert!(matches!(
            TransformConfig::from_value(json!([1, 2])),
            Err(CoreError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_scoped_to_and_unscoped() {
        let views = ViewDirectories::from(vec!["/app/views", "/app/shared"]);
        let scoped = TransformConfig::default().scoped_to(&views);
        assert_eq!(scoped.get(SCOPE_KEY), Some(&json!(["/app/views", "/app/shared"])));
        assert!(scoped.unscoped().get(SCOPE_KEY).is_none());
        assert!(scoped.unscoped().get("presets").is_some());
    }
}
