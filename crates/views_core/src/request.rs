//! Per-render options in the shape the host's view-engine convention uses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::views::ViewDirectories;

/// Environment name that turns on per-request module eviction.
pub const DEVELOPMENT: &str = "development";

/// Host settings forwarded with each render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub views: ViewDirectories,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

impl Settings {
    pub fn new(views: impl Into<ViewDirectories>) -> Self {
        Self {
            views: views.into(),
            env: None,
        }
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }
}

/// Options for a single render call.
///
/// Serializes to the object the template receives as its props, so
/// `settings` and `_locals` are visible to the component alongside any
/// other top-level entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub settings: Settings,
    /// Values exposed to every component through the locals context.
    #[serde(rename = "_locals", default)]
    pub locals: Value,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl RenderOptions {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            locals: Value::Object(Map::new()),
            props: Map::new(),
        }
    }

    pub fn with_locals(mut self, locals: Value) -> Self {
        self.locals = locals;
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn views(&self) -> &ViewDirectories {
        &self.settings.views
    }

    pub fn env(&self) -> Option<&str> {
        self.settings.env.as_deref()
    }

    pub fn is_development(&self) -> bool {
        self.env() == Some(DEVELOPMENT)
    }

    /// The full options object as component props.
    pub fn props_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}
