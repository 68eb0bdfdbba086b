//! Binding configuration
//!
//! Names of the SDK runtime classes the generated constructor code builds.
//! Defaults match the Flex SDK's `mx.binding` package.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BindingConfig {
    pub binding_class: String,
    pub property_watcher_class: String,
    pub static_property_watcher_class: String,
    pub function_return_watcher_class: String,
    pub xml_watcher_class: String,
    pub binding_manager_class: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        BindingConfig {
            binding_class: "mx.binding.Binding".to_string(),
            property_watcher_class: "mx.binding.PropertyWatcher".to_string(),
            static_property_watcher_class: "mx.binding.StaticPropertyWatcher".to_string(),
            function_return_watcher_class: "mx.binding.FunctionReturnWatcher".to_string(),
            xml_watcher_class: "mx.binding.XMLWatcher".to_string(),
            binding_manager_class: "mx.binding.BindingManager".to_string(),
        }
    }
}

impl BindingConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let config: BindingConfig = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Classes that must resolve before any binding code is generated.
    pub fn runtime_dependencies(&self) -> [&str; 6] {
        [
            &self.binding_class,
            &self.property_watcher_class,
            &self.static_property_watcher_class,
            &self.function_return_watcher_class,
            &self.xml_watcher_class,
            &self.binding_manager_class,
        ]
    }
}
