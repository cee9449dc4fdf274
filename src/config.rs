use crate::xml::{DEFAULT_HEX_LINE_WIDTH, EncodeOptions};
use crate::ws::{WritingSystemResolver, WsRegistry};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Codec settings, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Writing system id written on an `AStr` root.
    pub default_ws: Option<String>,
    pub hex_line_width: usize,
    pub indent: bool,
    pub embed_object_data: bool,
    pub writing_systems: Vec<String>,
    pub auto_register: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            default_ws: None,
            hex_line_width: DEFAULT_HEX_LINE_WIDTH,
            indent: true,
            embed_object_data: true,
            writing_systems: Vec::new(),
            auto_register: true,
        }
    }
}

impl CodecConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: CodecConfig =
            toml::from_str(&content).map_err(|e| format!("Invalid config format: {}", e))?;

        Ok(config)
    }

    /// Registry holding the configured writing systems, in order.
    pub fn registry(&self) -> WsRegistry {
        let mut registry = WsRegistry::with_ids(self.writing_systems.iter().map(String::as_str));
        registry.set_auto_register(self.auto_register);
        registry
    }

    /// Encode options for this config. `default_ws` is resolved through `resolver`;
    /// an unresolvable id leaves the root as plain `Str`.
    pub fn encode_options(&self, resolver: &dyn WritingSystemResolver) -> EncodeOptions {
        EncodeOptions {
            ws: self
                .default_ws
                .as_deref()
                .and_then(|id| resolver.handle(id).ok()),
            embed_object_data: self.embed_object_data,
            indent: self.indent,
            hex_line_width: self.hex_line_width,
        }
    }
}

pub fn get_config_dir() -> PathBuf {
    let config_home = dirs::config_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config")
    });
    config_home.join("tsstring")
}

pub fn find_config_file() -> Option<PathBuf> {
    let paths = vec![
        get_config_dir().join("config.toml"),
        dirs::home_dir()?.join(".tsstring").join("config.toml"),
    ];

    paths.into_iter().find(|p| p.exists())
}
