//! Per-column configuration supplied alongside a snapshot.
//!
//! Keys select a column by name, by position (`_pos:<n>` or a bare number), or
//! all index columns at once (`_index`). Malformed configuration never aborts
//! snapshot construction: the lenient loaders log and fall back to defaults.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::cell::Alignment;
use crate::column::{ColumnKind, ColumnProps, Params};

pub const INDEX_KEY: &str = "_index";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthPreset {
    Small,
    Medium,
    Large,
}

impl WidthPreset {
    pub fn pixels(&self) -> u32 {
        match self {
            WidthPreset::Small => 75,
            WidthPreset::Medium => 200,
            WidthPreset::Large => 400,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnWidth {
    Preset(WidthPreset),
    Pixels(u32),
}

impl ColumnWidth {
    pub fn pixels(&self) -> u32 {
        match self {
            ColumnWidth::Preset(preset) => preset.pixels(),
            ColumnWidth::Pixels(px) => *px,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub params: Params,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub label: Option<String>,
    pub width: Option<ColumnWidth>,
    pub help: Option<String>,
    pub hidden: Option<bool>,
    pub disabled: Option<bool>,
    pub required: Option<bool>,
    pub alignment: Option<Alignment>,
    pub default: Option<JsonValue>,
    pub type_config: Option<TypeConfig>,
}

impl ColumnConfig {
    pub fn apply(&self, props: &mut ColumnProps) {
        if let Some(label) = &self.label {
            props.title.clone_from(label);
        }
        if let Some(width) = self.width {
            props.width = Some(width.pixels());
        }
        if let Some(help) = &self.help {
            props.help = Some(help.clone());
        }
        if let Some(hidden) = self.hidden {
            props.is_hidden = hidden;
        }
        if let Some(disabled) = self.disabled {
            props.is_editable = !disabled;
        }
        if let Some(required) = self.required {
            props.is_required = required;
        }
        if let Some(alignment) = self.alignment {
            props.alignment = Some(alignment);
        }
        if let Some(default) = &self.default {
            props.default_value = Some(default.clone());
        }
        if let Some(type_config) = &self.type_config {
            if let Some(kind) = &type_config.kind {
                props.kind = ColumnKind::from(kind.as_str());
            }
            props
                .params
                .extend(type_config.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, ColumnConfig>")]
pub struct ColumnConfigMap {
    entries: BTreeMap<String, ColumnConfig>,
}

impl From<BTreeMap<String, ColumnConfig>> for ColumnConfigMap {
    fn from(entries: BTreeMap<String, ColumnConfig>) -> Self {
        let mut map = ColumnConfigMap::default();
        for (key, config) in entries {
            map.insert(&key, config);
        }
        map
    }
}

impl ColumnConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts under a normalized key; bare numbers become `_pos:<n>`.
    pub fn insert(&mut self, key: &str, config: ColumnConfig) {
        self.entries.insert(normalize_key(key), config);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Strict JSON parsing.
    pub fn parse_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    /// Strict YAML parsing.
    pub fn parse_yaml(input: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(input)
    }

    /// Lenient JSON parsing: malformed input is logged and ignored.
    pub fn from_json_str(input: &str) -> Self {
        if input.trim().is_empty() {
            return Self::default();
        }
        Self::parse_json(input).unwrap_or_else(|err| {
            warn!("Ignoring malformed column configuration: {err}");
            Self::default()
        })
    }

    /// Lenient YAML parsing: malformed input is logged and ignored.
    pub fn from_yaml_str(input: &str) -> Self {
        if input.trim().is_empty() {
            return Self::default();
        }
        Self::parse_yaml(input).unwrap_or_else(|err| {
            warn!("Ignoring malformed column configuration: {err}");
            Self::default()
        })
    }

    /// Configuration for a column: by id, then by name, then `_index` for
    /// index columns.
    pub fn lookup(&self, props: &ColumnProps) -> Option<&ColumnConfig> {
        self.entries
            .get(&props.id)
            .or_else(|| self.entries.get(&props.name))
            .or_else(|| {
                props
                    .is_index
                    .then(|| self.entries.get(INDEX_KEY))
                    .flatten()
            })
    }

    /// Applies the matching configuration, if any. Returns whether one matched.
    pub fn apply(&self, props: &mut ColumnProps) -> bool {
        match self.lookup(props) {
            Some(config) => {
                config.apply(props);
                true
            }
            None => false,
        }
    }
}

fn normalize_key(key: &str) -> String {
    let trimmed = key.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("_pos:{trimmed}")
    } else {
        trimmed.to_string()
    }
}
