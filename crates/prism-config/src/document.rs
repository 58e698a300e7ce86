//! Serialized config documents: JSON and RON.

use std::path::Path;

use serde_json::Value;

use crate::error::FormatError;

/// A string-keyed mapping of plain document values.
pub type Mapping = serde_json::Map<String, Value>;

/// On-disk document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// JSON, the format run configs have always been written in.
    #[default]
    Json,
    /// RON, for hand-edited configs that want comments.
    Ron,
}

impl DocumentFormat {
    /// Pick the format from a file extension. Anything but `.ron` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Self::Ron,
            _ => Self::Json,
        }
    }

    /// Parse document bytes into a top-level mapping.
    pub fn parse(self, bytes: &[u8]) -> Result<Mapping, FormatError> {
        let value: Value = match self {
            Self::Json => serde_json::from_slice(bytes)?,
            Self::Ron => ron::de::from_bytes(bytes)?,
        };

        match value {
            Value::Object(mapping) => Ok(mapping),
            other => Err(FormatError::NotAMapping(value_type_name(&other))),
        }
    }

    /// Render a mapping as a pretty-printed document.
    pub fn render(self, mapping: &Mapping) -> Result<String, FormatError> {
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(mapping)?),
            Self::Ron => {
                let pretty = ron::ser::PrettyConfig::new()
                    .depth_limit(3)
                    .separate_tuple_members(true)
                    .enumerate_arrays(false);
                Ok(ron::ser::to_string_pretty(mapping, pretty)?)
            }
        }
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}
