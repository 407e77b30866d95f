use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SweepError};

const KEYWORDS: &str = "keywords";

/// A wrapper's `package.json`, held as an insertion-ordered JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    pub path: PathBuf,
    fields: Map<String, Value>,
}

impl PackageManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| SweepError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    pub fn parse(path: &Path, raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(SweepError::ManifestSyntax)?;

        match value {
            Value::Object(fields) => Ok(Self {
                path: path.to_path_buf(),
                fields,
            }),
            _ => Err(SweepError::ManifestNotObject),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// The `keywords` array, or an empty slice when absent or not an array.
    pub fn keywords(&self) -> &[Value] {
        self.fields
            .get(KEYWORDS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replace `keywords`, dropping the field entirely when `kept` is empty.
    ///
    /// The key keeps its position in the object when it survives.
    pub fn set_keywords(&mut self, kept: Vec<Value>) {
        if kept.is_empty() {
            self.fields.shift_remove(KEYWORDS);
        } else if let Some(slot) = self.fields.get_mut(KEYWORDS) {
            *slot = Value::Array(kept);
        } else {
            self.fields.insert(KEYWORDS.to_string(), Value::Array(kept));
        }
    }

    /// Two-space indented JSON, non-ASCII left literal, one trailing newline.
    pub fn to_json_string(&self) -> Result<String> {
        let mut out =
            serde_json::to_string_pretty(&self.fields).map_err(SweepError::ManifestSyntax)?;
        out.push('\n');
        Ok(out)
    }

    pub fn save(&self) -> Result<()> {
        let out = self.to_json_string()?;
        fs::write(&self.path, out).map_err(|source| SweepError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
