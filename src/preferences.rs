/// String-keyed configuration sources.
/// The adapter only ever reads from these; values that are missing or of the
/// wrong type are treated as absent and the caller falls back to its defaults.

use std::path::{Path, PathBuf};

use log::debug;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::error::Result;

pub trait Preferences
{
    fn get_string(&self, key: &str) -> Option<String>;

    fn get_bool(&self, key: &str) -> Option<bool>;
}

/// Preferences persisted as a flat JSON object, e.g.
/// `{ "key_outputLayerCaffe": "fc7", "key_classificationMethodTFCaffe": false }`.
#[derive(Debug, Clone, Default)]
pub struct JsonPreferences
{
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonPreferences
{
    /// Loads the preferences at `path`. A missing file is an empty store;
    /// a file that is not a JSON object is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self>
    {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            debug!("No preferences file at {:?}, using defaults", path);
            return Ok(JsonPreferences { path, values: Map::new() });
        }

        let contents = std::fs::read_to_string(&path)?;
        let values: Map<String, Value> = serde_json::from_str(&contents)?;
        Ok(JsonPreferences { path, values })
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>)
    {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn save(&self) -> Result<()>
    {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl Preferences for JsonPreferences
{
    fn get_string(&self, key: &str) -> Option<String>
    {
        match self.values.get(key)? {
            Value::String(s) => Some(s.clone()),
            // Numbers are accepted for keys such as the input size.
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool>
    {
        self.values.get(key)?.as_bool()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceValue
{
    String(String),
    Bool(bool),
}

/// In-memory preferences, for embedding the adapter where there is no
/// preferences file and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences
{
    values: FxHashMap<String, PreferenceValue>,
}

impl MemoryPreferences
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn with_string(mut self, key: &str, value: &str) -> Self
    {
        self.values.insert(key.to_string(), PreferenceValue::String(value.to_string()));
        self
    }

    pub fn with_bool(mut self, key: &str, value: bool) -> Self
    {
        self.values.insert(key.to_string(), PreferenceValue::Bool(value));
        self
    }
}

impl Preferences for MemoryPreferences
{
    fn get_string(&self, key: &str) -> Option<String>
    {
        match self.values.get(key)? {
            PreferenceValue::String(s) => Some(s.clone()),
            PreferenceValue::Bool(_) => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool>
    {
        match self.values.get(key)? {
            PreferenceValue::Bool(b) => Some(*b),
            PreferenceValue::String(_) => None,
        }
    }
}
