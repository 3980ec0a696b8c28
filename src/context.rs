use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::preferences::{JsonPreferences, Preferences};
use crate::storage;

/// What the adapter needs from its host application: a preference store to
/// read settings from, and the directory holding the model files.
pub struct AppContext
{
    preferences: Box<dyn Preferences>,
    data_dir: PathBuf,
}

impl AppContext
{
    pub fn new(preferences: Box<dyn Preferences>, data_dir: PathBuf) -> Self
    {
        AppContext { preferences, data_dir }
    }

    /// Preferences from `<data dir>/facerecognition/preferences.json`,
    /// models from `<data dir>/facerecognition/caffe/`.
    pub fn from_default_locations() -> Result<Self>
    {
        let preferences = JsonPreferences::load(storage::default_preferences_path()?)?;
        Ok(AppContext::new(Box::new(preferences), storage::default_model_dir()?))
    }

    pub fn preferences(&self) -> &dyn Preferences
    {
        self.preferences.as_ref()
    }

    pub fn data_dir(&self) -> &Path
    {
        &self.data_dir
    }
}
