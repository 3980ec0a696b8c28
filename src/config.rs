use std::path::{Path, PathBuf};

use log::warn;
use serde::Serialize;

use crate::preferences::Preferences;
use crate::recognition::ClassifierKind;

pub const KEY_MODEL_FILE: &str = "key_modelFileCaffe";
pub const KEY_WEIGHTS_FILE: &str = "key_weightsFileCaffe";
pub const KEY_OUTPUT_LAYER: &str = "key_outputLayerCaffe";
pub const KEY_MEAN_VALUES: &str = "key_meanValuesCaffe";
pub const KEY_CLASSIFICATION_METHOD: &str = "key_classificationMethodTFCaffe";
pub const KEY_INPUT_SIZE: &str = "key_inputSizeCaffe";

pub const DEFAULT_MODEL_FILE: &str = "vgg_face.onnx";
// The same file: weights are embedded in the model unless configured otherwise.
pub const DEFAULT_WEIGHTS_FILE: &str = "vgg_face.onnx";
pub const DEFAULT_OUTPUT_LAYER: &str = "fc7";
// Per-channel means in B, G, R order, from the VGG-Face training set.
pub const DEFAULT_MEAN_VALUES: [f32; 3] = [93.5940, 104.7624, 129.1863];
pub const DEFAULT_CLASSIFICATION_METHOD: bool = true;
pub const DEFAULT_INPUT_SIZE: u32 = 224;
// Larger inputs would need tens of gigabytes for the input tensor alone.
pub const MAX_INPUT_SIZE: u32 = 4096;

/// Threads used by the engine for a single forward pass.
pub const ENGINE_WORKER_COUNT: usize = 4;

/// The resolved adapter configuration. Immutable once the adapter is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterConfig
{
    pub data_dir: PathBuf,
    pub model_file: String,
    pub weights_file: String,
    pub output_layer: String,
    pub mean_values: [f32; 3],
    pub classifier: ClassifierKind,
    pub input_size: u32,
}

impl AdapterConfig
{
    /// Reads every value from `prefs`, falling back to the defaults above
    /// for anything absent or malformed. Never fails.
    pub fn resolve(prefs: &dyn Preferences, data_dir: &Path) -> Self
    {
        let model_file = prefs.get_string(KEY_MODEL_FILE).unwrap_or_else(|| DEFAULT_MODEL_FILE.to_string());
        let weights_file = prefs.get_string(KEY_WEIGHTS_FILE).unwrap_or_else(|| DEFAULT_WEIGHTS_FILE.to_string());
        let output_layer = prefs.get_string(KEY_OUTPUT_LAYER).unwrap_or_else(|| DEFAULT_OUTPUT_LAYER.to_string());

        let mean_values = match prefs.get_string(KEY_MEAN_VALUES) {
            Some(s) => parse_mean_values(&s).unwrap_or_else(|| {
                warn!("Malformed mean values {:?}, using {:?}", s, DEFAULT_MEAN_VALUES);
                DEFAULT_MEAN_VALUES
            }),
            None => DEFAULT_MEAN_VALUES,
        };

        let input_size = match prefs.get_string(KEY_INPUT_SIZE) {
            Some(s) => match s.trim().parse::<u32>() {
                Ok(size) if size > 0 && size <= MAX_INPUT_SIZE => size,
                _ => {
                    warn!("Malformed input size {:?}, using {}", s, DEFAULT_INPUT_SIZE);
                    DEFAULT_INPUT_SIZE
                }
            },
            None => DEFAULT_INPUT_SIZE,
        };

        let use_svm = prefs.get_bool(KEY_CLASSIFICATION_METHOD).unwrap_or(DEFAULT_CLASSIFICATION_METHOD);

        AdapterConfig {
            data_dir: data_dir.to_path_buf(),
            model_file,
            weights_file,
            output_layer,
            mean_values,
            classifier: ClassifierKind::from_flag(use_svm),
            input_size,
        }
    }

    pub fn model_path(&self) -> PathBuf
    {
        self.data_dir.join(&self.model_file)
    }

    pub fn weights_path(&self) -> PathBuf
    {
        self.data_dir.join(&self.weights_file)
    }
}

/// Parses a comma separated triple such as `"104,117,123"`.
/// Trailing empty parts are dropped, so `"104,117,123,"` is still a triple.
/// Returns `None` unless there are exactly 3 parts and all of them are floats.
pub fn parse_mean_values(s: &str) -> Option<[f32; 3]>
{
    let mut parts: Vec<&str> = s.split(',').collect();
    while parts.last() == Some(&"") {
        parts.pop();
    }
    if parts.len() != 3 {
        return None;
    }

    let mut mean = [0.0f32; 3];
    for (value, part) in mean.iter_mut().zip(parts.iter()) {
        *value = part.trim().parse::<f32>().ok()?;
    }
    Some(mean)
}
