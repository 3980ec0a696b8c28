/// The boundary to the native inference engine.
///
/// The engine is opaque: it loads a network from a model file and its
/// weights, and runs one forward pass per image, returning the activations
/// of a named layer as a 2D array of shape (batch_size, feature_length).
/// Batch size is always 1 here.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::DynamicImage;
use log::info;
use ndarray::Array2;

use crate::error::{Error, Result};
use crate::storage;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings
{
    pub model_path: PathBuf,
    pub weights_path: PathBuf,
    pub worker_count: usize,
    /// Side length of the square network input, in pixels.
    pub input_size: u32,
}

pub trait FeatureEngine
{
    fn load(settings: &EngineSettings) -> Result<Self>
    where
        Self: Sized;

    /// Per-channel means in B, G, R order, subtracted from every input pixel.
    fn set_mean(&mut self, mean: [f32; 3]);

    fn forward_path(&mut self, image_path: &Path, layer: &str) -> Result<Array2<f32>>;

    /// Runs the forward pass for an in-memory image.
    /// Engines that only accept file paths use this default, which writes the
    /// image to `scratch_dir` first; engines that can take the pixels directly
    /// should override it.
    fn forward_image(&mut self, image: &DynamicImage, layer: &str, scratch_dir: &Path) -> Result<Array2<f32>>
    {
        let path = storage::save_image(image, scratch_dir, storage::SCRATCH_IMAGE_NAME)?;
        self.forward_path(&path, layer)
    }
}

type InitResult = std::result::Result<(), String>;

static RUNTIME: OnceLock<InitResult> = OnceLock::new();

/// Runs `init` at most once for `cell`; its outcome, including a failure,
/// is returned to every caller afterwards.
fn init_once<F>(cell: &OnceLock<InitResult>, init: F) -> Result<()>
where
    F: FnOnce() -> InitResult,
{
    cell
        .get_or_init(|| {
            let result = init();
            match &result {
                Ok(()) => info!("Inference runtime initialized"),
                Err(e) => log::error!("Inference runtime failed to initialize: {}", e),
            }
            result
        })
        .clone()
        .map_err(Error::RuntimeInit)
}

/// Initializes the ONNX runtime environment once per process.
pub fn init_runtime() -> Result<()>
{
    init_once(&RUNTIME, || {
        ort::init()
            .with_name("facerec")
            .commit()
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
}

#[cfg(test)]
mod tests
{
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::GenericImageView;
    use ndarray::array;

    use super::*;

    /// Reports the dimensions of the image it was asked to read.
    struct PathOnlyEngine
    {
        seen: Vec<PathBuf>,
    }

    impl FeatureEngine for PathOnlyEngine
    {
        fn load(_settings: &EngineSettings) -> Result<Self>
        {
            Ok(PathOnlyEngine { seen: vec![] })
        }

        fn set_mean(&mut self, _mean: [f32; 3]) {}

        fn forward_path(&mut self, image_path: &Path, _layer: &str) -> Result<Array2<f32>>
        {
            self.seen.push(image_path.to_path_buf());
            let (w, h) = image::open(image_path)?.dimensions();
            Ok(array![[w as f32, h as f32]])
        }
    }

    fn settings() -> EngineSettings
    {
        EngineSettings {
            model_path: PathBuf::from("model.onnx"),
            weights_path: PathBuf::from("model.onnx"),
            worker_count: 4,
            input_size: 224,
        }
    }

    #[test]
    fn default_forward_image_goes_through_scratch_file()
    {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = PathOnlyEngine::load(&settings()).unwrap();
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(5, 7));

        let output = engine.forward_image(&image, "fc7", dir.path()).unwrap();

        assert_eq!(output, array![[5.0, 7.0]]);
        assert_eq!(engine.seen, vec![dir.path().join("caffe_vector.png")]);
    }

    #[test]
    fn runtime_initializes_once()
    {
        let cell = OnceLock::new();
        let calls = AtomicUsize::new(0);
        let init = || -> InitResult {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        init_once(&cell, init).unwrap();
        init_once(&cell, init).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn runtime_failure_is_cached()
    {
        let cell = OnceLock::new();
        let calls = AtomicUsize::new(0);
        let init = || -> InitResult {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("libonnxruntime.so not found".to_string())
        };
        for _ in 0..2 {
            match init_once(&cell, init) {
                Err(Error::RuntimeInit(message)) => assert_eq!(message, "libonnxruntime.so not found"),
                other => panic!("unexpected result {:?}", other),
            }
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
