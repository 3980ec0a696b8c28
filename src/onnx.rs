use std::path::Path;

use image::DynamicImage;
use log::{debug, info};
use ndarray::{Array2, ArrayView, IxDyn};
use ort::{self, inputs, CPUExecutionProvider, GraphOptimizationLevel};

use crate::engine::{self, EngineSettings, FeatureEngine};
use crate::error::{Error, Result};
use crate::preprocessing;

/// Feature extraction through ONNX Runtime.
///
/// The network is a face descriptor model (VGG-Face or similar) exported to ONNX,
/// with every layer whose activations we may want to read exposed as a graph output.
/// A `weights_path` different from `model_path` names the external data file of the
/// model; ONNX Runtime resolves it relative to the model, so both must sit in the
/// same directory, which they always do when built from `AdapterConfig`.
///
/// Unlike the file based engines this takes the image pixels directly, so no
/// scratch image is ever written.
pub struct OrtEngine
{
    session: ort::Session,
    input_size: u32,
    mean: [f32; 3],
}

impl OrtEngine
{
    /// The names of the layers that can be requested in a forward pass.
    pub fn output_layers(&self) -> Vec<String>
    {
        self.session.outputs.iter().map(|output| output.name.clone()).collect()
    }

    fn run(&self, image: &DynamicImage, layer: &str) -> Result<Array2<f32>>
    {
        if !self.session.outputs.iter().any(|output| output.name == layer) {
            return Err(Error::MissingOutputLayer { layer: layer.to_string(), available: self.output_layers() });
        }

        let input = preprocessing::image_to_network_format(image, self.input_size, self.mean);

        let now = std::time::Instant::now();
        let outputs = self.session.run(inputs![input]?)?;
        debug!("Forward pass took {:?}", now.elapsed());

        let output: ArrayView<f32, IxDyn> = outputs[layer].try_extract_tensor::<f32>()?;

        // First dimension is the batch; everything after it is the feature vector,
        // flattened for convolutional layers.
        let batch = output.shape().first().copied().unwrap_or(0);
        if batch == 0 {
            return Err(Error::EmptyOutput);
        }
        let length = output.len() / batch;
        let output = output.to_shape((batch, length))?.to_owned();

        Ok(output)
    }
}

impl FeatureEngine for OrtEngine
{
    fn load(settings: &EngineSettings) -> Result<Self>
    {
        for path in [&settings.model_path, &settings.weights_path] {
            if !path.is_file() {
                return Err(Error::ModelNotFound(path.clone()));
            }
        }

        engine::init_runtime()?;

        info!("Loading model {:?} with weights {:?}", settings.model_path, settings.weights_path);
        let session = ort::Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(settings.worker_count)?
            .with_execution_providers([CPUExecutionProvider::default().build()])?
            .commit_from_file(&settings.model_path)?;

        let engine = OrtEngine { session, input_size: settings.input_size, mean: [0.0; 3] };
        info!("Model loaded, available layers: {:?}", engine.output_layers());
        Ok(engine)
    }

    fn set_mean(&mut self, mean: [f32; 3])
    {
        self.mean = mean;
    }

    fn forward_path(&mut self, image_path: &Path, layer: &str) -> Result<Array2<f32>>
    {
        let image = image::open(image_path)?;
        self.run(&image, layer)
    }

    fn forward_image(&mut self, image: &DynamicImage, layer: &str, _scratch_dir: &Path) -> Result<Array2<f32>>
    {
        self.run(image, layer)
    }
}
