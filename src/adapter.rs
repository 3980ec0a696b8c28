use image::DynamicImage;
use log::{debug, info};
use ndarray::Axis;

use crate::config::{AdapterConfig, ENGINE_WORKER_COUNT};
use crate::context::AppContext;
use crate::engine::{EngineSettings, FeatureEngine};
use crate::error::{Error, Result};
use crate::onnx::OrtEngine;
use crate::recognition::{Classifier, ClassifierFactory, ClassifierKind, FeatureVector, Recognition};

/// Bridges face images and a trained classifier through a native feature extractor.
///
/// Images are turned into feature vectors by one forward pass of the loaded
/// network, reading the configured output layer; the vectors are then handed
/// to the classifier picked by the configuration. The adapter owns both the
/// engine and the classifier for its whole lifetime and expects to be used
/// by one caller at a time.
pub struct ModelAdapter<E: FeatureEngine = OrtEngine>
{
    config: AdapterConfig,
    engine: E,
    classifier: Box<dyn Classifier>,
}

impl<E: FeatureEngine> ModelAdapter<E>
{
    /// Resolves the configuration, loads the engine and creates the classifier.
    /// Any failure to load the model is returned; there is no degraded mode.
    pub fn new(context: &AppContext, method: i32, factory: &dyn ClassifierFactory) -> Result<Self>
    {
        let config = AdapterConfig::resolve(context.preferences(), context.data_dir());
        let engine = load_engine::<E>(&config)?;

        let classifier = factory.create(config.classifier, method)?;
        info!("Using {:?} classifier (method {})", config.classifier, method);

        Ok(ModelAdapter { config, engine, classifier })
    }

    pub fn config(&self) -> &AdapterConfig
    {
        &self.config
    }

    pub fn classifier_kind(&self) -> ClassifierKind
    {
        self.classifier.kind()
    }

    /// Runs `image` through the network and returns the activations of the
    /// configured output layer.
    pub fn feature_vector(&mut self, image: &DynamicImage) -> Result<FeatureVector>
    {
        extract_feature_vector(&mut self.engine, &self.config, image)
    }
}

/// Loads the engine described by `config`, with the worker count and mean applied.
pub fn load_engine<E: FeatureEngine>(config: &AdapterConfig) -> Result<E>
{
    let settings = EngineSettings {
        model_path: config.model_path(),
        weights_path: config.weights_path(),
        worker_count: ENGINE_WORKER_COUNT,
        input_size: config.input_size,
    };
    let mut engine = E::load(&settings)?;
    engine.set_mean(config.mean_values);
    Ok(engine)
}

pub fn extract_feature_vector<E: FeatureEngine>(engine: &mut E, config: &AdapterConfig, image: &DynamicImage) -> Result<FeatureVector>
{
    let output = engine.forward_image(image, &config.output_layer, &config.data_dir)?;

    // Single image inference: the first row is the only one.
    if output.len_of(Axis(0)) == 0 {
        return Err(Error::EmptyOutput);
    }
    Ok(output.row(0).to_owned())
}

impl<E: FeatureEngine> Recognition for ModelAdapter<E>
{
    fn train(&mut self) -> bool
    {
        self.classifier.train()
    }

    fn recognize(&mut self, image: &DynamicImage, expected_label: &str) -> Result<Option<String>>
    {
        let vector = self.feature_vector(image)?;
        Ok(self.classifier.recognize(&vector, expected_label))
    }

    fn save_to_file(&mut self) -> Result<()>
    {
        debug!("save_to_file: nothing to persist at the adapter level");
        Ok(())
    }

    fn save_test_data(&mut self)
    {
        self.classifier.save_test_data();
    }

    fn load_from_file(&mut self) -> Result<()>
    {
        debug!("load_from_file: nothing to load at the adapter level");
        Ok(())
    }

    fn add_image(&mut self, image: &DynamicImage, label: &str) -> Result<()>
    {
        let vector = self.feature_vector(image)?;
        self.classifier.add_image(vector, label);
        Ok(())
    }
}
