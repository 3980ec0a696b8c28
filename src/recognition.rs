use image::DynamicImage;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One embedding, as produced by a single forward pass for a single image.
pub type FeatureVector = Array1<f32>;

/// The image-level recognition contract. Implemented by the adapter, which
/// turns images into feature vectors before handing them to a [`Classifier`].
pub trait Recognition
{
    fn train(&mut self) -> bool;

    /// Returns the predicted label, or `None` when nothing matched.
    fn recognize(&mut self, image: &DynamicImage, expected_label: &str) -> Result<Option<String>>;

    fn save_to_file(&mut self) -> Result<()>;

    fn save_test_data(&mut self);

    fn load_from_file(&mut self) -> Result<()>;

    fn add_image(&mut self, image: &DynamicImage, label: &str) -> Result<()>;
}

/// The classifier collaborator, working on feature vectors.
/// Error handling for an untrained model or similar is up to the implementation.
pub trait Classifier
{
    fn kind(&self) -> ClassifierKind;

    fn train(&mut self) -> bool;

    fn recognize(&mut self, vector: &FeatureVector, expected_label: &str) -> Option<String>;

    fn add_image(&mut self, vector: FeatureVector, label: &str);

    fn save_test_data(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassifierKind
{
    SupportVectorMachine,
    KNearestNeighbor,
}

impl ClassifierKind
{
    /// `true` selects the support vector machine, `false` the k-nearest neighbor.
    pub fn from_flag(use_svm: bool) -> Self
    {
        if use_svm {
            ClassifierKind::SupportVectorMachine
        } else {
            ClassifierKind::KNearestNeighbor
        }
    }
}

/// Builds the classifier chosen by the configuration.
/// `method` is opaque to the adapter and passed through unchanged.
pub trait ClassifierFactory
{
    fn create(&self, kind: ClassifierKind, method: i32) -> Result<Box<dyn Classifier>>;
}

impl<F> ClassifierFactory for F
where
    F: Fn(ClassifierKind, i32) -> Result<Box<dyn Classifier>>,
{
    fn create(&self, kind: ClassifierKind, method: i32) -> Result<Box<dyn Classifier>>
    {
        self(kind, method)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn flag_selects_kind()
    {
        assert_eq!(ClassifierKind::from_flag(true), ClassifierKind::SupportVectorMachine);
        assert_eq!(ClassifierKind::from_flag(false), ClassifierKind::KNearestNeighbor);
    }
}
