/// On-disk layout of the application data, and the scratch image written
/// for engines that can only read their input from a file.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::debug;

use crate::error::{Error, Result};

pub const APP_DIR_NAME: &str = "facerecognition";
pub const MODEL_DIR_NAME: &str = "caffe";
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";
pub const SCRATCH_IMAGE_NAME: &str = "caffe_vector";

pub fn app_dir() -> Result<PathBuf>
{
    let data_dir = dirs::data_dir().ok_or(Error::NoDataDirectory)?;
    Ok(data_dir.join(APP_DIR_NAME))
}

/// Where the model and weight files live, and where scratch images are written.
pub fn default_model_dir() -> Result<PathBuf>
{
    Ok(app_dir()?.join(MODEL_DIR_NAME))
}

pub fn default_preferences_path() -> Result<PathBuf>
{
    Ok(app_dir()?.join(PREFERENCES_FILE_NAME))
}

/// Saves `image` as `<dir>/<name>.png`, creating `dir` if needed,
/// and returns the full path. An existing file is overwritten.
pub fn save_image(image: &DynamicImage, dir: &Path, name: &str) -> Result<PathBuf>
{
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.png", name));
    image.save_with_format(&path, image::ImageFormat::Png)?;
    debug!("Saved {}x{} image to {:?}", image.width(), image.height(), path);
    Ok(path)
}

#[cfg(test)]
mod tests
{
    use image::{GenericImageView, RgbImage};

    use super::*;

    #[test]
    fn test_save_image()
    {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("caffe");
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30])));

        let path = save_image(&image, &target, SCRATCH_IMAGE_NAME).unwrap();
        assert_eq!(path, target.join("caffe_vector.png"));

        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.dimensions(), (4, 3));
        assert_eq!(reloaded.to_rgb8().get_pixel(2, 1).0, [10, 20, 30]);
    }

    #[test]
    fn save_into_a_file_path_fails()
    {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();
        let image = DynamicImage::ImageLuma8(image::GrayImage::new(2, 2));

        let result = save_image(&image, &blocker, SCRATCH_IMAGE_NAME);
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
