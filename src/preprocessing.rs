/// Preprocessing of face images into network input.
/// The layout follows Caffe's convention: BGR channel order, raw 0-255 values,
/// per-channel mean subtracted, no scaling.

use std::path::PathBuf;

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::{Array, Dim};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

pub fn load_image_batch(paths: &[PathBuf]) -> Vec<(PathBuf, anyhow::Result<DynamicImage>)>
{
	// Load the images in parallel
	paths.par_iter().map(
	{
		| path |
		{
			let img = image::open(path);
			match img
			{
				Ok(img) => (path.clone(), Ok(img)),
				Err(e) =>
				{
					(path.clone(), Err(anyhow::anyhow!("Error loading image: {:?} {:?}", path, e)))
				}
			}
		}
	}).collect::<Vec<(PathBuf, anyhow::Result<DynamicImage>)>>()
}

pub fn resize_image(image: &DynamicImage, input_size: u32) -> DynamicImage
{
	// Ignore the aspect ratio; face crops are close to square and the network wants exactly this size.
	image.resize_exact(input_size, input_size, FilterType::CatmullRom)
}

/// Converts one image to a (1, 3, input_size, input_size) array.
/// Grayscale images are expanded to three identical channels.
pub fn image_to_network_format(image: &DynamicImage, input_size: u32, mean: [f32; 3]) -> Array<f32, Dim<[usize; 4]>>
{
	let resized = resize_image(image, input_size);
	let size = input_size as usize;
	let mut image_input = Array::zeros((1, 3, size, size));
	for pixel in resized.pixels() {
		let x = pixel.0 as usize;
		let y = pixel.1 as usize;
		let [r, g, b, _] = pixel.2.0;
		image_input[[0, 0, y, x]] = (b as f32) - mean[0];
		image_input[[0, 1, y, x]] = (g as f32) - mean[1];
		image_input[[0, 2, y, x]] = (r as f32) - mean[2];
	}

	image_input
}
