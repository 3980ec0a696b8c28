/// Bulk feature extraction for a set of labeled face images.
///
/// Images are expected in one directory per person, e.g. `faces/alice/001.jpg`;
/// the parent directory name becomes the label. Decoding runs in parallel, the
/// forward passes run one after another on the single engine.

use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::adapter::extract_feature_vector;
use crate::config::AdapterConfig;
use crate::engine::FeatureEngine;
use crate::error::Result;
use crate::preprocessing;

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff"];

// Decoded images held in memory at once.
const DECODE_CHUNK_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledFeature
{
    pub label: String,
    pub path: PathBuf,
    pub vector: Vec<f32>,
}

fn is_image(path: &Path) -> bool
{
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expands `inputs` into image files. Files are taken as given; directories
/// are walked recursively and only files with an image extension are kept,
/// in sorted order.
pub fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>>
{
    let mut images = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry.map_err(|e| anyhow::anyhow!("Error walking {:?}: {}", input, e))?;
                if entry.file_type().is_file() && is_image(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            images.extend(found);
        } else if input.is_file() {
            images.push(input.clone());
        } else {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, format!("{:?} does not exist", input)).into());
        }
    }
    Ok(images)
}

pub fn label_for(path: &Path) -> String
{
    path.parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extracts a feature vector for each image. Images that cannot be decoded
/// are logged and skipped; an engine failure aborts the whole run.
pub fn embed_all<E: FeatureEngine>(engine: &mut E, config: &AdapterConfig, images: &[PathBuf]) -> Result<Vec<LabeledFeature>>
{
    let now = std::time::Instant::now();
    let mut features = Vec::with_capacity(images.len());

    for chunk in images.chunks(DECODE_CHUNK_SIZE) {
        for (path, image) in preprocessing::load_image_batch(chunk) {
            let image = match image {
                Ok(image) => image,
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };
            let vector = extract_feature_vector(engine, config, &image)?;
            features.push(LabeledFeature { label: label_for(&path), path, vector: vector.to_vec() });
        }
    }

    info!("Embedded {} of {} images in {:?}", features.len(), images.len(), now.elapsed());
    Ok(features)
}

pub fn write_bincode(path: &Path, features: &[LabeledFeature]) -> Result<()>
{
    let writer = BufWriter::new(std::fs::File::create(path)?);
    bincode::serialize_into(writer, features)?;
    Ok(())
}

pub fn read_bincode(path: &Path) -> Result<Vec<LabeledFeature>>
{
    let reader = BufReader::new(std::fs::File::open(path)?);
    Ok(bincode::deserialize_from(reader)?)
}

pub fn write_json_lines<W: Write>(mut writer: W, features: &[LabeledFeature]) -> Result<()>
{
    for feature in features {
        serde_json::to_writer(&mut writer, feature)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::adapter::{load_engine, tests::FileEngine};
    use crate::preferences::MemoryPreferences;

    fn write_face(dir: &Path, person: &str, name: &str, value: u8) -> PathBuf
    {
        let person_dir = dir.join(person);
        std::fs::create_dir_all(&person_dir).unwrap();
        let path = person_dir.join(name);
        RgbImage::from_pixel(3, 3, Rgb([value, value, value])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_collect_images()
    {
        let dir = tempfile::tempdir().unwrap();
        let faces = dir.path().join("faces");
        let b = write_face(&faces, "bob", "1.png", 0);
        let a2 = write_face(&faces, "alice", "2.PNG", 0);
        let a1 = write_face(&faces, "alice", "1.png", 0);
        std::fs::write(faces.join("alice").join("notes.txt"), b"x").unwrap();
        let single = write_face(dir.path(), "carol", "x.jpg", 0);

        let images = collect_images(&[faces, single.clone()]).unwrap();
        assert_eq!(images, vec![a1, a2, b, single]);
    }

    #[test]
    fn missing_input_is_an_error()
    {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_images(&[dir.path().join("nope")]).is_err());
    }

    #[test]
    fn test_label_for()
    {
        assert_eq!(label_for(Path::new("faces/alice/1.png")), "alice");
        assert_eq!(label_for(Path::new("1.png")), "");
    }

    #[test]
    fn embeds_and_skips_undecodable()
    {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vgg_face.onnx"), b"model").unwrap();
        let config = AdapterConfig::resolve(&MemoryPreferences::new().with_string("key_meanValuesCaffe", "0,0,0"), dir.path());
        let mut engine: FileEngine = load_engine(&config).unwrap();

        let faces = dir.path().join("faces");
        let alice = write_face(&faces, "alice", "1.png", 50);
        let broken = faces.join("bob").join("1.png");
        std::fs::create_dir_all(broken.parent().unwrap()).unwrap();
        std::fs::write(&broken, b"not a png").unwrap();

        let features = embed_all(&mut engine, &config, &[alice.clone(), broken]).unwrap();
        assert_eq!(features, vec![LabeledFeature { label: "alice".to_string(), path: alice, vector: vec![50.0, 50.0, 50.0, 3.0, 3.0] }]);

        let out = dir.path().join("features.bin");
        write_bincode(&out, &features).unwrap();
        assert_eq!(read_bincode(&out).unwrap(), features);

        let mut lines = Vec::new();
        write_json_lines(&mut lines, &features).unwrap();
        let line = String::from_utf8(lines).unwrap();
        assert!(line.starts_with("{\"label\":\"alice\""));
        assert!(line.ends_with("[50.0,50.0,50.0,3.0,3.0]}\n"));
    }
}
