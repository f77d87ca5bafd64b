//! Reader for the MNIST handwritten digits in their IDX encoding.
//!
//! Every 28x28 image is flattened into a row of 784 pixels scaled to `[0, 1]`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;
use ndarray::{Array1, Array2};

use super::{Dataset, Splits};
use crate::{MlErr, Result};

pub const N_CLASSES: usize = 10;

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;

const TRAIN_IMAGES: [&str; 2] = ["train-images-idx3-ubyte", "train-images.idx3-ubyte"];
const TRAIN_LABELS: [&str; 2] = ["train-labels-idx1-ubyte", "train-labels.idx1-ubyte"];
const TEST_IMAGES: [&str; 2] = ["t10k-images-idx3-ubyte", "t10k-images.idx3-ubyte"];
const TEST_LABELS: [&str; 2] = ["t10k-labels-idx1-ubyte", "t10k-labels.idx1-ubyte"];

/// Loads the MNIST train and test files found in `dir`.
///
/// The last `validation_size` training images become the validation split.
///
/// # Arguments
/// * `dir` - The directory holding the four (uncompressed) IDX files.
/// * `validation_size` - The amount of training images held out for validation.
///
/// # Returns
/// The train, validation and test splits.
pub fn load<P: AsRef<Path>>(dir: P, validation_size: usize) -> Result<Splits> {
    let dir = dir.as_ref();

    let train_x = read_images(&locate(dir, &TRAIN_IMAGES))?;
    let train_y = read_labels(&locate(dir, &TRAIN_LABELS))?;
    let test_x = read_images(&locate(dir, &TEST_IMAGES))?;
    let test_y = read_labels(&locate(dir, &TEST_LABELS))?;

    let mut train = Dataset::new(train_x, train_y, N_CLASSES)?;
    let valid = train.split_off(validation_size)?;
    let test = Dataset::new(test_x, test_y, N_CLASSES)?;

    info!(
        "loaded MNIST from {}: {} train, {} validation, {} test samples",
        dir.display(),
        train.len(),
        valid.len(),
        test.len()
    );

    Splits::new(train, valid, test)
}

/// Reads an IDX3 image file into a `N x (rows * cols)` matrix.
pub fn read_images(path: &Path) -> Result<Array2<f32>> {
    let bytes = fs::read(path)?;
    parse_images(&bytes).map_err(|reason| invalid(path, reason))
}

/// Reads an IDX1 label file.
pub fn read_labels(path: &Path) -> Result<Array1<usize>> {
    let bytes = fs::read(path)?;
    parse_labels(&bytes).map_err(|reason| invalid(path, reason))
}

/// Decodes the contents of an IDX3 image file.
pub fn parse_images(data: &[u8]) -> std::result::Result<Array2<f32>, String> {
    let mut offset = 0;
    let magic = read_be_u32(data, &mut offset)?;
    if magic != IMAGES_MAGIC {
        return Err(format!("bad magic number {magic:#x}, expected {IMAGES_MAGIC:#x}"));
    }

    let count = read_be_u32(data, &mut offset)? as usize;
    let rows = read_be_u32(data, &mut offset)? as usize;
    let cols = read_be_u32(data, &mut offset)? as usize;
    let (image_size, len) = rows
        .checked_mul(cols)
        .and_then(|size| Some((size, size.checked_mul(count)?)))
        .ok_or_else(|| format!("header sizes overflow: {count} images of {rows}x{cols}"))?;

    let pixels = body(data, offset, len)?;
    let images: Vec<f32> = pixels.iter().map(|&p| p as f32 / 255.0).collect();

    Array2::from_shape_vec((count, image_size), images).map_err(|e| e.to_string())
}

/// Decodes the contents of an IDX1 label file.
pub fn parse_labels(data: &[u8]) -> std::result::Result<Array1<usize>, String> {
    let mut offset = 0;
    let magic = read_be_u32(data, &mut offset)?;
    if magic != LABELS_MAGIC {
        return Err(format!("bad magic number {magic:#x}, expected {LABELS_MAGIC:#x}"));
    }

    let count = read_be_u32(data, &mut offset)? as usize;
    let labels = body(data, offset, count)?;

    Ok(labels.iter().map(|&l| l as usize).collect())
}

fn read_be_u32(data: &[u8], offset: &mut usize) -> std::result::Result<u32, String> {
    let bytes = data
        .get(*offset..*offset + 4)
        .ok_or_else(|| format!("truncated header at byte {offset}"))?;

    *offset += 4;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn body(data: &[u8], offset: usize, len: usize) -> std::result::Result<&[u8], String> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| format!("header sizes overflow: {len} bytes of data"))?;

    data.get(offset..end).ok_or_else(|| {
        format!(
            "truncated: expected {len} bytes of data, found {}",
            data.len().saturating_sub(offset)
        )
    })
}

/// The first candidate that exists in `dir`, or the first candidate if none does so the error
/// names the canonical file.
fn locate(dir: &Path, candidates: &[&str]) -> PathBuf {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| dir.join(candidates[0]))
}

fn invalid(path: &Path, reason: String) -> MlErr {
    MlErr::InvalidIdx {
        path: path.to_path_buf(),
        reason,
    }
}
