//! Persistence of the best parameters found so far.
//!
//! A checkpoint is a safetensors file holding one `F32` tensor per entry of the model's
//! `layout`, e.g. `W` and `b` for a `LogisticRegression`. Saving overwrites the previous file.

use std::{collections::HashMap, fs, path::Path};

use log::debug;
use safetensors::{
    SafeTensors,
    tensor::{Dtype, TensorView},
};

use crate::{MlErr, Result, arch::TensorSpec};

const FORMAT: &str = "logreg";

/// Writes `params` to `path`, split into the tensors described by `layout`.
///
/// The file is first written next to `path` and then renamed over it, so a failed write never
/// leaves a half written checkpoint behind.
pub fn save(path: &Path, layout: &[TensorSpec], params: &[f32]) -> Result<()> {
    let expected: usize = layout.iter().map(TensorSpec::len).sum();
    if params.len() != expected {
        return Err(MlErr::SizeMismatch {
            what: "checkpoint params",
            got: params.len(),
            expected,
        });
    }

    let mut views = Vec::with_capacity(layout.len());
    let mut offset = 0;

    for spec in layout {
        let raw = &params[offset..offset + spec.len()];
        let view = TensorView::new(Dtype::F32, spec.shape.clone(), bytemuck::cast_slice(raw))
            .map_err(|e| MlErr::Checkpoint(format!("tensor {}: {e}", spec.name)))?;

        views.push((spec.name, view));
        offset += spec.len();
    }

    let mut metadata = HashMap::new();
    metadata.insert("format".to_string(), FORMAT.to_string());

    let bytes = safetensors::serialize(views.iter().map(|(name, view)| (*name, view)), &Some(metadata))
        .map_err(|e| MlErr::Checkpoint(format!("serialization failed: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;

    debug!(path:% = path.display(); "checkpoint written");
    Ok(())
}

/// Reads a checkpoint written by `save` back into a flat parameter buffer.
///
/// # Errors
/// If the file holds other tensors than the ones in `layout`, or their dtype or shape differ.
pub fn load(path: &Path, layout: &[TensorSpec]) -> Result<Vec<f32>> {
    let bytes = fs::read(path)?;
    let tensors = SafeTensors::deserialize(&bytes)
        .map_err(|e| MlErr::Checkpoint(format!("{}: {e}", path.display())))?;

    let stored = tensors.names().len();
    if stored != layout.len() {
        return Err(MlErr::Checkpoint(format!(
            "{} holds {stored} tensors, expected {}",
            path.display(),
            layout.len()
        )));
    }

    let mut params = Vec::with_capacity(layout.iter().map(TensorSpec::len).sum());

    for spec in layout {
        let view = tensors
            .tensor(spec.name)
            .map_err(|e| MlErr::Checkpoint(format!("tensor {}: {e}", spec.name)))?;

        if view.dtype() != Dtype::F32 {
            return Err(MlErr::Checkpoint(format!(
                "tensor {} has dtype {:?}, expected F32",
                spec.name,
                view.dtype()
            )));
        }

        if view.shape() != spec.shape.as_slice() {
            return Err(MlErr::Checkpoint(format!(
                "tensor {} has shape {:?}, expected {:?}",
                spec.name,
                view.shape(),
                spec.shape
            )));
        }

        params.extend(
            view.data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use std::{env, path::PathBuf};

    use super::*;
    use crate::arch::{LogisticRegression, Model};

    fn tmp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("checkpoint-{}-{name}.safetensors", std::process::id()))
    }

    #[test]
    fn stores_exactly_w_and_b() {
        let model = LogisticRegression::new(3, 2);
        let params: Vec<f32> = (0..model.size()).map(|i| i as f32 * 0.5).collect();
        let path = tmp_path("layout");

        save(&path, &model.layout(), &params).unwrap();
        let bytes = fs::read(&path).unwrap();
        let tensors = SafeTensors::deserialize(&bytes).unwrap();

        let mut names = tensors.names();
        names.sort();
        assert_eq!(names, ["W", "b"]);
        assert_eq!(tensors.tensor("W").unwrap().shape(), &[3, 2]);
        assert_eq!(tensors.tensor("b").unwrap().shape(), &[2]);

        let loaded = load(&path, &model.layout()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn saving_again_overwrites() {
        let model = LogisticRegression::new(2, 2);
        let path = tmp_path("overwrite");

        save(&path, &model.layout(), &[1.0; 6]).unwrap();
        save(&path, &model.layout(), &[2.0; 6]).unwrap();

        let loaded = load(&path, &model.layout()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, vec![2.0; 6]);
    }

    #[test]
    fn layout_mismatches_are_rejected() {
        let model = LogisticRegression::new(2, 2);
        let path = tmp_path("mismatch");

        assert!(save(&path, &model.layout(), &[0.0; 5]).is_err());

        save(&path, &model.layout(), &[0.0; 6]).unwrap();
        let other = LogisticRegression::new(3, 2);
        let err = load(&path, &other.layout());
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, Err(MlErr::Checkpoint(_))));
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let model = LogisticRegression::new(1, 1);
        let blocker = tmp_path("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let result = save(&blocker.join("model.safetensors"), &model.layout(), &[0.0; 2]);
        fs::remove_file(&blocker).unwrap();
        assert!(result.is_err());
    }
}
