//! Artifact layout for a training run.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::domain::{ArtifactName, FeatureOrder};
use crate::IoError;

/// Places one run's artifacts in an output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Files are named `{name}_model.bin`, `{name}_features.json` and
/// `{name}_evaluation.json`. The writer never encodes the model itself: the
/// caller saves it to [`ArtifactWriter::model_path`].
pub struct ArtifactWriter {
    output_dir: PathBuf,
    name: ArtifactName,
}

impl ArtifactWriter {
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), name = %name))]
    pub fn new(output_dir: &Path, name: ArtifactName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            name,
        })
    }

    #[must_use]
    pub fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// `{output_dir}/{name}_model.bin`. Does not write anything.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        model_path(&self.output_dir, &self.name)
    }

    #[must_use]
    pub fn features_path(&self) -> PathBuf {
        features_path(&self.output_dir, &self.name)
    }

    #[must_use]
    pub fn evaluation_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_evaluation.json", self.name.as_str()))
    }

    /// Write the feature order as a JSON array to `{name}_features.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_feature_order(&self, order: &FeatureOrder) -> Result<PathBuf, IoError> {
        let path = self.features_path();
        write_json(&path, order)?;
        info!(path = %path.display(), n_features = order.len(), "feature order written");
        Ok(path)
    }

    /// Write an evaluation summary to `{name}_evaluation.json`.
    ///
    /// The summary is wrapped with the artifact name so files from different
    /// runs stay self-describing.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`] if `summary` fails to serialize and
    /// [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_evaluation<T: Serialize>(&self, summary: &T) -> Result<PathBuf, IoError> {
        let path = self.evaluation_path();
        let artifact = EvaluationArtifact {
            artifact: self.name.as_str(),
            evaluation: summary,
        };
        write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation written");
        Ok(path)
    }
}

/// `{dir}/{name}_model.bin`.
#[must_use]
pub fn model_path(dir: &Path, name: &ArtifactName) -> PathBuf {
    dir.join(format!("{}_model.bin", name.as_str()))
}

fn features_path(dir: &Path, name: &ArtifactName) -> PathBuf {
    dir.join(format!("{}_features.json", name.as_str()))
}

/// Read `{dir}/{name}_features.json` written by [`ArtifactWriter::write_feature_order`].
///
/// # Errors
///
/// Returns [`IoError::ReadFile`] if the file cannot be read and
/// [`IoError::Json`] if it is not a valid feature order.
#[instrument(skip_all, fields(dir = %dir.display(), name = %name))]
pub fn read_feature_order(dir: &Path, name: &ArtifactName) -> Result<FeatureOrder, IoError> {
    let path = features_path(dir, name);
    let text = fs::read_to_string(&path).map_err(|e| IoError::ReadFile {
        path: path.clone(),
        source: e,
    })?;
    let order: FeatureOrder =
        serde_json::from_str(&text).map_err(|e| IoError::Json { path, source: e })?;
    debug!(n_features = order.len(), "feature order loaded");
    Ok(order)
}

/// Serialize to pretty JSON in a sibling temp file, then rename over `path`.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IoError> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    let write_err = |source| IoError::WriteFile {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&json).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[derive(Serialize)]
struct EvaluationArtifact<'a, T: Serialize> {
    artifact: &'a str,
    evaluation: &'a T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn writer(dir: &Path, name: &str) -> ArtifactWriter {
        ArtifactWriter::new(dir, ArtifactName::new(name.into()).unwrap()).unwrap()
    }

    #[test]
    fn paths_use_artifact_name() {
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path(), "run_a");
        assert_eq!(w.model_path(), dir.path().join("run_a_model.bin"));
        assert_eq!(w.features_path(), dir.path().join("run_a_features.json"));
        assert_eq!(w.evaluation_path(), dir.path().join("run_a_evaluation.json"));
    }

    #[test]
    fn feature_order_round_trip() {
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path(), "asthma");
        w.write_feature_order(&FeatureOrder::selected()).unwrap();

        let back = read_feature_order(dir.path(), w.name()).unwrap();
        assert_eq!(back, FeatureOrder::selected());
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(w.features_path()).unwrap()).unwrap();
        assert_eq!(raw[0], "Age");
    }

    #[test]
    fn evaluation_json_structure() {
        #[derive(Serialize)]
        struct Summary {
            accuracy: f64,
        }
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path(), "eval_test");
        w.write_evaluation(&Summary { accuracy: 0.9 }).unwrap();

        let content: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(w.evaluation_path()).unwrap()).unwrap();
        assert_eq!(content["artifact"], "eval_test");
        assert_eq!(content["evaluation"]["accuracy"], 0.9);
    }

    #[test]
    fn overwrite_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path(), "asthma");
        fs::write(w.features_path(), "stale").unwrap();
        w.write_feature_order(&FeatureOrder::selected()).unwrap();
        w.write_feature_order(&FeatureOrder::selected()).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(read_feature_order(dir.path(), w.name()).is_ok());
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("deep");
        writer(&nested, "n").write_feature_order(&FeatureOrder::selected()).unwrap();
        assert!(nested.join("n_features.json").exists());
    }

    #[test]
    fn read_errors() {
        let dir = TempDir::new().unwrap();
        let name = ArtifactName::default();
        assert!(matches!(
            read_feature_order(dir.path(), &name),
            Err(IoError::ReadFile { .. })
        ));
        fs::write(dir.path().join("asthma_features.json"), "{\"not\": \"a list\"}").unwrap();
        assert!(matches!(
            read_feature_order(dir.path(), &name),
            Err(IoError::Json { .. })
        ));
    }
}
