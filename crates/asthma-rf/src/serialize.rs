//! Model persistence via bincode.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope around the serialized forest, as read back.
#[derive(serde::Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    forest: RandomForest,
}

/// Borrowing twin of [`ModelEnvelope`] with the same encoding.
#[derive(serde::Serialize)]
struct ModelEnvelopeRef<'a> {
    format_version: u32,
    forest: &'a RandomForest,
}

impl RandomForest {
    /// Save the model to `path`.
    ///
    /// The bytes go to a temporary file in the destination directory which is
    /// then renamed over `path`, so a concurrent reader sees either the old
    /// file or the complete new one.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | temp file creation, write, or rename failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();
        let envelope = ModelEnvelopeRef {
            format_version: FORMAT_VERSION,
            forest: self,
        };
        let bytes =
            bincode::serialize(&envelope).map_err(|source| RfError::SerializeModel { source })?;

        let write_err = |source| RfError::WriteModel {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        info!(size_bytes = bytes.len(), n_trees = self.trees.len(), "model saved");
        Ok(())
    }

    /// Load a model saved by [`RandomForest::save`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file read failed |
    /// | [`RfError::DeserializeModel`] | bincode decoding failed |
    /// | [`RfError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RfError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;
        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|source| RfError::DeserializeModel {
                path: path.to_path_buf(),
                source,
            })?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        let forest = envelope.forest;
        debug!(
            n_trees = forest.trees.len(),
            n_features = forest.n_features,
            n_classes = forest.n_classes,
            "model loaded"
        );
        Ok(forest)
    }
}
