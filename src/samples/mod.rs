//! Utilities for describing the benchmark input set.
//!
//! The [`Manifest`] is a fixed, deterministically ordered set of [`Sample`]s: read files to
//! assemble, each with a designated output directory. Both paths are strictly relative and only
//! ever resolved under the configured base directory, so a manifest can never write outside the
//! benchmark data tree.

use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised while validating manifest entries.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A sample or output path was absolute or escaped the base directory.
    #[error("path `{0}` must be relative to the base directory (no absolute paths, no `..`)")]
    EscapesBase(PathBuf),
    /// A sample path had no final file-name segment.
    #[error("sample path `{0}` has no file name")]
    NoFileName(PathBuf),
}

/// One input read file and its designated output directory.
///
/// Immutable; built from configuration at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Read-file path, relative to the base directory.
    pub relative_path: PathBuf,
    /// Output directory, relative to the base directory.
    pub output_dir: PathBuf,
}

impl Sample {
    /// Validates and constructs a sample.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if either path is absolute, traverses upward, or the read-file
    /// path has no final segment. Manifest shape errors abort configuration loading.
    pub fn new(relative_path: PathBuf, output_dir: PathBuf) -> Result<Self, ManifestError> {
        validate_relative(&relative_path)?;
        validate_relative(&output_dir)?;
        if relative_path.file_name().is_none() {
            return Err(ManifestError::NoFileName(relative_path));
        }
        Ok(Self {
            relative_path,
            output_dir,
        })
    }

    /// The derived sample name: the final path segment of the read-file path.
    ///
    /// This is the `<sample>` component of every transcript and artifact filename the sweep
    /// produces for this input.
    #[must_use]
    pub fn name(&self) -> String {
        self.relative_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Absolute path of the read file under `base`.
    #[must_use]
    pub fn input_path(&self, base: &Path) -> PathBuf {
        base.join(&self.relative_path)
    }

    /// Absolute path of the output directory under `base`.
    #[must_use]
    pub fn output_path(&self, base: &Path) -> PathBuf {
        base.join(&self.output_dir)
    }
}

fn validate_relative(path: &Path) -> Result<(), ManifestError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir));
    if escapes {
        return Err(ManifestError::EscapesBase(path.to_path_buf()));
    }
    Ok(())
}

/// The fixed set of inputs for a sweep.
///
/// Finite and restartable: the sweep iterates it once per thread count, and iteration order is
/// the read-file path order regardless of configuration file order.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    samples: Vec<Sample>,
}

impl Manifest {
    /// Builds a manifest from a (read-file path -> output directory) map.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if any entry fails validation.
    pub fn new(entries: BTreeMap<PathBuf, PathBuf>) -> Result<Self, ManifestError> {
        let samples = entries
            .into_iter()
            .map(|(relative_path, output_dir)| Sample::new(relative_path, output_dir))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { samples })
    }

    /// Iterates the samples, in read-file path order.
    pub fn entries(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the manifest is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
