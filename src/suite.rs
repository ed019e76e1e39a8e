//! Suite configuration.
//!
//! A suite file externalizes the three fixed inputs of a sweep: the tool registry, the input
//! manifest, and the thread counts, plus the base directory everything resolves under. It is
//! plain JSON deserialized with serde; see `suite.json` at the repository root for the reference
//! suite.
//!
//! ```json
//! {
//!   "base_dir": "/mnt/data",
//!   "tools": { "flye": "quay.io/biocontainers/flye@sha256:..." },
//!   "samples": { "input/reads.fq.gz": "output/assemblers" },
//!   "thread_counts": [1, 2, 4, 8]
//! }
//! ```

use std::{
    collections::BTreeMap,
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    samples::{Manifest, ManifestError},
    tools::{Identifier, ImageReference, Registry},
};

/// A validated suite configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Suite {
    /// Absolute directory all sample paths resolve under; bind-mounted into every container.
    pub base_dir: PathBuf,
    /// Tool identifier to digest-pinned image reference.
    pub tools: BTreeMap<String, ImageReference>,
    /// Read-file path to designated output directory, both relative to `base_dir`.
    pub samples: BTreeMap<PathBuf, PathBuf>,
    /// Ordered thread sweep, e.g. `[1, 2, 4, 8]`.
    pub thread_counts: Vec<u32>,
}

impl Suite {
    /// Loads and validates a suite file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialized, if `base_dir` is not
    /// absolute, if the sweep has no tools, samples, or thread counts, if any thread count is
    /// zero, or if any manifest entry is malformed. All of these abort before any side effect.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("could not open suite file {}", path.display()))?;
        let mut suite: Self = serde_json::from_reader(file)
            .with_context(|| format!("could not deserialize suite file {}", path.display()))?;
        suite.validate()?;
        suite.thread_counts = dedup_preserving_order(&suite.thread_counts);
        Ok(suite)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !self.base_dir.is_absolute() {
            anyhow::bail!(
                "base_dir `{}` must be an absolute path",
                self.base_dir.display()
            );
        }
        if self.tools.is_empty() {
            anyhow::bail!("suite has no tools");
        }
        if self.samples.is_empty() {
            anyhow::bail!("suite has no samples");
        }
        if self.thread_counts.is_empty() {
            anyhow::bail!("suite has no thread counts");
        }
        if self.thread_counts.contains(&0) {
            anyhow::bail!("thread counts must be positive");
        }
        // Surface manifest shape errors at load time, not mid-sweep.
        self.manifest()?;
        Ok(())
    }

    /// Builds the tool registry described by this suite.
    #[must_use]
    pub fn registry(&self) -> Registry {
        Registry::new(
            self.tools
                .iter()
                .map(|(identifier, image)| (Identifier::from(identifier.clone()), image.clone()))
                .collect(),
        )
    }

    /// Builds the input manifest described by this suite.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if any entry is absolute, traverses upward, or has no file name.
    pub fn manifest(&self) -> Result<Manifest, ManifestError> {
        Manifest::new(self.samples.clone())
    }
}

fn dedup_preserving_order(counts: &[u32]) -> Vec<u32> {
    let mut seen = Vec::new();
    for &count in counts {
        if !seen.contains(&count) {
            seen.push(count);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const SUITE: &str = r#"{
        "base_dir": "/mnt/data",
        "tools": {
            "flye": "quay.io/biocontainers/flye@sha256:f895c7",
            "minimap2": "quay.io/biocontainers/minimap2@sha256:7f95ee"
        },
        "samples": {
            "input/reads.fq.gz": "output/assemblers"
        },
        "thread_counts": [1, 2, 2, 4, 8]
    }"#;

    fn write_suite(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_and_validates_reference_shape() {
        let file = write_suite(SUITE);
        let suite = Suite::load(file.path()).unwrap();

        assert_eq!(suite.base_dir, PathBuf::from("/mnt/data"));
        assert_eq!(suite.registry().len(), 2);
        assert_eq!(suite.manifest().unwrap().len(), 1);
        // duplicates collapsed, order preserved
        assert_eq!(suite.thread_counts, vec![1, 2, 4, 8]);
    }

    #[test]
    fn rejects_relative_base_dir() {
        let file = write_suite(&SUITE.replace("/mnt/data", "data"));
        assert!(Suite::load(file.path()).is_err());
    }

    #[test]
    fn rejects_tag_addressed_image() {
        let file = write_suite(&SUITE.replace(
            "quay.io/biocontainers/flye@sha256:f895c7",
            "quay.io/biocontainers/flye:2.9",
        ));
        assert!(Suite::load(file.path()).is_err());
    }

    #[test]
    fn rejects_zero_thread_count() {
        let file = write_suite(&SUITE.replace("[1, 2, 2, 4, 8]", "[0, 1]"));
        assert!(Suite::load(file.path()).is_err());
    }

    #[test]
    fn rejects_escaping_sample_path() {
        let file = write_suite(&SUITE.replace("input/reads.fq.gz", "../reads.fq.gz"));
        assert!(Suite::load(file.path()).is_err());
    }
}
