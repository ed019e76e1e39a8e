//! Utilities for describing and resolving benchmarked tools.
//!
//! The central type here is the [`Registry`]: an immutable mapping from short tool identifiers
//! (e.g. `flye`) to digest-pinned container image references. The registry is built once from
//! configuration and passed explicitly to the sweep; it is the single source of truth for which
//! exact container build backs each tool name, so no invocation ever hardcodes an image reference.
//!
//! # Examples
//!
//! ```
//! use asm_bench::tools::{Identifier, ImageReference, Registry};
//!
//! let registry = Registry::new(vec![(
//!     Identifier::from("flye"),
//!     ImageReference::parse("quay.io/biocontainers/flye@sha256:f895c7").unwrap(),
//! )]);
//!
//! let tool = registry.resolve(&Identifier::from("flye")).unwrap();
//! assert_eq!(tool.image.to_string(), "quay.io/biocontainers/flye@sha256:f895c7");
//! ```

use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod command;

pub use command::{AssemblerCommand, ProfiledCommand};

/// Unique identifier for a tool.
///
/// # Examples
///
/// ```
/// use asm_bench::tools::Identifier;
///
/// let identifier = Identifier::from("flye");
///
/// assert_eq!(identifier.to_string(), "flye");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A content-digest container image reference (`repository@sha256:<hex>`).
///
/// Digest-addressed references are the reproducibility anchor of the harness: every benchmark run
/// for a given tool must use byte-identical tool code, which a mutable tag cannot guarantee.
/// [`ImageReference::parse`] therefore rejects anything that is not digest-pinned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ImageReference(String);

impl ImageReference {
    /// Parses a digest-pinned image reference.
    ///
    /// # Errors
    ///
    /// Returns [`ImageReferenceError`] if the reference is not of the form
    /// `repository@<algorithm>:<digest>`.
    pub fn parse(reference: &str) -> Result<Self, ImageReferenceError> {
        let Some((repository, digest)) = reference.split_once('@') else {
            return Err(ImageReferenceError(reference.to_string()));
        };
        if repository.is_empty() || !digest.contains(':') {
            return Err(ImageReferenceError(reference.to_string()));
        }
        Ok(Self(reference.to_string()))
    }

    /// Returns the full reference as a string slice, suitable for `docker pull`/`docker run`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ImageReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ImageReference {
    type Error = ImageReferenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

/// Error raised for image references that are not digest-pinned.
#[derive(Debug, Error)]
#[error("image reference `{0}` is not digest-pinned (expected `repository@sha256:<digest>`)")]
pub struct ImageReferenceError(String);

/// Total representation of a benchmarked tool.
///
/// Immutable; constructed from configuration at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique identifier for this tool.
    pub identifier: Identifier,
    /// Digest-pinned container image backing this tool.
    pub image: ImageReference,
}

/// Error raised when a tool identifier is not present in the registry.
#[derive(Debug, Error)]
#[error("unknown tool `{0}`: not present in the tool registry")]
pub struct UnknownTool(pub Identifier);

/// Immutable mapping from tool identifier to descriptor.
///
/// Iteration order is the identifier order, so provisioning and sweeping are deterministic across
/// runs. The registry may pin more images than are swept: auxiliary tools (aligners, polishers
/// consumed by the offline accuracy comparison) are provisioned alongside the assemblers but only
/// descriptors with an [`AssemblerCommand`] strategy participate in the sweep.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    tools: BTreeMap<Identifier, ToolDescriptor>,
}

impl Registry {
    /// Creates a registry from (identifier, image) pairs.
    #[must_use]
    pub fn new(entries: Vec<(Identifier, ImageReference)>) -> Self {
        Self {
            tools: entries
                .into_iter()
                .map(|(identifier, image)| {
                    (identifier.clone(), ToolDescriptor { identifier, image })
                })
                .collect(),
        }
    }

    /// Resolves an identifier to its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTool`] if the identifier is absent. This is a configuration error and
    /// aborts the run.
    pub fn resolve(&self, identifier: &Identifier) -> Result<&ToolDescriptor, UnknownTool> {
        self.tools
            .get(identifier)
            .ok_or_else(|| UnknownTool(identifier.clone()))
    }

    /// Iterates all descriptors, in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// Iterates the descriptors that have an invocation strategy, paired with it.
    ///
    /// Each strategy is resolved from the descriptor's own identifier, so a strategy can never run
    /// against another tool's image.
    pub fn assemblers(&self) -> impl Iterator<Item = (&ToolDescriptor, AssemblerCommand)> {
        self.tools.values().filter_map(|descriptor| {
            AssemblerCommand::for_tool(&descriptor.identifier).map(|command| (descriptor, command))
        })
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::new(vec![
            (
                Identifier::from("flye"),
                ImageReference::parse("quay.io/biocontainers/flye@sha256:f895c7").unwrap(),
            ),
            (
                Identifier::from("minimap2"),
                ImageReference::parse("quay.io/biocontainers/minimap2@sha256:7f95ee").unwrap(),
            ),
            (
                Identifier::from("raven"),
                ImageReference::parse("quay.io/biocontainers/raven-assembler@sha256:3bc4cc")
                    .unwrap(),
            ),
        ])
    }

    #[test]
    fn resolve_known_tool() {
        let registry = registry();
        let tool = registry.resolve(&Identifier::from("flye")).unwrap();
        assert_eq!(tool.identifier, Identifier::from("flye"));
        assert_eq!(
            tool.image.as_str(),
            "quay.io/biocontainers/flye@sha256:f895c7"
        );
    }

    #[test]
    fn resolve_unknown_tool_fails() {
        let registry = registry();
        let err = registry.resolve(&Identifier::from("toyasm")).unwrap_err();
        assert!(err.to_string().contains("toyasm"));
    }

    #[test]
    fn assemblers_skip_auxiliary_tools() {
        let registry = registry();
        let swept: Vec<_> = registry
            .assemblers()
            .map(|(descriptor, _)| descriptor.identifier.to_string())
            .collect();
        // minimap2 is provisioned but has no invocation strategy.
        assert_eq!(swept, vec!["flye", "raven"]);
    }

    #[test]
    fn image_reference_rejects_tag_only() {
        assert!(ImageReference::parse("quay.io/biocontainers/flye:2.9").is_err());
        assert!(ImageReference::parse("@sha256:f895c7").is_err());
        assert!(ImageReference::parse("flye@latest").is_err());
    }

    #[test]
    fn image_reference_accepts_digest() {
        let image = ImageReference::parse("quay.io/biocontainers/flye@sha256:f895c7").unwrap();
        assert_eq!(image.to_string(), "quay.io/biocontainers/flye@sha256:f895c7");
    }
}
