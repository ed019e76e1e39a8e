//! Container provisioning for benchmarked tools.
//!
//! Ensures the digest-pinned image behind each registry entry is present on the local Docker
//! daemon before the sweep runs it. Provisioning is idempotent: installing an already present
//! image is a no-op, so a resumed sweep can always re-provision safely.

use bollard::{errors::Error as DockerError, image::CreateImageOptions, Docker};
use futures::TryStreamExt;
use thiserror::Error;

use crate::tools::ToolDescriptor;

/// Error raised when an image cannot be provisioned.
#[derive(Debug, Error)]
#[error("could not install image `{image}` for tool `{tool}`: {source}")]
pub struct InstallError {
    /// Identifier of the tool being provisioned.
    pub tool: String,
    /// The image reference that failed to install.
    pub image: String,
    /// Underlying Docker error.
    #[source]
    pub source: DockerError,
}

/// Idempotent image installation.
///
/// The sweep calls [`Provisioner::install`] exactly once per registry entry before executing any
/// combination; fakes implement this trait in tests.
pub trait Provisioner {
    /// Ensures the descriptor's image is present, pulling it if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError`] if the image can neither be found locally nor pulled. Provisioning
    /// failures are fatal for the whole run.
    fn install(
        &self,
        descriptor: &ToolDescriptor,
    ) -> impl std::future::Future<Output = Result<(), InstallError>>;
}

/// [`Provisioner`] backed by the local Docker daemon.
pub struct DockerProvisioner<'a> {
    docker: &'a Docker,
}

impl<'a> DockerProvisioner<'a> {
    /// Creates a provisioner over an established daemon connection.
    #[must_use]
    pub fn new(docker: &'a Docker) -> Self {
        Self { docker }
    }
}

impl Provisioner for DockerProvisioner<'_> {
    async fn install(&self, descriptor: &ToolDescriptor) -> Result<(), InstallError> {
        let image = descriptor.image.as_str();

        match self.docker.inspect_image(image).await {
            Ok(_) => {
                log::debug!(
                    "[{}] image {image} already present, skipping pull",
                    descriptor.identifier
                );
                return Ok(());
            }
            Err(DockerError::DockerResponseServerError {
                status_code: 404, ..
            }) => {}
            Err(source) => {
                return Err(InstallError {
                    tool: descriptor.identifier.to_string(),
                    image: image.to_string(),
                    source,
                });
            }
        }

        log::info!("[{}] pulling image {image}...", descriptor.identifier);
        self.docker
            .create_image(
                Some(CreateImageOptions {
                    from_image: image.to_string(),
                    ..Default::default()
                }),
                None,
                None,
            )
            .try_for_each(|progress| async move {
                if let Some(status) = progress.status {
                    log::trace!("pull progress: {status}");
                }
                Ok(())
            })
            .await
            .map_err(|source| InstallError {
                tool: descriptor.identifier.to_string(),
                image: image.to_string(),
                source,
            })?;
        log::info!("[{}] pulled image {image}", descriptor.identifier);

        Ok(())
    }
}
