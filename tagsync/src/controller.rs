//! Import controller - drives one reconciliation pass for a single stream.
//!
//! Computes the import decision and, when non-empty, issues exactly one
//! create call for an import request batching every qualifying tag. An empty
//! decision performs zero external calls. Errors from the store surface to
//! the caller unmodified; retries are the watch loop's responsibility via
//! event re-delivery.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{
    ImageImportSpec, ImageStream, ImageStreamImport, ImageStreamImportSpec, ObjectReference,
    RepositoryImportSpec, TagImportPolicy, DOCKER_IMAGE_KIND,
};
use crate::decision::{needs_import, ImportDecision};
use crate::store::{ImageStreamStore, Result};

/// Controller for update-triggered reconciliation passes.
pub struct ImportController {
    store: Arc<dyn ImageStreamStore>,
}

impl ImportController {
    pub fn new(store: Arc<dyn ImageStreamStore>) -> Self {
        Self { store }
    }

    /// Run one reconciliation pass over a stream.
    ///
    /// Called once per delivered update/create event. When nothing needs an
    /// import this returns without touching the store or the stream.
    pub async fn reconcile(&self, stream: &ImageStream) -> Result<()> {
        let decision = needs_import(stream);
        if decision.is_empty() {
            debug!(
                "No import needed for {}/{}",
                stream.namespace, stream.name
            );
            return Ok(());
        }

        info!(
            "Importing {}/{} (repository={}, tags={})",
            stream.namespace,
            stream.name,
            decision.repository,
            decision.tags.len()
        );
        self.store
            .create_import(build_import(stream, &decision))
            .await?;
        Ok(())
    }
}

/// Build the single import request covering every qualifying tag, plus the
/// repository pass when the repository rule fired.
fn build_import(stream: &ImageStream, decision: &ImportDecision) -> ImageStreamImport {
    let repository = decision.repository.then(|| RepositoryImportSpec {
        from: ObjectReference {
            kind: DOCKER_IMAGE_KIND.to_string(),
            name: stream.spec.docker_image_repository.clone(),
        },
        import_policy: TagImportPolicy::default(),
    });

    let images = decision
        .tags
        .iter()
        .filter_map(|tag| {
            let reference = stream.spec.tags.get(tag)?;
            let from = reference.from.clone()?;
            Some(ImageImportSpec {
                from,
                to: tag.clone(),
                import_policy: reference.import_policy,
            })
        })
        .collect();

    ImageStreamImport {
        namespace: stream.namespace.clone(),
        name: stream.name.clone(),
        spec: ImageStreamImportSpec {
            import: true,
            repository,
            images,
        },
        status: Default::default(),
    }
}
