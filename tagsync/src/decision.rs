//! Reconciliation decision engine.
//!
//! Pure functions mapping a stream's spec, status and annotations to the set
//! of tags requiring an import, and to a yes/no decision for a
//! repository-wide import. When the decision is empty the caller must make
//! zero external calls and leave the stream untouched.

use std::collections::BTreeSet;

use crate::api::{ImageStream, TagReference, DOCKER_IMAGE_KIND};

/// What one reconciliation pass has to import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDecision {
    /// A pass over the whole remote repository's tag list is needed.
    pub repository: bool,
    /// Spec tags needing an import, independent of each other.
    pub tags: BTreeSet<String>,
}

impl ImportDecision {
    pub fn is_empty(&self) -> bool {
        !self.repository && self.tags.is_empty()
    }
}

/// Compute the import decision for a stream.
///
/// Repository rule: a repository-wide import is needed iff the spec names a
/// repository and the check annotation is absent. Presence of the annotation
/// suppresses the repository pass regardless of its value - it is a one-shot
/// "already attempted" latch, not a time-based retry gate.
pub fn needs_import(stream: &ImageStream) -> ImportDecision {
    let repository =
        !stream.spec.docker_image_repository.is_empty() && !stream.has_repository_check();

    let tags = stream
        .spec
        .tags
        .iter()
        .filter(|(name, tag)| tag_needs_import(stream, name, tag))
        .map(|(name, _)| name.clone())
        .collect();

    ImportDecision { repository, tags }
}

/// Whether a single spec tag needs an import.
///
/// Aliases and non-DockerImage sources never import. For the rest the
/// decision is a table over the pinned spec generation `G`, the highest
/// generation in the status history `L`, and the generation `F` recorded on
/// a failed ImportSuccess condition:
///
/// - no `L` and no `F`          -> import (first time)
/// - `G` present and `G > L`    -> import (spec moved past status)
/// - `G` present and `G > F`    -> import (spec moved past the failure)
/// - `G` present and `G == F`   -> no import (failure already evaluated at
///                                 exactly this generation; don't retry it
///                                 forever)
/// - otherwise                  -> no import
pub fn tag_needs_import(stream: &ImageStream, name: &str, tag: &TagReference) -> bool {
    if tag.reference {
        return false;
    }
    let Some(from) = &tag.from else {
        return false;
    };
    if from.kind != DOCKER_IMAGE_KIND {
        return false;
    }

    let pinned = tag.generation;
    let latest = stream.latest_tag_generation(name);
    let failed = stream.import_failure_generation(name);

    match (pinned, latest, failed) {
        (_, None, None) => true,
        (Some(g), Some(l), _) if g > l => true,
        (Some(g), _, Some(f)) if g > f => true,
        (Some(g), _, Some(f)) if g == f => false,
        _ => false,
    }
}
