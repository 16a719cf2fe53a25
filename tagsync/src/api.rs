//! ImageStream object model.
//!
//! These are the wire-shaped objects owned by the external object store. The
//! core only reads a stream's spec, status and annotations to decide whether
//! an import request must be created; it never writes a stream back. Status
//! and annotation updates are the import pipeline's job after a real import
//! ran.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Annotation marking that a repository-wide check has already been
/// attempted. Presence alone is the latch; the value is diagnostic only and
/// is never parsed by the core.
pub const REPOSITORY_CHECK_ANNOTATION: &str = "tagsync.dev/repository-check";

/// Source kind that can be imported from a remote registry. Any other kind
/// never triggers an import.
pub const DOCKER_IMAGE_KIND: &str = "DockerImage";

/// Condition type recording the outcome of the last import attempt for a
/// status tag.
pub const IMPORT_SUCCESS_CONDITION: &str = "ImportSuccess";

/// An image stream: a named set of tags pointing at remote image coordinates
/// or at other tags, plus the recorded import history per tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStream {
    pub namespace: String,
    pub name: String,
    pub uid: String,
    /// Opaque version token from the object store, used for optimistic
    /// concurrency by the scheduler's entry marks.
    pub resource_version: String,
    /// Increments on every spec change.
    pub generation: i64,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(default)]
    pub spec: ImageStreamSpec,
    #[serde(default)]
    pub status: ImageStreamStatus,
}

impl ImageStream {
    /// Whether the repository-wide check latch is set.
    pub fn has_repository_check(&self) -> bool {
        self.annotations.contains_key(REPOSITORY_CHECK_ANNOTATION)
    }

    /// Highest generation recorded in the status history of a tag, `None`
    /// when the tag has no history at all.
    pub fn latest_tag_generation(&self, tag: &str) -> Option<i64> {
        self.status
            .tags
            .get(tag)?
            .items
            .iter()
            .map(|event| event.generation)
            .max()
    }

    /// Generation recorded on the `ImportSuccess` condition when the last
    /// import of this tag failed, `None` when there is no such condition or
    /// the condition does not report a failure.
    pub fn import_failure_generation(&self, tag: &str) -> Option<i64> {
        self.status
            .tags
            .get(tag)?
            .conditions
            .iter()
            .find(|c| c.condition_type == IMPORT_SUCCESS_CONDITION && c.status == ConditionStatus::False)
            .map(|c| c.generation)
    }
}

/// Desired state of an image stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStreamSpec {
    /// Optional whole remote repository to mirror every tag from. Empty
    /// means no repository-wide import.
    #[serde(default)]
    pub docker_image_repository: String,
    #[serde(default)]
    pub tags: HashMap<String, TagReference>,
}

/// Observed state of an image stream, written by the import pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStreamStatus {
    #[serde(default)]
    pub tags: HashMap<String, TagEventList>,
}

/// A typed reference to an image source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub kind: String,
    pub name: String,
}

/// A single spec tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagReference {
    /// Where this tag points. `None` or a non-DockerImage kind is never
    /// imported from a registry.
    pub from: Option<ObjectReference>,
    /// Alias flag: the tag mirrors another tag's resolution and must never
    /// trigger a remote import on its own.
    #[serde(default)]
    pub reference: bool,
    /// Pinned generation the spec demands be reflected in status.
    #[serde(default)]
    pub generation: Option<i64>,
    #[serde(default)]
    pub import_policy: TagImportPolicy,
}

/// Import behavior for a tag. `scheduled` opts the tag into recurring
/// background re-checks; `insecure` travels with the import request so the
/// import pipeline can relax TLS verification. Neither influences the
/// decision itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagImportPolicy {
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub scheduled: bool,
}

/// Recorded import history and conditions for one status tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEventList {
    #[serde(default)]
    pub items: Vec<TagEvent>,
    #[serde(default)]
    pub conditions: Vec<TagEventCondition>,
}

/// One recorded import result for a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEvent {
    #[serde(default)]
    pub docker_image_reference: String,
    #[serde(default)]
    pub image: String,
    pub generation: i64,
}

/// Tri-state condition status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// A condition on a status tag, evaluated against a spec generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEventCondition {
    pub condition_type: String,
    pub status: ConditionStatus,
    /// Spec generation the condition was last evaluated against.
    pub generation: i64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

/// One-shot import request, consumed and completed by the external import
/// pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStreamImport {
    pub namespace: String,
    pub name: String,
    pub spec: ImageStreamImportSpec,
    #[serde(default)]
    pub status: ImageStreamImportStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStreamImportSpec {
    /// Always true for requests created by this core: the pipeline should
    /// actually run the import, not just validate it.
    pub import: bool,
    /// Present when a repository-wide pass over the remote repository's tag
    /// list is requested.
    #[serde(default)]
    pub repository: Option<RepositoryImportSpec>,
    #[serde(default)]
    pub images: Vec<ImageImportSpec>,
}

/// Request to import every tag of a remote repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryImportSpec {
    pub from: ObjectReference,
    #[serde(default)]
    pub import_policy: TagImportPolicy,
}

/// Request to import a single image coordinate into a named tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageImportSpec {
    pub from: ObjectReference,
    /// Spec tag the imported image lands in.
    pub to: String,
    #[serde(default)]
    pub import_policy: TagImportPolicy,
}

/// Per-image results written back by the import pipeline. Opaque to this
/// core beyond "the create call succeeded or failed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStreamImportStatus {
    #[serde(default)]
    pub images: Vec<ImageImportStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageImportStatus {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}
