//! tagsync: ImageStream import reconciliation core.
//!
//! Reconciles a declarative image-source description against an external
//! registry by deciding, per reconciliation pass, whether a remote import
//! must be triggered, and keeps tags flagged for periodic re-checks on a
//! background schedule.
//!
//! The persistence/watch mechanism, the registry wire protocol and the
//! pipeline that executes created import requests are external
//! collaborators, reached through the [`store::ImageStreamStore`] trait. The
//! surrounding watch loop feeds each delivered stream event to both
//! [`ImportController::reconcile`] and [`ScheduledImporter::handle`]; a
//! timer drives [`ScheduledImporter::run`].

pub mod api;
pub mod controller;
pub mod decision;
pub mod scheduler;
pub mod store;

pub use api::{ImageStream, ImageStreamImport, TagReference};
pub use controller::ImportController;
pub use decision::{needs_import, ImportDecision};
pub use scheduler::{ImportQueue, ScheduledImporter, StreamKey, StreamMark};
pub use store::{ImageStreamStore, StoreError};
