//! # stratum-core
//!
//! Foundation crate for the Stratum medical-imaging index.
//! Defines the types, traits, errors, and configuration shared by the
//! storage engine. Every other crate in the workspace depends on this.

pub mod config;
pub mod dicom;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::MainTagsRegistry;
pub use dicom::{DicomMap, DicomTag};
pub use errors::{StratumError, StratumResult};
pub use models::{
    Attachment, AttachmentType, ChangeEvent, ChangeKind, CompressionScheme, DatabaseConstraint,
    ExportedResource, ResourceLevel,
};
