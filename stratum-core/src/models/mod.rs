//! Data model shared between the index engine and its callers.

pub mod attachment;
pub mod change;
pub mod constraint;
pub mod exported;
pub mod global;
pub mod metadata;
pub mod resource;

pub use attachment::{Attachment, AttachmentType, CompressionScheme};
pub use change::{ChangeEvent, ChangeKind};
pub use constraint::{ConstraintOp, DatabaseConstraint};
pub use exported::ExportedResource;
pub use global::GlobalPropertyId;
pub use metadata::MetadataKind;
pub use resource::ResourceLevel;
