//! Runtime configuration objects created once at startup.

pub mod main_tags;

pub use main_tags::MainTagsRegistry;
