//! Artifact and story record storage for Fabula.
//!
//! # Backends
//!
//! - [`FileSystemArtifactStore`]: atomic writes under a root directory,
//!   served either from a public base URL or as `file://` locators
//! - [`MemoryArtifactStore`]: in-process store for tests and dry runs
//! - [`JsonRecordStore`] / [`MemoryRecordStore`]: story record sinks
//!
//! Artifacts live at `stories/{story_id}/audio/scene_{n}.{ext}` and
//! `stories/{story_id}/images/scene_{n}.{ext}`; see
//! [`ArtifactKey`](fabula_core::ArtifactKey).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod memory;
mod records;

pub use filesystem::FileSystemArtifactStore;
pub use memory::MemoryArtifactStore;
pub use records::{JsonRecordStore, MemoryRecordStore};
