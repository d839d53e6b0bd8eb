//! Trait seams for external collaborators of the Fabula pipeline.
//!
//! The pipeline treats text, speech and image generation, artifact storage,
//! and story metadata as black boxes. Each is consumed through one trait
//! here and injected at construction time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{
    ArtifactStore, ImageSynthesizer, NarrativeGenerator, SpeechSynthesizer, StoryRecordStore,
};
