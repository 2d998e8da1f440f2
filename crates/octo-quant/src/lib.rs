//! Deterministic palette construction and palette-index mapping.
//!
//! The quantizer is an adaptively pruned octree over 8-bit RGB. It is fed
//! sampled pixels from every frame of a job, pruned to at most 256 leaves,
//! and walked once to produce the shared global palette. The indexer then
//! maps each frame onto that palette, either directly or with
//! Floyd-Steinberg error diffusion.

pub mod indexer;
pub mod octree;

pub use indexer::{index_frame, sample_frame, sampling_stride, MAX_TRAINING_SAMPLES};
pub use octree::OctreeQuantizer;
