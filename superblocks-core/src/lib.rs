//! Superblock planning on urban street networks.
//!
//! The crate partitions a street network into superblocks bounded by
//! high-capacity arterials, subdivides them into blocks enclosed by internal
//! streets, and derives an access-control plan (one-way conversions, modal
//! filters, permeability scores) that keeps motor through-traffic out while
//! preserving local access.
//!
//! The [`pipeline::Pipeline`] chains every stage over an immutable
//! [`pipeline::PipelineState`]; the stage building blocks are public in
//! [`streets`], [`algo`] and [`geometry`].

pub mod algo;
pub mod error;
pub mod export;
pub mod geometry;
pub mod loading;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod prelude;
pub mod streets;

pub use error::Error;
pub use loading::PipelineConfig;
