//! Background ingestion pipeline.
//!
//! Stages, in call order:
//! - **decode**: header-only probe, then bounded full decode
//! - **planner**: target size within the bounding box and decode divisor
//! - **composite**: centered, scaled draw into the target buffer
//! - **orientation**: EXIF-driven exact rotation
//! - **encode**: serialization to PNG, JPEG, or WebP
//! - **processor**: runs the stages in order
//!
//! Plus **validate** (cheap pre-decode checks) and **discovery** (finding
//! files for batch runs).

pub mod composite;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod orientation;
pub mod planner;
pub mod processor;
pub mod validate;

// Re-exports for convenient access
pub use composite::Compositor;
pub use decode::BoundedDecoder;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use encode::Encoder;
pub use orientation::OrientationCorrector;
pub use planner::{BoundingBox, Planner};
pub use processor::{compress, BackgroundCompressor};
pub use validate::Validator;
