//! Seams to the external collaborators: the raster/band store, the
//! auxiliary source-adapter registry, and an in-memory store implementation.
//!
//! File formats, network retrieval and reprojection algorithms live behind
//! these traits and are not implemented in this crate.

pub mod memory;
pub mod registry;
pub mod store;

pub use memory::MemoryRasterStore;
pub use registry::{AdapterQuery, AdapterRegistry, AuxLocator, AuxSourceProvider, SourceAdapter};
pub use store::{BandMeta, BandSelector, RasterStore, ResampleAlg};
