//! sarwind: ocean surface wind retrieval from SAR backscatter
//!
//! Combines a SAR backscatter image with an auxiliary wind direction field
//! and a CMOD-class geophysical inversion model to retrieve wind speed and
//! direction on the SAR grid. Raster storage, reprojection, the inversion
//! physics and file export are external collaborators behind the traits in
//! [`io`] and [`core::inversion`].

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BackscatterObservation, GeoTransform, GridGeometry, MaskStageResult, Polarization,
    ProductPolarisation, RasterField, RetrievalMetadata, RetrievalResult, ValidityMask, WindArray,
    WindError, WindResult, WindVectorField,
};

pub use core::{
    AuxWindResolver, InversionModel, MaskCompositor, PlotFieldPreparer, PlotParams,
    RetrievalParams, TimeGapSeverity, WindRetrievalPipeline, WindSource,
};

pub use io::{AdapterQuery, AdapterRegistry, AuxSourceProvider, MemoryRasterStore, RasterStore};
