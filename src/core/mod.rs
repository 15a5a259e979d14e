//! Core wind retrieval modules

pub mod aux_wind;
pub mod decompose;
pub mod frame;
pub mod inversion;
pub mod mask;
pub mod pipeline;
pub mod plot;
pub mod timecheck;

// Re-export main types
pub use aux_wind::{AuxWindResolver, WindSource};
pub use decompose::decompose;
pub use frame::{direction_from, normalize_degrees, speed_from, to_geographic};
pub use inversion::{polarization_ratio, InversionModel, WindInversionEngine};
pub use mask::{CompositedMask, MaskCompositor};
pub use pipeline::{RetrievalParams, WindRetrievalPipeline, DEFAULT_WIND_ADAPTER};
pub use plot::{PlotField, PlotFieldPreparer, PlotParams};
pub use timecheck::TimeGapSeverity;
