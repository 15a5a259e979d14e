use crate::core::aux_wind::{AuxWindResolver, WindSource};
use crate::core::decompose::decompose;
use crate::core::inversion::{InversionModel, WindInversionEngine};
use crate::core::mask::MaskCompositor;
use crate::core::plot::{PlotField, PlotFieldPreparer, PlotParams};
use crate::core::timecheck::{self, TimeGapSeverity};
use crate::io::registry::{AdapterQuery, AuxLocator, AuxSourceProvider};
use crate::io::store::{RasterStore, ResampleAlg};
use crate::types::{
    BackscatterObservation, MaskStageResult, RasterField, RetrievalMetadata, RetrievalResult,
    WindArray, WindResult,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Default source adapter for online numerical-weather-prediction winds
pub const DEFAULT_WIND_ADAPTER: &str = "ncep_wind_online";
/// Source adapter supplying sea ice concentration
pub const SEAICE_ADAPTER: &str = "metno_hires_seaice";
/// CF standard name of the sea ice concentration band
pub const SEAICE_STANDARD_NAME: &str = "sea_ice_area_fraction";

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalParams {
    /// Resampling used when reprojecting auxiliary fields onto the SAR grid
    pub resample_alg: ResampleAlg,
    /// Display ceiling passed to the mask compositor (m/s)
    pub max_display_speed: Option<f64>,
    pub landmask: bool,
    pub icemask: bool,
    /// Recompute even when the store already carries a windspeed band
    pub force: bool,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            resample_alg: ResampleAlg::Bilinear,
            max_display_speed: Some(35.0),
            landmask: true,
            icemask: true,
            force: false,
        }
    }
}

/// The wind retrieval pipeline: auxiliary field resolution, temporal
/// consistency check, inversion, component decomposition and mask
/// compositing, producing a single immutable [`RetrievalResult`].
///
/// Holds references to the externally supplied SAR raster store, the
/// source-adapter provider and the inversion model; it is not itself a
/// raster image.
pub struct WindRetrievalPipeline<'a> {
    sar: &'a mut dyn RasterStore,
    provider: &'a dyn AuxSourceProvider,
    model: &'a dyn InversionModel,
    params: RetrievalParams,
}

impl<'a> WindRetrievalPipeline<'a> {
    pub fn new(
        sar: &'a mut dyn RasterStore,
        provider: &'a dyn AuxSourceProvider,
        model: &'a dyn InversionModel,
        params: RetrievalParams,
    ) -> Self {
        Self {
            sar,
            provider,
            model,
            params,
        }
    }

    pub fn run(&mut self, wind_source: WindSource) -> WindResult<RetrievalResult> {
        let sar_time = self.sar.time_coverage_start();
        let sar_grid = *self.sar.grid();
        let mut warnings = Vec::new();

        let resolver = AuxWindResolver::new(self.provider, self.params.resample_alg);
        let wind = resolver.resolve(wind_source, sar_time, &sar_grid)?;
        log::info!(
            "Wind direction source: {}",
            wind.provenance.as_deref().unwrap_or("unknown")
        );

        let gap_hours = timecheck::hours_between(sar_time, wind.time);
        if timecheck::enforce(sar_time, wind.time)? == TimeGapSeverity::Warn {
            warnings.push(format!(
                "time difference of {:.2} hours between SAR image and wind direction exceeds 3 hours",
                gap_hours
            ));
        }

        let windspeed = if !self.params.force && self.sar.has_band("windspeed") {
            // Already-processed product (e.g. opened for re-plotting)
            log::info!("Windspeed band present, skipping inversion");
            RasterField::new(self.sar.band("windspeed")?, sar_grid, sar_time)?
        } else {
            let observation = BackscatterObservation::from_store(self.sar)?;
            let engine = WindInversionEngine::new(self.model);
            engine.invert(&observation, &wind.direction)?
        };

        let (u, v) = decompose(&windspeed.data, &wind.direction.data);

        let land = if self.params.landmask {
            self.sar.watermask().map_err(|e| e.to_string())
        } else {
            Err("land masking disabled".to_string())
        };
        let ice = if self.params.icemask {
            self.ice_fraction(&sar_grid).map_err(|e| e.to_string())
        } else {
            Err("ice masking disabled".to_string())
        };

        let compositor = MaskCompositor::new(self.params.max_display_speed);
        let composited = compositor.composite(
            &windspeed.data,
            land.as_ref().map_err(|e| e.clone()),
            ice.as_ref().map_err(|e| e.clone()),
        );
        if self.params.landmask {
            if let MaskStageResult::Unavailable { reason } = &composited.land {
                warnings.push(format!("land mask not applied: {}", reason));
            }
        }
        if self.params.icemask {
            if let MaskStageResult::Unavailable { reason } = &composited.ice {
                warnings.push(format!("ice mask not applied: {}", reason));
            }
        }

        let metadata = RetrievalMetadata {
            wind_direction_source: wind.provenance.clone(),
            computed_at: Utc::now(),
            wind_direction_time: wind.time,
            aux_time_gap_hours: gap_hours,
            warnings,
            land_masking: composited.land.clone(),
            ice_masking: composited.ice.clone(),
        };

        Ok(RetrievalResult {
            direction: wind.direction.clone(),
            u: RasterField::new(u, sar_grid, wind.time)?,
            v: RasterField::new(v, sar_grid, wind.time)?,
            model_speed: wind.model_speed,
            mask: composited.mask,
            display_speed: RasterField::new(composited.display_speed, sar_grid, sar_time)?,
            windspeed,
            metadata,
        })
    }

    /// Prepare the down-sampled, orientation-normalized plotting fields for
    /// a completed retrieval
    pub fn prepare_plot(
        &self,
        result: &RetrievalResult,
        params: PlotParams,
    ) -> WindResult<PlotField> {
        let azimuth = self.sar.azimuth_up()?;
        PlotFieldPreparer::new(params).prepare(
            &result.display_speed.data,
            &result.direction.data,
            self.sar.grid(),
            &azimuth,
            result.model_speed.as_ref().map(|m| &m.data),
        )
    }

    /// Sea ice concentration on the SAR grid, from the sea ice source
    /// adapter for the acquisition date
    fn ice_fraction(&self, sar_grid: &crate::types::GridGeometry) -> WindResult<WindArray> {
        let query = AdapterQuery::new(SEAICE_ADAPTER, self.sar.time_coverage_start());
        let mut ice = self.provider.open(&AuxLocator::Adapter(query))?;
        ice.reproject(sar_grid, self.params.resample_alg)?;
        ice.band(SEAICE_STANDARD_NAME)
    }
}
