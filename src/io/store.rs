use crate::types::{GridGeometry, Polarization, WindArray, WindResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resampling algorithm used when reprojecting a field onto another grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResampleAlg {
    Average,
    NearestNeighbour,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
}

impl Default for ResampleAlg {
    fn default() -> Self {
        ResampleAlg::Bilinear
    }
}

impl ResampleAlg {
    /// Numeric code used by the raster backend (-1 = average, 0 = nearest,
    /// 1 = bilinear, 2 = cubic, 3 = cubic spline, 4 = Lanczos)
    pub fn code(&self) -> i32 {
        match self {
            ResampleAlg::Average => -1,
            ResampleAlg::NearestNeighbour => 0,
            ResampleAlg::Bilinear => 1,
            ResampleAlg::Cubic => 2,
            ResampleAlg::CubicSpline => 3,
            ResampleAlg::Lanczos => 4,
        }
    }
}

/// Metadata attached to a band in a raster store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandMeta {
    pub name: String,
    /// CF standard name, when known
    pub standard_name: Option<String>,
    pub polarization: Option<Polarization>,
    pub units: Option<String>,
    pub time: Option<DateTime<Utc>>,
}

impl BandMeta {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            standard_name: None,
            polarization: None,
            units: None,
            time: None,
        }
    }

    pub fn with_standard_name(name: &str, standard_name: &str) -> Self {
        Self {
            name: name.to_string(),
            standard_name: Some(standard_name.to_string()),
            polarization: None,
            units: None,
            time: None,
        }
    }

    pub fn polarization(mut self, pol: Polarization) -> Self {
        self.polarization = Some(pol);
        self
    }

    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }
}

/// Band lookup query: a CF standard name, optionally narrowed by
/// polarization channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSelector {
    pub standard_name: String,
    pub polarization: Option<Polarization>,
}

impl BandSelector {
    pub fn standard_name(standard_name: &str) -> Self {
        Self {
            standard_name: standard_name.to_string(),
            polarization: None,
        }
    }

    pub fn with_polarization(standard_name: &str, pol: Polarization) -> Self {
        Self {
            standard_name: standard_name.to_string(),
            polarization: Some(pol),
        }
    }
}

/// The raster/band store collaborator.
///
/// Implementations wrap whatever backend actually holds the pixels (GDAL
/// dataset, NetCDF file, in-memory arrays). The retrieval pipeline only
/// ever talks to this trait.
pub trait RasterStore {
    fn grid(&self) -> &GridGeometry;

    /// Acquisition start time of the data in this store
    fn time_coverage_start(&self) -> DateTime<Utc>;

    /// Identifier of the underlying source (filename, adapter id, ...)
    fn source_id(&self) -> &str;

    fn has_band(&self, standard_name: &str) -> bool;

    fn band_sel(&self, selector: &BandSelector) -> WindResult<WindArray>;

    fn band(&self, standard_name: &str) -> WindResult<WindArray> {
        self.band_sel(&BandSelector::standard_name(standard_name))
    }

    fn add_band(&mut self, data: WindArray, meta: BandMeta) -> WindResult<()>;

    /// Reproject the working copy onto the target grid. After a successful
    /// call, `grid()` equals `target` and all bands are resampled.
    fn reproject(&mut self, target: &GridGeometry, alg: ResampleAlg) -> WindResult<()>;

    /// Land/water classification on this store's grid; land cells carry
    /// the value 2
    fn watermask(&self) -> WindResult<WindArray>;

    /// Per-pixel compass bearing of the grid's "up" direction. The default
    /// broadcasts the affine grid azimuth; backends with spatially varying
    /// projections override this.
    fn azimuth_up(&self) -> WindResult<WindArray> {
        let grid = self.grid();
        Ok(WindArray::from_elem(grid.shape, grid.azimuth_up()))
    }

    fn metadata(&self, key: &str) -> Option<String>;

    fn set_metadata(&mut self, key: &str, value: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_alg_codes() {
        assert_eq!(ResampleAlg::Average.code(), -1);
        assert_eq!(ResampleAlg::NearestNeighbour.code(), 0);
        assert_eq!(ResampleAlg::default().code(), 1);
        assert_eq!(ResampleAlg::Lanczos.code(), 4);
    }
}
